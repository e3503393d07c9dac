//! Discovery command handlers (Seerr discover lists and genres).

use serde::Serialize;
use tabled::Tabled;

use pangolet_core::{
    Controller, DiscoverEndpoint, DiscoverList, DiscoverParams, DiscoveryService, Genre,
    MediaKind, MediaResult,
};

use crate::cli::{
    DiscoverArgs, DiscoverListArg, GenresArgs, GlobalOpts, MediaKindArg, OutputFormat,
};
use crate::error::CliError;
use crate::output;

impl From<DiscoverListArg> for DiscoverEndpoint {
    fn from(arg: DiscoverListArg) -> Self {
        match arg {
            DiscoverListArg::Movies => Self::Movies,
            DiscoverListArg::Tv => Self::Tv,
            DiscoverListArg::Upcoming => Self::Upcoming,
            DiscoverListArg::Popular => Self::Popular,
            DiscoverListArg::Trending => Self::Trending,
        }
    }
}

impl From<MediaKindArg> for MediaKind {
    fn from(arg: MediaKindArg) -> Self {
        match arg {
            MediaKindArg::Movie => Self::Movie,
            MediaKindArg::Tv => Self::Tv,
        }
    }
}

// ── Table rows ──────────────────────────────────────────────────────

/// A result with its genre ids resolved to names.
#[derive(Serialize)]
struct TitleEntry {
    #[serde(flatten)]
    result: MediaResult,
    genres: Vec<String>,
}

#[derive(Tabled)]
struct TitleRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Genres")]
    genres: String,
}

impl From<&TitleEntry> for TitleRow {
    fn from(e: &TitleEntry) -> Self {
        let r = &e.result;
        Self {
            id: r.id,
            kind: r.kind.to_string(),
            title: r.display_name().to_owned(),
            year: r.year().unwrap_or("-").to_owned(),
            rating: r
                .vote_average
                .map_or_else(|| "-".into(), |v| format!("{v:.1}")),
            status: r
                .availability()
                .map_or_else(|| "-".into(), |s| s.to_string()),
            genres: e.genres.join(", "),
        }
    }
}

#[derive(Tabled)]
struct GenreRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&Genre> for GenreRow {
    fn from(g: &Genre) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn with_genres(service: &DiscoveryService, results: Vec<MediaResult>) -> Vec<TitleEntry> {
    let mut entries = Vec::with_capacity(results.len());
    for result in results {
        let genres = service.genre_names_for(&result).await;
        entries.push(TitleEntry { result, genres });
    }
    entries
}

fn render_titles(format: &OutputFormat, entries: &[TitleEntry]) -> String {
    output::render_list(format, entries, |e| TitleRow::from(e), |e| e.result.id.to_string())
}

pub async fn handle(
    controller: &Controller,
    args: DiscoverArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let service = controller.discovery()?;

    if let Some(list) = args.list {
        let params = DiscoverParams {
            page: Some(args.page.max(1)),
            language: args.language,
            genre: args.genre,
            watch_providers: args.watch_providers,
        };
        let page = service.discover(list.into(), &params).await?;
        let entries = with_genres(service, page.results).await;
        output::print_output(&render_titles(&global.output, &entries), global.quiet);
        return Ok(());
    }

    // Every list; a list that fails to load comes back empty.
    let lists: Vec<DiscoverList> = DiscoverList::all()
        .into_iter()
        .map(|mut l| {
            l.page = args.page.max(1);
            l
        })
        .collect();
    let loaded = service.load_lists(&lists).await;

    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let mut sections = Vec::with_capacity(loaded.len());
            for (id, page) in loaded {
                let entries = with_genres(service, page.results).await;
                let body = if entries.is_empty() {
                    "(no results)".to_owned()
                } else {
                    render_titles(&global.output, &entries)
                };
                sections.push(format!("== {id} ==\n{body}"));
            }
            output::print_output(&sections.join("\n\n"), global.quiet);
        }
        _ => {
            let out =
                output::render_single(&global.output, &loaded, |_| String::new(), |_| String::new());
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}

pub async fn handle_genres(
    controller: &Controller,
    args: &GenresArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let genres = controller.discovery()?.genres(args.kind.into()).await?;
    let out = output::render_list(&global.output, &genres, |g| GenreRow::from(g), |g| g.name.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
