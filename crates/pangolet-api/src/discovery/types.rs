// Wire and normalized types for the Seerr discovery API.
//
// Movie and TV results arrive in two shapes (`title`/`releaseDate` versus
// `name`/`firstAirDate`). `RawDiscoverResult` accepts both and converts into
// the single `MediaResult` shape consumers see.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ── Enumerations ─────────────────────────────────────────────────────

/// Movie or TV.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

/// The discover list to fetch (`/api/v1/discover/{endpoint}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiscoverEndpoint {
    Movies,
    Tv,
    Upcoming,
    Popular,
    Trending,
}

/// Availability of a title on the media server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(try_from = "u8", into = "u8")]
pub enum MediaStatus {
    Unknown,
    Pending,
    Processing,
    PartiallyAvailable,
    Available,
    Deleted,
}

impl TryFrom<u8> for MediaStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Self::Unknown,
            2 => Self::Pending,
            3 => Self::Processing,
            4 => Self::PartiallyAvailable,
            5 => Self::Available,
            6 => Self::Deleted,
            other => return Err(format!("unknown media status {other}")),
        })
    }
}

impl From<MediaStatus> for u8 {
    fn from(status: MediaStatus) -> Self {
        match status {
            MediaStatus::Unknown => 1,
            MediaStatus::Pending => 2,
            MediaStatus::Processing => 3,
            MediaStatus::PartiallyAvailable => 4,
            MediaStatus::Available => 5,
            MediaStatus::Deleted => 6,
        }
    }
}

// ── Query parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverParams {
    pub page: Option<u32>,
    pub language: Option<String>,
    pub genre: Option<String>,
    pub watch_providers: Option<String>,
}

impl DiscoverParams {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Query pairs in the order the service documents them. Absent values
    /// are omitted.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(page) = self.page {
            q.push(("page", page.to_string()));
        }
        if let Some(ref language) = self.language {
            q.push(("language", language.clone()));
        }
        if let Some(ref genre) = self.genre {
            q.push(("genre", genre.clone()));
        }
        if let Some(ref providers) = self.watch_providers {
            q.push(("watchProviders", providers.clone()));
        }
        q
    }
}

// ── Raw wire shapes ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDiscoverResponse {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub results: Vec<RawDiscoverResult>,
}

/// A discover result as sent by the service, movie and TV fields side by side.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDiscoverResult {
    pub id: i64,
    pub media_type: Option<String>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_count: Option<u64>,
    pub vote_average: Option<f64>,
    pub genre_ids: Vec<i64>,
    pub overview: Option<String>,
    pub original_language: Option<String>,
    // movie shape
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub adult: Option<bool>,
    pub video: Option<bool>,
    // tv shape
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub first_air_date: Option<String>,
    pub origin_country: Vec<String>,
    pub media_info: Option<MediaInfo>,
}

// ── Normalized shapes ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestUser {
    pub id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaRequest {
    pub id: i64,
    pub status: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub requested_by: Option<RequestUser>,
    pub is4k: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfo {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub tvdb_id: Option<i64>,
    pub status: Option<MediaStatus>,
    pub requests: Vec<MediaRequest>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A discover result with movie and TV fields folded together:
/// `title`, `original_title` and `release_date` are filled from
/// `name`, `original_name` and `first_air_date` for TV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResult {
    pub id: i64,
    pub kind: MediaKind,
    pub media_type: Option<String>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_count: Option<u64>,
    pub vote_average: Option<f64>,
    pub genre_ids: Vec<i64>,
    pub overview: Option<String>,
    pub original_language: Option<String>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub origin_country: Vec<String>,
    pub adult: Option<bool>,
    pub video: Option<bool>,
    pub media_info: Option<MediaInfo>,
}

impl From<RawDiscoverResult> for MediaResult {
    fn from(raw: RawDiscoverResult) -> Self {
        let kind = if raw.name.is_some() || raw.first_air_date.is_some() {
            MediaKind::Tv
        } else {
            MediaKind::Movie
        };
        Self {
            id: raw.id,
            kind,
            media_type: raw.media_type,
            popularity: raw.popularity,
            poster_path: raw.poster_path,
            backdrop_path: raw.backdrop_path,
            vote_count: raw.vote_count,
            vote_average: raw.vote_average,
            genre_ids: raw.genre_ids,
            overview: raw.overview,
            original_language: raw.original_language,
            title: non_empty(raw.title).or(raw.name),
            original_title: non_empty(raw.original_title).or(raw.original_name),
            release_date: non_empty(raw.release_date).or(raw.first_air_date),
            origin_country: raw.origin_country,
            adult: raw.adult,
            video: raw.video,
            media_info: raw.media_info,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Which TMDB image rendition to request through the service's image proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Poster,
    Backdrop,
}

impl MediaResult {
    /// Title for display, falling back to the original title.
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.original_title.as_deref().filter(|t| !t.is_empty()))
            .unwrap_or("Untitled")
    }

    /// Release year, if the release date starts with one.
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
    }

    pub fn availability(&self) -> Option<MediaStatus> {
        self.media_info.as_ref().and_then(|m| m.status)
    }

    pub fn poster_url(&self, base: &str) -> Option<String> {
        resolve_image(base, self.poster_path.as_deref(), ImageKind::Poster)
    }

    pub fn backdrop_url(&self, base: &str) -> Option<String> {
        resolve_image(base, self.backdrop_path.as_deref(), ImageKind::Backdrop)
    }
}

/// Resolve an image path against the service's TMDB image proxy.
///
/// Absolute URLs pass through; paths already pointing at `imageproxy` are
/// joined to the base as-is.
pub fn resolve_image(base: &str, path: Option<&str>, kind: ImageKind) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(path.to_owned());
    }
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    let clean = path.trim_start_matches('/');
    if clean.contains("imageproxy") {
        return Some(format!("{base}/{clean}"));
    }
    let prefix = match kind {
        ImageKind::Backdrop => "/imageproxy/tmdb/t/p/w1920_and_h800_multi_faces/",
        ImageKind::Poster => "/imageproxy/tmdb/t/p/w300_and_h450_face/",
    };
    Some(format!("{base}{prefix}{clean}"))
}

/// A normalized discover page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub results: Vec<MediaResult>,
}

impl DiscoverResponse {
    /// The page substituted for a list that failed to load.
    pub fn empty() -> Self {
        Self {
            page: 1,
            total_pages: 0,
            total_results: 0,
            results: Vec::new(),
        }
    }
}

impl From<RawDiscoverResponse> for DiscoverResponse {
    fn from(raw: RawDiscoverResponse) -> Self {
        Self {
            page: raw.page,
            total_pages: raw.total_pages,
            total_results: raw.total_results,
            results: raw.results.into_iter().map(MediaResult::from).collect(),
        }
    }
}

/// A genre from the genre slider endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub backdrops: Vec<String>,
}
