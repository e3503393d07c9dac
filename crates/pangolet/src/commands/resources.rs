//! Resource command handlers: listing, health, and access rules.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;

use pangolet_core::{AccessRule, Controller, HealthRecord, RefreshOutcome, Resource};

use crate::cli::{GlobalOpts, ResourcesArgs, ResourcesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "SSL")]
    ssl: String,
    #[tabled(rename = "Targets")]
    targets: String,
    #[tabled(rename = "Hint")]
    hint: String,
}

impl From<&Arc<Resource>> for ResourceRow {
    fn from(r: &Arc<Resource>) -> Self {
        Self {
            key: r.key().to_string(),
            name: r.display_name(),
            host: r.probe_host().unwrap_or_else(|| "-".into()),
            ssl: if r.ssl { "yes".into() } else { "no".into() },
            targets: r
                .targets
                .iter()
                .map(pangolet_core::Target::address)
                .collect::<Vec<_>>()
                .join(", "),
            hint: r.health_hint().unwrap_or("-").into(),
        }
    }
}

/// One resource with its latest health observation.
#[derive(Serialize)]
struct HealthEntry {
    key: String,
    name: String,
    url: Option<String>,
    health: Option<HealthRecord>,
}

#[derive(Tabled)]
struct HealthRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Favicon")]
    favicon: String,
    #[tabled(rename = "Checked")]
    checked: String,
    #[tabled(rename = "Info")]
    info: String,
}

fn health_row(entry: &HealthEntry, color: bool) -> HealthRow {
    let Some(ref h) = entry.health else {
        return HealthRow {
            key: entry.key.clone(),
            name: entry.name.clone(),
            status: output::dimmed("unknown", color),
            latency: "-".into(),
            favicon: "-".into(),
            checked: "-".into(),
            info: if entry.url.is_none() {
                "no probe address".into()
            } else {
                String::new()
            },
        };
    };
    HealthRow {
        key: entry.key.clone(),
        name: entry.name.clone(),
        status: output::up_down(h.up, color),
        latency: h.latency_ms.map_or_else(|| "-".into(), |ms| format!("{ms} ms")),
        favicon: if h.favicon.is_some() { "yes".into() } else { "-".into() },
        checked: h.checked_at.format("%H:%M:%S").to_string(),
        info: h.info.clone().unwrap_or_default(),
    }
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Match")]
    match_kind: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl From<&AccessRule> for RuleRow {
    fn from(r: &AccessRule) -> Self {
        fn or_dash<T: ToString>(v: Option<T>) -> String {
            v.map_or_else(|| "-".into(), |v| v.to_string())
        }
        Self {
            id: or_dash(r.rule_id),
            action: or_dash(r.action),
            match_kind: or_dash(r.match_kind),
            value: or_dash(r.value.as_deref()),
            priority: or_dash(r.priority),
            enabled: r.enabled.to_string(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ResourcesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ResourcesCommand::List => {
            let resources = controller.load_resources().await?;
            let out = output::render_list(
                &global.output,
                &resources,
                |r| ResourceRow::from(r),
                |r| r.key().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ResourcesCommand::Health { watch, interval } => {
            let resources = controller.load_resources().await?;
            wait_for_initial_probes(controller, resources.len(), global).await;
            print_health(controller, global);

            if watch {
                watch_health(controller, Duration::from_secs(interval.max(1)), global).await;
            }
            Ok(())
        }

        ResourcesCommand::Rules { resource } => {
            let resource = util::resolve_resource(controller, &resource).await?;
            let rules = controller.access_rules(&resource.key()).await?;
            let out = output::render_list(&global.output, &rules, |r| RuleRow::from(r), |r| {
                r.value.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

// ── Health helpers ──────────────────────────────────────────────────

fn spinner(global: &GlobalOpts, message: String) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Wait for the load-triggered probe batch, reporting progress from the
/// health stream.
async fn wait_for_initial_probes(controller: &Controller, total: usize, global: &GlobalOpts) {
    let pb = spinner(global, format!("Probing {total} resources"));
    let mut stream = controller.subscribe_health();
    let progress = {
        let pb = pb.clone();
        tokio::spawn(async move {
            while let Some(snapshot) = stream.changed().await {
                pb.set_message(format!("Probing resources ({}/{total} reported)", snapshot.len()));
            }
        })
    };

    controller.wait_idle().await;
    progress.abort();
    pb.finish_and_clear();
}

fn health_entries(controller: &Controller) -> Vec<HealthEntry> {
    let health = controller.store().health_snapshot();
    controller
        .resources()
        .iter()
        .map(|r| {
            let key = r.key();
            HealthEntry {
                name: r.display_name(),
                url: r.probe_url(),
                health: health.get(&key).map(|h| h.as_ref().clone()),
                key: key.to_string(),
            }
        })
        .collect()
}

fn print_health(controller: &Controller, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let entries = health_entries(controller);
    let out = output::render_list(
        &global.output,
        &entries,
        |e| health_row(e, color),
        |e| {
            let state = match e.health {
                Some(ref h) if h.up => "up",
                Some(_) => "down",
                None => "unknown",
            };
            format!("{}\t{state}", e.key)
        },
    );
    output::print_output(&out, global.quiet);
}

/// Re-run the bulk refresh every `interval` until Ctrl-C.
async fn watch_health(controller: &Controller, interval: Duration, global: &GlobalOpts) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = tokio::time::sleep(interval) => {}
        }

        let pb = spinner(global, "Refreshing".into());
        let outcome = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            outcome = controller.refresh_health() => Some(outcome),
        };
        pb.finish_and_clear();

        match outcome {
            Some(RefreshOutcome::Completed { probed, recorded }) => {
                tracing::info!(probed, recorded, "refresh complete");
                print_health(controller, global);
            }
            Some(RefreshOutcome::AlreadyRunning) => {
                tracing::debug!("refresh already running, skipping tick");
            }
            Some(RefreshOutcome::Cancelled) | None => break,
        }
    }
}
