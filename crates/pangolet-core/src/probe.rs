// ── Health prober ──
//
// Layered liveness check for a single resource: gateway hint, primary
// `GET /` under its own deadline, then an optional favicon lookup under a
// second, independent deadline. Nothing here returns an error; every
// failure becomes an `up: false` record or is logged and dropped.

use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::debug;
use url::Url;

use pangolet_api::TransportConfig;

use crate::config::ProbeConfig;
use crate::error::CoreError;
use crate::model::{HealthRecord, Resource};
use crate::store::StatusStore;

/// Probes resources over plain, unauthenticated HTTP(S).
#[derive(Clone)]
pub struct HealthProber {
    http: reqwest::Client,
    config: ProbeConfig,
}

impl HealthProber {
    /// Build a prober sharing TLS settings with the gateway transport.
    /// Deadlines come from `config`, not from the transport timeout.
    pub fn new(transport: &TransportConfig, config: ProbeConfig) -> Result<Self, CoreError> {
        let ceiling = config.primary_timeout.max(config.favicon_timeout) + Duration::from_secs(1);
        let http = transport.clone().with_timeout(ceiling).build_client()?;
        Ok(Self::from_reqwest(http, config))
    }

    pub fn from_reqwest(http: reqwest::Client, config: ProbeConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe `resource` and return the record to store, or `None` when it
    /// has neither a domain nor a target address.
    pub async fn probe(&self, resource: &Resource) -> Option<HealthRecord> {
        let raw = resource.probe_url()?;
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                debug!(url = %raw, error = %e, "unprobeable resource URL");
                return Some(HealthRecord::unreachable(format!("invalid URL {raw}: {e}")));
            }
        };

        let start = Instant::now();
        let sent = timeout(self.config.primary_timeout, self.http.get(url.clone()).send()).await;
        let response = match sent {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                debug!(url = %url, error = %e, "health probe failed");
                return Some(HealthRecord::unreachable(describe(&e)));
            }
            Err(_) => {
                let ms = duration_ms(self.config.primary_timeout);
                debug!(url = %url, timeout_ms = ms, "health probe timed out");
                return Some(HealthRecord::unreachable(format!("timed out after {ms}ms")));
            }
        };
        let latency_ms = duration_ms(start.elapsed());
        let status = response.status();
        drop(response);

        let up = status.is_success() || status.is_redirection();
        let favicon = self.probe_favicon(&url).await;
        Some(HealthRecord::responded(up, latency_ms, favicon))
    }

    /// Write the gateway hint (if any), probe, and write the result.
    ///
    /// The hint is visible until the probe completes; the probe result
    /// then replaces it.
    pub async fn probe_into(&self, resource: &Resource, store: &StatusStore) -> Option<HealthRecord> {
        let key = resource.key();
        if let Some(hint) = resource.health_hint() {
            store.set_health(key.clone(), HealthRecord::from_hint(hint));
        }
        let record = self.probe(resource).await?;
        store.set_health(key, record.clone());
        Some(record)
    }

    async fn probe_favicon(&self, base: &Url) -> Option<Url> {
        let favicon = base.join("favicon.ico").ok()?;
        match timeout(self.config.favicon_timeout, self.http.get(favicon.clone()).send()).await {
            Ok(Ok(resp)) if resp.status().is_success() => Some(favicon),
            Ok(Ok(resp)) => {
                debug!(url = %favicon, status = resp.status().as_u16(), "no favicon");
                None
            }
            Ok(Err(e)) => {
                debug!(url = %favicon, error = %e, "favicon fetch failed");
                None
            }
            Err(_) => {
                debug!(url = %favicon, "favicon fetch timed out");
                None
            }
        }
    }
}

/// Error text with its source chain, e.g. `error sending request: connection refused`.
fn describe(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
