// ── Health record ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Result of one health observation for a resource.
///
/// Replaced wholesale on every write; never merged with a previous record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub up: bool,
    /// Wall time to response headers of the primary probe.
    pub latency_ms: Option<u64>,
    /// Gateway hint text or failure diagnostic.
    pub info: Option<String>,
    /// Present only when `/favicon.ico` answered with a success status.
    pub favicon: Option<Url>,
    pub checked_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Record derived from a target's gateway-reported `healthStatus`.
    pub fn from_hint(status: &str) -> Self {
        Self {
            up: status == "healthy",
            latency_ms: None,
            info: Some(status.to_owned()),
            favicon: None,
            checked_at: Utc::now(),
        }
    }

    /// Record for a primary probe that received a response.
    pub fn responded(up: bool, latency_ms: u64, favicon: Option<Url>) -> Self {
        Self {
            up,
            latency_ms: Some(latency_ms),
            info: None,
            favicon,
            checked_at: Utc::now(),
        }
    }

    /// Record for a primary probe that got no response.
    pub fn unreachable(info: impl Into<String>) -> Self {
        Self {
            up: false,
            latency_ms: None,
            info: Some(info.into()),
            favicon: None,
            checked_at: Utc::now(),
        }
    }
}
