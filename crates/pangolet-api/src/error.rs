use thiserror::Error;

/// Top-level error type for the `pangolet-api` crate.
///
/// Covers every failure mode across the three HTTP surfaces:
/// the Pangolin gateway, the public IP echo, and the Seerr discovery API.
/// `pangolet-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// The organization id is required for org-scoped endpoints.
    #[error("Organization id is required to list resources")]
    MissingOrgId,

    /// API key could not be encoded as a header value.
    #[error("Invalid API key: {message}")]
    InvalidApiKey { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Transport-level failure (connection refused, DNS failure, aborted body, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// Non-2xx response, with the raw body for diagnostics.
    #[error("HTTP {status} for {url}: {body}")]
    Http { status: u16, url: String, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures below the HTTP layer (no status received).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }

    /// Returns `true` if this is a "not found" response.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Network(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Truncate a response body for error messages.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
