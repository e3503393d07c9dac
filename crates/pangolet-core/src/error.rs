// ── Core error types ──
//
// User-facing errors from pangolet-core. The `From<pangolet_api::Error>`
// impl folds transport-layer failures into the gateway taxonomy; timeouts
// are reported exactly like connection failures.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required credential or endpoint is absent.
    #[error("Not configured: {message}")]
    NotConfigured { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("HTTP {status} for {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Unexpected response: {message}")]
    Parse { message: String },

    // ── Whitelist ────────────────────────────────────────────────────
    #[error("Failed to fetch access rules: {message}")]
    RuleFetch { message: String },

    #[error("Failed to add access rule: {message}")]
    AddRule { message: String },

    #[error("A whitelist operation is already running for resource '{key}'")]
    WhitelistInProgress { key: String },

    #[error("Resource '{name}' has no resource id; access rules cannot be addressed")]
    MissingResourceId { name: String },

    #[error("Resource not found: {query}")]
    ResourceNotFound { query: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` when no HTTP status was received.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pangolet_api::Error> for CoreError {
    fn from(err: pangolet_api::Error) -> Self {
        match err {
            pangolet_api::Error::MissingOrgId => CoreError::NotConfigured {
                message: "organization id is not set".into(),
            },
            pangolet_api::Error::InvalidApiKey { message } => CoreError::Config { message },
            pangolet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            pangolet_api::Error::Network(e) => CoreError::Network {
                message: if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                },
            },
            pangolet_api::Error::Timeout { timeout_ms } => CoreError::Network {
                message: format!("request timed out after {timeout_ms}ms"),
            },
            pangolet_api::Error::Tls(msg) => CoreError::Network {
                message: format!("TLS error: {msg}"),
            },
            pangolet_api::Error::Http { status, url, body } => CoreError::Http {
                status,
                url,
                message: body,
            },
            pangolet_api::Error::Deserialization { message, body: _ } => {
                CoreError::Parse { message }
            }
        }
    }
}

/// Map a public IP lookup failure. The echo service is not part of the
/// gateway, so any answer other than a usable address is a network
/// failure; only local configuration problems keep their own variant.
pub(crate) fn public_ip_error(err: pangolet_api::Error) -> CoreError {
    match err {
        pangolet_api::Error::Http { status, url, body } => CoreError::Network {
            message: format!("public IP lookup failed: HTTP {status} from {url}: {body}"),
        },
        pangolet_api::Error::Deserialization { message, body: _ } => CoreError::Network {
            message: format!("public IP lookup returned no usable address: {message}"),
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_keeps_status_and_url() {
        let err: CoreError = pangolet_api::Error::Http {
            status: 403,
            url: "https://gw.example.com/resource/7/rules".into(),
            body: "forbidden".into(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("/resource/7/rules"));
        assert!(!err.is_network());
    }

    #[test]
    fn timeout_is_a_network_error() {
        let err: CoreError = pangolet_api::Error::Timeout { timeout_ms: 10_000 }.into();
        assert!(err.is_network());
    }

    #[test]
    fn missing_org_is_not_configured() {
        let err: CoreError = pangolet_api::Error::MissingOrgId.into();
        assert!(matches!(err, CoreError::NotConfigured { .. }));
    }

    #[test]
    fn public_ip_http_failure_is_network_with_status() {
        let err = public_ip_error(pangolet_api::Error::Http {
            status: 503,
            url: "https://api.ipify.org/?format=json".into(),
            body: String::new(),
        });
        assert!(err.is_network(), "got {err:?}");
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn public_ip_bad_echo_is_network() {
        let err = public_ip_error(pangolet_api::Error::Deserialization {
            message: "missing field `ip`".into(),
            body: "{}".into(),
        });
        assert!(err.is_network(), "got {err:?}");
    }
}
