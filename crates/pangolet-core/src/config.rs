// ── Runtime gateway configuration ──
//
// These types describe how to reach a gateway and an optional discovery
// service. They carry credentials and tuning but never touch disk; the
// CLI builds a `GatewayConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed gateways).
    DangerAcceptInvalid,
}

/// Deadlines for the health prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Deadline for `GET scheme://host/`.
    pub primary_timeout: Duration,
    /// Deadline for `GET scheme://host/favicon.ico`.
    pub favicon_timeout: Duration,
    /// Pause between a resource-list load and the initial probe batch.
    pub settle_delay: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            primary_timeout: Duration::from_millis(3000),
            favicon_timeout: Duration::from_millis(2000),
            settle_delay: Duration::from_millis(120),
        }
    }
}

/// Linked media-discovery service.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub url: Url,
    pub api_key: Option<SecretString>,
}

/// Configuration for a single gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway API base URL (e.g. `https://api.example.com/v1`).
    pub base_url: Url,
    pub api_key: SecretString,
    pub org_id: String,
    /// Display name for this client; informational only.
    pub name: Option<String>,
    pub discovery: Option<DiscoveryConfig>,
    /// Whole-request timeout for gateway and public IP calls.
    pub timeout: Duration,
    pub tls: TlsVerification,
    pub probe: ProbeConfig,
    /// Override for the public IP echo endpoint.
    pub public_ip_url: Option<Url>,
}

impl GatewayConfig {
    /// Minimal config with default timeouts and TLS.
    pub fn new(base_url: Url, api_key: SecretString, org_id: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key,
            org_id: org_id.into(),
            name: None,
            discovery: None,
            timeout: Duration::from_secs(10),
            tls: TlsVerification::default(),
            probe: ProbeConfig::default(),
            public_ip_url: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn probe_defaults() {
        let probe = ProbeConfig::default();
        assert_eq!(probe.primary_timeout, Duration::from_millis(3000));
        assert_eq!(probe.favicon_timeout, Duration::from_millis(2000));
        assert_eq!(probe.settle_delay, Duration::from_millis(120));
    }

    #[test]
    fn gateway_defaults_to_ten_second_timeout() {
        let cfg = GatewayConfig::new(
            "https://gw.example.com".parse().unwrap(),
            SecretString::from("k".to_owned()),
            "acme",
        );
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }
}
