// ── Resource identity and probe addressing ──
//
// `ResourceKey` is the store key for every per-resource record.
// `Resource` knows how to turn itself into a probe URL.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── ResourceKey ─────────────────────────────────────────────────────

/// Store key for a resource: the numeric id rendered as a string, else
/// the nice id, else the empty string.
///
/// Distinct resources lacking both ids share the `""` key and overwrite
/// each other's records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Target ──────────────────────────────────────────────────────────

/// An upstream backend of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub target_id: Option<i64>,
    pub ip: String,
    pub port: Option<u16>,
    pub enabled: bool,
    /// Gateway-reported health, e.g. `"healthy"` or `"unhealthy"`.
    pub health_status: Option<String>,
}

impl Target {
    /// `ip[:port]`, with the port omitted when absent or zero.
    pub fn address(&self) -> String {
        match self.port {
            Some(port) if port > 0 => format!("{}:{port}", self.ip),
            _ => self.ip.clone(),
        }
    }
}

// ── Resource ────────────────────────────────────────────────────────

/// A proxied endpoint exposed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Resource {
    pub resource_id: Option<i64>,
    pub nice_id: Option<String>,
    pub name: String,
    pub full_domain: Option<String>,
    pub ssl: bool,
    pub protocol: Option<String>,
    pub http: bool,
    pub sso: bool,
    pub enabled: bool,
    /// Gateway-side whitelist flag (not the caller's IP status).
    pub whitelist: bool,
    pub proxy_port: Option<u16>,
    pub targets: Vec<Target>,
}

impl Resource {
    pub fn key(&self) -> ResourceKey {
        match (self.resource_id, self.nice_id.as_deref()) {
            (Some(id), _) => ResourceKey(id.to_string()),
            (None, Some(nice)) => ResourceKey(nice.to_owned()),
            (None, None) => ResourceKey::default(),
        }
    }

    /// Name for display: the name, else the nice id, else the id.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        if let Some(nice) = self.nice_id.as_deref().filter(|n| !n.is_empty()) {
            return nice.to_owned();
        }
        self.resource_id
            .map_or_else(|| "(unnamed)".to_owned(), |id| id.to_string())
    }

    /// Gateway health hint from the first target, if it reports one.
    pub fn health_hint(&self) -> Option<&str> {
        self.targets.first()?.health_status.as_deref()
    }

    /// `https` when the resource terminates TLS or declares protocol
    /// `http`; `http` otherwise.
    pub fn probe_scheme(&self) -> &'static str {
        if self.ssl || self.protocol.as_deref() == Some("http") {
            "https"
        } else {
            "http"
        }
    }

    /// Host to probe: the full domain, else the first target's address.
    /// Any `http://`/`https://` prefix and one trailing slash are removed.
    pub fn probe_host(&self) -> Option<String> {
        let raw = match self.full_domain.as_deref().filter(|d| !d.is_empty()) {
            Some(domain) => domain.to_owned(),
            None => {
                let target = self.targets.first()?;
                if target.ip.is_empty() {
                    return None;
                }
                target.address()
            }
        };
        let host = normalize_host(&raw);
        (!host.is_empty()).then(|| host.to_owned())
    }

    /// `scheme://host/`, or `None` when there is nothing to probe.
    pub fn probe_url(&self) -> Option<String> {
        let host = self.probe_host()?;
        Some(format!("{}://{host}/", self.probe_scheme()))
    }

    /// Case-insensitive match on key, nice id, or name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.key().as_str() == query
            || self.nice_id.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(query))
            || self.name.eq_ignore_ascii_case(query)
    }
}

fn normalize_host(raw: &str) -> &str {
    let host = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    host.strip_suffix('/').unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> Resource {
        Resource {
            resource_id: None,
            nice_id: None,
            name: String::new(),
            full_domain: None,
            ssl: false,
            protocol: None,
            http: true,
            sso: false,
            enabled: true,
            whitelist: false,
            proxy_port: None,
            targets: Vec::new(),
        }
    }

    fn target(ip: &str, port: Option<u16>) -> Target {
        Target {
            target_id: None,
            ip: ip.into(),
            port,
            enabled: true,
            health_status: None,
        }
    }

    #[test]
    fn key_prefers_numeric_id_then_nice_id() {
        let mut r = resource();
        assert_eq!(r.key().as_str(), "");
        r.nice_id = Some("grafana".into());
        assert_eq!(r.key().as_str(), "grafana");
        r.resource_id = Some(7);
        assert_eq!(r.key().as_str(), "7");
    }

    #[test]
    fn scheme_follows_ssl_or_http_protocol() {
        let mut r = resource();
        assert_eq!(r.probe_scheme(), "http");
        r.protocol = Some("tcp".into());
        assert_eq!(r.probe_scheme(), "http");
        r.protocol = Some("http".into());
        assert_eq!(r.probe_scheme(), "https");
        r.protocol = None;
        r.ssl = true;
        assert_eq!(r.probe_scheme(), "https");
    }

    #[test]
    fn host_prefers_full_domain_and_strips_scheme() {
        let mut r = resource();
        r.full_domain = Some("https://svc.example.com/".into());
        r.targets.push(target("10.0.0.5", Some(8080)));
        assert_eq!(r.probe_host().as_deref(), Some("svc.example.com"));
    }

    #[test]
    fn host_falls_back_to_first_target() {
        let mut r = resource();
        r.full_domain = Some(String::new());
        r.targets.push(target("10.0.0.5", Some(8080)));
        r.targets.push(target("10.0.0.6", Some(9090)));
        assert_eq!(r.probe_host().as_deref(), Some("10.0.0.5:8080"));
        assert_eq!(r.probe_url().as_deref(), Some("http://10.0.0.5:8080/"));
    }

    #[test]
    fn zero_or_missing_port_is_omitted() {
        assert_eq!(target("10.0.0.5", Some(0)).address(), "10.0.0.5");
        assert_eq!(target("10.0.0.5", None).address(), "10.0.0.5");
    }

    #[test]
    fn nothing_to_probe_without_domain_or_targets() {
        assert!(resource().probe_url().is_none());
        let mut r = resource();
        r.targets.push(target("", Some(80)));
        assert!(r.probe_host().is_none());
    }

    #[test]
    fn matches_key_nice_id_and_name() {
        let mut r = resource();
        r.resource_id = Some(12);
        r.nice_id = Some("grafana".into());
        r.name = "Grafana Dashboards".into();
        assert!(r.matches("12"));
        assert!(r.matches("GRAFANA"));
        assert!(r.matches("grafana dashboards"));
        assert!(!r.matches("13"));
        assert!(!r.matches("  "));
    }
}
