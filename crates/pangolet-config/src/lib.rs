//! Configuration for pangolet.
//!
//! TOML profiles, credential resolution (env + plaintext + keyring),
//! and translation to `pangolet_core::GatewayConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pangolet_core::{DiscoveryConfig, GatewayConfig, ProbeConfig, TlsVerification};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "pangolet";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The named profile, or the default one when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Gateway and public IP request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_favicon_timeout_ms")]
    pub favicon_timeout_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            probe_timeout_ms: default_probe_timeout_ms(),
            favicon_timeout_ms: default_favicon_timeout_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_probe_timeout_ms() -> u64 {
    3000
}
fn default_favicon_timeout_ms() -> u64 {
    2000
}

/// A named gateway profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway API base URL (e.g. "https://api.example.com/v1").
    pub base_url: String,

    /// Organization id resources are listed under.
    pub org_id: String,

    /// Client display name.
    pub name: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Media discovery service URL.
    pub discovery_url: Option<String>,

    /// Discovery API key (plaintext; prefer keyring).
    pub discovery_api_key: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Override request timeout, seconds.
    pub timeout: Option<u64>,

    /// Override the public IP echo endpoint.
    pub public_ip_url: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "pangolet", "pangolet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("pangolet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// `PANGOLET_`-prefixed environment variables override file values;
/// `__` separates nested keys (`PANGOLET_DEFAULTS__TIMEOUT=30`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PANGOLET_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str, secret: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{secret}"),
    )?)
}

/// Store the gateway API key for a profile in the system keyring.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "api-key")?.set_password(key)?;
    Ok(())
}

pub fn store_discovery_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "discovery-api-key")?.set_password(key)?;
    Ok(())
}

fn keyring_secret(profile_name: &str, secret: &str) -> Option<SecretString> {
    keyring_entry(profile_name, secret)
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the gateway API key: `api_key_env`, then the plaintext
/// `api_key`, then the system keyring.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    if let Some(ref key) = profile.api_key {
        if !key.is_empty() {
            return Ok(SecretString::from(key.clone()));
        }
    }

    keyring_secret(profile_name, "api-key").ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the discovery API key, if one is configured anywhere.
pub fn resolve_discovery_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    profile
        .discovery_api_key
        .as_ref()
        .filter(|k| !k.is_empty())
        .map(|k| SecretString::from(k.clone()))
        .or_else(|| keyring_secret(profile_name, "discovery-api-key"))
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `GatewayConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    if profile.base_url.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: "must not be empty".into(),
        });
    }
    let base_url = parse_url("base_url", profile.base_url.trim())?;
    if profile.org_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "org_id".into(),
            reason: "must not be empty".into(),
        });
    }
    let api_key = resolve_api_key(profile, profile_name)?;

    let discovery = match profile.discovery_url.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(DiscoveryConfig {
            url: parse_url("discovery_url", raw)?,
            api_key: resolve_discovery_api_key(profile, profile_name),
        }),
        _ => None,
    };

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let public_ip_url = profile
        .public_ip_url
        .as_deref()
        .map(|raw| parse_url("public_ip_url", raw))
        .transpose()?;

    let mut cfg = GatewayConfig::new(base_url, api_key, profile.org_id.trim());
    cfg.name.clone_from(&profile.name);
    cfg.discovery = discovery;
    cfg.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    cfg.tls = tls;
    cfg.probe = ProbeConfig {
        primary_timeout: Duration::from_millis(defaults.probe_timeout_ms),
        favicon_timeout: Duration::from_millis(defaults.favicon_timeout_ms),
        ..ProbeConfig::default()
    };
    cfg.public_ip_url = public_ip_url;
    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            base_url: "https://api.example.com/v1".into(),
            org_id: "acme".into(),
            api_key: Some("plain-key".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.probe_timeout_ms, 3000);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), profile());
        cfg.default_profile = Some("home".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        let (name, p) = loaded.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(p.org_id, "acme");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\ntimeout = 25\n\n[profiles.lab]\nbase_url = \"https://gw.lab\"\norg_id = \"lab\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.timeout, 25);
        assert_eq!(cfg.defaults.output, "table");
        assert!(cfg.profile(Some("lab")).is_ok());
        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn plaintext_key_resolves_before_keyring() {
        let key = resolve_api_key(&profile(), "home").unwrap();
        assert_eq!(key.expose_secret(), "plain-key");
    }

    #[test]
    fn gateway_config_from_profile() {
        let mut p = profile();
        p.discovery_url = Some("https://seerr.example.com".into());
        p.discovery_api_key = Some("seerr".into());
        p.insecure = Some(true);
        p.timeout = Some(4);

        let cfg = profile_to_gateway_config(&p, "home", &Defaults::default()).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://api.example.com/v1");
        assert_eq!(cfg.org_id, "acme");
        assert_eq!(cfg.timeout, Duration::from_secs(4));
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.probe.primary_timeout, Duration::from_millis(3000));
        let discovery = cfg.discovery.unwrap();
        assert_eq!(discovery.url.as_str(), "https://seerr.example.com/");
        assert_eq!(discovery.api_key.unwrap().expose_secret(), "seerr");
    }

    #[test]
    fn invalid_profiles_are_rejected() {
        let mut p = profile();
        p.org_id = "  ".into();
        assert!(matches!(
            profile_to_gateway_config(&p, "home", &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "org_id"
        ));

        let mut p = profile();
        p.base_url = "not a url".into();
        assert!(matches!(
            profile_to_gateway_config(&p, "home", &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "base_url"
        ));
    }
}
