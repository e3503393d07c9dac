//! Flag overrides on top of `pangolet-config` profiles.
//!
//! Core never sees these types -- it receives a pre-built `GatewayConfig`.

use pangolet_config::{Config, Profile};
use pangolet_core::GatewayConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Layer flag values over a profile (flag > env > profile).
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }
    if let Some(ref org) = global.org {
        profile.org_id.clone_from(org);
    }
    if global.api_key.is_some() {
        profile.api_key.clone_from(&global.api_key);
        profile.api_key_env = None;
    }
    if global.discovery_url.is_some() {
        profile.discovery_url.clone_from(&global.discovery_url);
    }
    if global.discovery_api_key.is_some() {
        profile.discovery_api_key.clone_from(&global.discovery_api_key);
    }
    if global.ip_url.is_some() {
        profile.public_ip_url.clone_from(&global.ip_url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
}

/// Build a `GatewayConfig` from the config file, profile, and CLI overrides.
pub fn build_gateway_config(global: &GlobalOpts) -> Result<GatewayConfig, CliError> {
    let cfg = pangolet_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        // No profile -- build from flags / env vars alone
        None => {
            if global.base_url.is_none() {
                return Err(CliError::NoConfig {
                    path: pangolet_config::config_path().display().to_string(),
                });
            }
            if global.api_key.is_none() {
                return Err(CliError::NoCredentials {
                    profile: profile_name,
                });
            }
            Profile::default()
        }
    };

    apply_overrides(&mut profile, global);
    Ok(pangolet_config::profile_to_gateway_config(
        &profile,
        &profile_name,
        &cfg.defaults,
    )?)
}
