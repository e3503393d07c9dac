//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use pangolet_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

fn require_profile<'a>(cfg: &'a mut Config, name: &str) -> Result<&'a mut Profile, CliError> {
    let available = config::available_profiles(cfg);
    cfg.profiles
        .get_mut(name)
        .ok_or_else(|| CliError::ProfileNotFound {
            name: name.into(),
            available,
        })
}

/// A copy of the config safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(REDACTED.into());
        }
        if profile.discovery_api_key.is_some() {
            profile.discovery_api_key = Some(REDACTED.into());
        }
    }
    cfg
}

fn parse_flag(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn read_secret(label: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
    if secret.trim().is_empty() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret.trim().to_owned())
}

/// Ask where a secret should live; stores it in the keyring or returns
/// it for the config file.
fn place_secret(
    profile_name: &str,
    secret: String,
    discovery: bool,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection != 0 {
        return Ok(Some(secret));
    }
    if discovery {
        pangolet_config::store_discovery_api_key(profile_name, &secret)?;
    } else {
        pangolet_config::store_api_key(profile_name, &secret)?;
    }
    eprintln!("   ✓ Key stored in system keyring");
    Ok(None)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&pangolet_config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|_| format!("{c:#?}")),
                |c| c.default_profile.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = pangolet_config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "base_url" | "base-url" => profile.base_url = value,
                "org_id" | "org-id" | "org" => profile.org_id = value,
                "name" => profile.name = Some(value),
                "api_key" | "api-key" => profile.api_key = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "discovery_url" | "discovery-url" => profile.discovery_url = Some(value),
                "discovery_api_key" | "discovery-api-key" => {
                    profile.discovery_api_key = Some(value);
                }
                "public_ip_url" | "public-ip-url" => profile.public_ip_url = Some(value),
                "insecure" => profile.insecure = Some(parse_flag("insecure", &value)?),
                "timeout" => {
                    profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: base_url, org_id, name, \
                             api_key, api_key_env, discovery_url, discovery_api_key, \
                             public_ip_url, insecure, timeout, ca_cert"
                        ),
                    });
                }
            }

            let path = pangolet_config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}' ({})", path.display());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = pangolet_config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: pangolet config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = pangolet_config::load_config_or_default();
            require_profile(&mut cfg, &name)?;
            cfg.default_profile = Some(name.clone());
            pangolet_config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetKey { discovery } => {
            let mut cfg = pangolet_config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            require_profile(&mut cfg, &profile_name)?;

            let secret = read_secret(if discovery {
                "Seerr API key: "
            } else {
                "Gateway API key: "
            })?;
            if discovery {
                pangolet_config::store_discovery_api_key(&profile_name, &secret)?;
            } else {
                pangolet_config::store_api_key(&profile_name, &secret)?;
            }
            eprintln!("✓ Key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = pangolet_config::config_path();
    eprintln!("pangolet configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let base_url: String = Input::new()
        .with_prompt("Gateway API URL")
        .default("https://api.example.com/v1".into())
        .interact_text()
        .map_err(prompt_err)?;

    let org_id: String = Input::new()
        .with_prompt("Organization id")
        .interact_text()
        .map_err(prompt_err)?;

    let key = read_secret("Gateway API key: ")?;
    let api_key = place_secret(&profile_name, key, false)?;

    let mut profile = Profile {
        base_url,
        org_id,
        api_key,
        ..Profile::default()
    };

    let link_discovery = Confirm::new()
        .with_prompt("Link a Seerr instance for discovery?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    if link_discovery {
        let url: String = Input::new()
            .with_prompt("Seerr URL")
            .interact_text()
            .map_err(prompt_err)?;
        profile.discovery_url = Some(url);
        let key = read_secret("Seerr API key: ")?;
        profile.discovery_api_key = place_secret(&profile_name, key, true)?;
    }

    // Validate before writing anything.
    pangolet_config::profile_to_gateway_config(&profile, &profile_name, &Default::default())?;

    let mut cfg = pangolet_config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    let path = pangolet_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: pangolet resources list");
    Ok(())
}
