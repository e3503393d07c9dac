//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use pangolet_config::ConfigError;
use pangolet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const NOT_CONFIGURED: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the remote service: {message}")]
    #[diagnostic(
        code(pangolet::connection_failed),
        help(
            "Check that the gateway is reachable from this machine.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed ({status}): {message}")]
    #[diagnostic(
        code(pangolet::auth_failed),
        help(
            "Verify the API key and organization id of the active profile.\n\
             Run: pangolet config set-key"
        )
    )]
    AuthFailed { status: u16, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(pangolet::no_credentials),
        help(
            "Configure credentials with: pangolet config init\n\
             Or set the PANGOLET_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("{message}")]
    #[diagnostic(
        code(pangolet::not_configured),
        help("Run: pangolet config set <key> <value> on the active profile")
    )]
    NotConfigured { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(pangolet::not_found),
        help("Run: pangolet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("A whitelist operation for '{identifier}' is already running")]
    #[diagnostic(code(pangolet::conflict), help("Wait for it to finish and try again."))]
    Conflict { identifier: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(pangolet::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pangolet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(pangolet::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: pangolet config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(pangolet::no_config),
        help(
            "Create one with: pangolet config init\n\
             Or pass --base-url, --org and --api-key.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(pangolet::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(pangolet::confirmation_required),
        help("Use --yes (-y) to confirm in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::NotConfigured { .. } | Self::NoConfig { .. } => exit_code::NOT_CONFIGURED,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ApiError { .. } | Self::Config(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { message } => Self::ConnectionFailed { message },

            CoreError::Http {
                status: status @ (401 | 403),
                message,
                ..
            } => Self::AuthFailed { status, message },

            CoreError::Http {
                status,
                url,
                message,
            } => Self::ApiError {
                code: status.to_string(),
                message: format!("{url}: {message}"),
            },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::NotConfigured { message } => Self::NotConfigured { message },

            CoreError::ResourceNotFound { query } => Self::NotFound {
                resource_type: "resource".into(),
                identifier: query,
                list_command: "resources list".into(),
            },

            CoreError::WhitelistInProgress { key } => Self::Conflict { identifier: key },

            CoreError::MissingResourceId { name } => Self::Validation {
                field: "resource".into(),
                reason: format!("'{name}' has no resource id; access rules cannot be addressed"),
            },

            err @ CoreError::RuleFetch { .. } => Self::ApiError {
                code: "rule_fetch".into(),
                message: err.to_string(),
            },

            err @ CoreError::AddRule { .. } => Self::ApiError {
                code: "add_rule".into(),
                message: err.to_string(),
            },

            CoreError::Parse { message } => Self::ApiError {
                code: "parse".into(),
                message,
            },

            CoreError::Internal(message) => Self::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Figment(err) => Self::Config(err),
            ConfigError::Io(err) => Self::Io(err),
            err @ (ConfigError::Serialization(_) | ConfigError::Keyring(_)) => Self::Validation {
                field: "config".into(),
                reason: err.to_string(),
            },
        }
    }
}
