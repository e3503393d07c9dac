//! Clap derive structures for the `pangolet` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pangolet -- resource health and IP whitelisting for Pangolin gateways
#[derive(Debug, Parser)]
#[command(
    name = "pangolet",
    version,
    about = "Check and unlock Pangolin gateway resources from the command line",
    long_about = "Lists the public resources of a Pangolin gateway, probes their health,\n\
        and adds your public IP to a resource's access rules on request.\n\n\
        A linked Seerr instance can be browsed with `discover` and `genres`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "PANGOLET_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway API base URL (overrides profile)
    #[arg(long, short = 'u', env = "PANGOLET_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Gateway API key
    #[arg(long, env = "PANGOLET_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Organization id (overrides profile)
    #[arg(long, env = "PANGOLET_ORG", global = true)]
    pub org: Option<String>,

    /// Seerr URL for discovery commands (overrides profile)
    #[arg(long, env = "PANGOLET_DISCOVERY_URL", global = true)]
    pub discovery_url: Option<String>,

    /// Seerr API key
    #[arg(long, env = "PANGOLET_DISCOVERY_API_KEY", global = true, hide_env = true)]
    pub discovery_api_key: Option<String>,

    /// Public IP echo endpoint
    #[arg(long, env = "PANGOLET_IP_URL", global = true, hide = true)]
    pub ip_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PANGOLET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PANGOLET_INSECURE", global = true)]
    pub insecure: bool,

    /// Gateway request timeout in seconds
    #[arg(long, env = "PANGOLET_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List gateway resources, their health, and their access rules
    #[command(alias = "res", alias = "r")]
    Resources(ResourcesArgs),

    /// Add your public IP to a resource's access rules
    #[command(alias = "wl")]
    Whitelist(WhitelistArgs),

    /// Print your public IP address
    Ip,

    /// Browse Seerr discover lists
    Discover(DiscoverArgs),

    /// List Seerr genres for movies or TV
    Genres(GenresArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Resources ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ResourcesArgs {
    #[command(subcommand)]
    pub command: ResourcesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResourcesCommand {
    /// List public resources
    #[command(alias = "ls")]
    List,

    /// Probe every resource and show up/down, latency, and favicon
    Health {
        /// Keep re-probing on an interval until interrupted
        #[arg(long, short = 'w')]
        watch: bool,

        /// Seconds between refreshes in watch mode
        #[arg(long, default_value = "30", requires = "watch")]
        interval: u64,
    },

    /// Show the access rules of a resource
    Rules {
        /// Resource id, nice id, or name
        resource: String,
    },
}

// ── Whitelist ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WhitelistArgs {
    /// Resource id, nice id, or name
    pub resource: String,

    /// Only report whether your IP is already listed; never add a rule
    #[arg(long)]
    pub check: bool,
}

// ── Discovery ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DiscoverListArg {
    Movies,
    Tv,
    Upcoming,
    Popular,
    Trending,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MediaKindArg {
    Movie,
    Tv,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// List to fetch; all lists when omitted
    pub list: Option<DiscoverListArg>,

    /// Page number
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Genre id filter
    #[arg(long)]
    pub genre: Option<String>,

    /// Result language (e.g. "en")
    #[arg(long)]
    pub language: Option<String>,

    /// Watch provider ids, pipe separated
    #[arg(long)]
    pub watch_providers: Option<String>,
}

#[derive(Debug, Args)]
pub struct GenresArgs {
    /// Media kind
    pub kind: MediaKindArg,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Display the current configuration (secrets redacted)
    Show,

    /// Set a value on the active profile
    Set {
        /// Config key (e.g. "base_url", "org_id", "discovery_url")
        key: String,
        /// Value to assign
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    #[command(alias = "set-default")]
    Use {
        /// Profile name to make default
        name: String,
    },

    /// Store an API key for the active profile in the system keyring
    SetKey {
        /// Store the Seerr API key instead of the gateway key
        #[arg(long)]
        discovery: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
