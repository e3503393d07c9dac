// pangolet-core: health probing, whitelist coordination, and status state
// between pangolet-api and the CLI.

pub mod config;
pub mod controller;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod model;
pub mod probe;
pub mod refresh;
pub mod store;
pub mod stream;
pub mod whitelist;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DiscoveryConfig, GatewayConfig, ProbeConfig, TlsVerification};
pub use controller::Controller;
pub use discovery::{DiscoverList, DiscoveryService, GenreCache, genre_names};
pub use error::CoreError;
pub use probe::HealthProber;
pub use refresh::{BulkRefresher, RefreshOutcome};
pub use store::StatusStore;
pub use stream::StatusStream;
pub use whitelist::{
    ActionStyle, Confirm, ConfirmAction, ConfirmChoice, ConfirmPrompt, FixedChoice,
    WhitelistCheck, WhitelistCoordinator, WhitelistOutcome,
};

pub use model::{
    AccessRule, HealthRecord, Resource, ResourceKey, RuleAction, RuleMatch, Target,
};

// Discovery types consumers render directly.
pub use pangolet_api::discovery::{
    DiscoverEndpoint, DiscoverParams, DiscoverResponse, Genre, MediaKind, MediaResult,
    MediaStatus,
};
