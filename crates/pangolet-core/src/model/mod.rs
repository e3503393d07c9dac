// ── Domain model ──

pub mod health;
pub mod resource;
pub mod rule;

pub use health::HealthRecord;
pub use resource::{Resource, ResourceKey, Target};
pub use rule::{AccessRule, RuleAction, RuleMatch};
