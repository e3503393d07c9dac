// Pangolin gateway API
//
// Resource listing and per-resource access rules, authenticated with a
// bearer API key.

pub mod client;
pub mod types;

pub use client::GatewayClient;
pub use types::{
    AddRuleOptions, AddRuleResponse, ResourceResponse, RuleAction, RuleMatch, RulesPayload,
    TargetResponse,
};
