// Wire types for the Pangolin gateway API.
//
// Field names follow the gateway's camelCase JSON. Everything the gateway
// may omit or null is `Option` / `#[serde(default)]` so a partially filled
// resource never fails the whole list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::{Error, preview};

// ── Resources ────────────────────────────────────────────────────────

/// Envelope of `GET /org/{orgId}/resources`.
#[derive(Debug, Deserialize)]
pub struct ResourceListEnvelope {
    pub data: ResourceListData,
}

#[derive(Debug, Deserialize)]
pub struct ResourceListData {
    #[serde(default)]
    pub resources: Vec<ResourceResponse>,
}

/// A proxied endpoint as returned by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ResourceResponse {
    pub resource_id: Option<i64>,
    pub nice_id: Option<String>,
    pub name: Option<String>,
    pub ssl: bool,
    pub full_domain: Option<String>,
    pub password_id: Option<Value>,
    pub sso: bool,
    pub pincode_id: Option<Value>,
    pub whitelist: bool,
    pub http: bool,
    pub protocol: Option<String>,
    pub proxy_port: Option<u16>,
    pub enabled: bool,
    pub domain_id: Option<String>,
    pub header_auth_id: Option<Value>,
    pub targets: Vec<TargetResponse>,
}

/// An upstream backend of a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetResponse {
    pub target_id: Option<i64>,
    pub ip: String,
    pub port: Option<u16>,
    pub enabled: bool,
    pub health_status: Option<String>,
}

// ── Access rules ─────────────────────────────────────────────────────

/// What the gateway does when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RuleAction {
    #[default]
    Accept,
    Drop,
    Pass,
}

/// The kind of value a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RuleMatch {
    #[default]
    Ip,
    Cidr,
    Path,
    Country,
    Asn,
}

/// Optional overrides for a rule created with `add_access_rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddRuleOptions {
    pub action: RuleAction,
    pub match_kind: RuleMatch,
    pub priority: u32,
    pub enabled: bool,
}

impl Default for AddRuleOptions {
    fn default() -> Self {
        Self {
            action: RuleAction::Accept,
            match_kind: RuleMatch::Ip,
            priority: 100,
            enabled: true,
        }
    }
}

/// Body of `PUT /resource/{id}/rule`.
#[derive(Debug, Clone, Serialize)]
pub struct AccessRuleRequest<'a> {
    pub action: RuleAction,
    #[serde(rename = "match")]
    pub match_kind: RuleMatch,
    pub value: &'a str,
    pub priority: u32,
    pub enabled: bool,
}

impl<'a> AccessRuleRequest<'a> {
    pub fn new(value: &'a str, options: AddRuleOptions) -> Self {
        Self {
            action: options.action,
            match_kind: options.match_kind,
            value,
            priority: options.priority,
            enabled: options.enabled,
        }
    }
}

/// Body returned by `PUT /resource/{id}/rule`: JSON when the gateway sends
/// JSON, the raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum AddRuleResponse {
    Json(Value),
    Text(String),
}

/// Raw body of `GET /resource/{id}/rules`.
///
/// The gateway has shipped several envelope shapes for this endpoint.
/// [`into_rules`](Self::into_rules) flattens them, trying in order:
///
/// 1. a top-level array
/// 2. `{ "data": { "rules": [...] } }`
/// 3. `{ "rules": [...] }`
/// 4. `{ "items": [...] }`
/// 5. `{ "data": [...] }`
///
/// Any other shape is an error: an empty list here would read as "no
/// rules" and let a duplicate rule through.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RulesPayload(pub Value);

impl RulesPayload {
    pub fn into_rules(self) -> Result<Vec<Value>, Error> {
        let unrecognized = |value: &Value| Error::Deserialization {
            message: format!(
                "unrecognized access rule list shape (body preview: {:?})",
                preview(&value.to_string())
            ),
            body: value.to_string(),
        };
        match self.0 {
            Value::Array(items) => Ok(items),
            Value::Object(map) => {
                if let Some(Value::Array(rules)) = map.get("data").and_then(|d| d.get("rules")) {
                    return Ok(rules.clone());
                }
                for field in ["rules", "items", "data"] {
                    if let Some(Value::Array(rules)) = map.get(field) {
                        return Ok(rules.clone());
                    }
                }
                Err(unrecognized(&Value::Object(map)))
            }
            other => Err(unrecognized(&other)),
        }
    }
}
