// ── Access rules ──
//
// Rules arrive as loosely shaped JSON. The whitelist dedup scan works on
// the raw values so a field it does not model cannot hide a match.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use pangolet_api::gateway::{RuleAction, RuleMatch};

/// An access rule attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub rule_id: Option<i64>,
    pub action: Option<RuleAction>,
    pub match_kind: Option<RuleMatch>,
    /// The matched value (an IP for `IP` rules).
    pub value: Option<String>,
    pub priority: Option<i64>,
    pub enabled: bool,
}

/// Value-bearing fields scanned for an address, in order.
const ADDRESS_FIELDS: [&str; 3] = ["ip", "value", "address"];

/// Every address-like string carried by a raw rule: `ip`, `value`,
/// `address`, and nested `client.ip`.
pub fn rule_addresses(rule: &Value) -> impl Iterator<Item = &str> {
    let direct = ADDRESS_FIELDS
        .iter()
        .filter_map(move |field| rule.get(*field).and_then(Value::as_str));
    let nested = rule
        .get("client")
        .and_then(|c| c.get("ip"))
        .and_then(Value::as_str);
    direct.chain(nested)
}

/// Whether any rule already carries `ip` under a value-bearing field.
pub fn contains_address(rules: &[Value], ip: &str) -> bool {
    let ip = ip.trim();
    !ip.is_empty()
        && rules
            .iter()
            .any(|rule| rule_addresses(rule).any(|addr| addr.trim() == ip))
}
