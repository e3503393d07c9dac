// ── API-to-domain type conversions ──
//
// Bridges raw `pangolet_api` response types into `pangolet_core::model`
// domain types, filling defaults for fields the gateway omits.

use serde_json::Value;

use pangolet_api::gateway::{ResourceResponse, TargetResponse};

use crate::model::{AccessRule, Resource, Target};

impl From<TargetResponse> for Target {
    fn from(t: TargetResponse) -> Self {
        Self {
            target_id: t.target_id,
            ip: t.ip.trim().to_owned(),
            port: t.port,
            enabled: t.enabled,
            health_status: t.health_status.filter(|s| !s.is_empty()),
        }
    }
}

impl From<ResourceResponse> for Resource {
    fn from(r: ResourceResponse) -> Self {
        Self {
            resource_id: r.resource_id,
            nice_id: r.nice_id.filter(|n| !n.is_empty()),
            name: r.name.unwrap_or_default(),
            full_domain: r.full_domain.filter(|d| !d.trim().is_empty()),
            ssl: r.ssl,
            protocol: r.protocol,
            http: r.http,
            sso: r.sso,
            enabled: r.enabled,
            whitelist: r.whitelist,
            proxy_port: r.proxy_port,
            targets: r.targets.into_iter().map(Target::from).collect(),
        }
    }
}

impl From<&Value> for AccessRule {
    fn from(v: &Value) -> Self {
        let text = |field: &str| v.get(field).and_then(Value::as_str);
        Self {
            rule_id: v.get("ruleId").and_then(Value::as_i64),
            action: text("action").and_then(|s| s.parse().ok()),
            match_kind: text("match").and_then(|s| s.parse().ok()),
            value: crate::model::rule::rule_addresses(v)
                .next()
                .map(str::to_owned),
            priority: v.get("priority").and_then(Value::as_i64),
            enabled: v.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        }
    }
}
