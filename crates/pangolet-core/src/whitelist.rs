// ── Whitelist coordinator ──
//
// Adds the caller's public IP to a resource's access rules, at most once.
// Every invocation lists the existing rules before it may add one, and
// only one invocation per resource key may be running at a time.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::Mutex;
use tracing::{debug, info};

use pangolet_api::gateway::{AddRuleOptions, RulesPayload};
use pangolet_api::{GatewayClient, PublicIpClient};

use crate::error::{CoreError, public_ip_error};
use crate::model::rule::contains_address;
use crate::model::{Resource, ResourceKey};
use crate::store::StatusStore;

// ── Confirmation surface ─────────────────────────────────────────────

/// The user's answer to a [`ConfirmPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Cancel,
    Confirm,
}

/// Presentation hint for an action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStyle {
    Cancel,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmAction {
    pub label: String,
    pub style: ActionStyle,
    pub choice: ConfirmChoice,
}

/// A two-action question put to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    /// Cancel first, confirm second.
    pub actions: [ConfirmAction; 2],
}

impl ConfirmPrompt {
    fn add_ip(ip: &str, resource: &Resource) -> Self {
        Self {
            title: "Add to whitelist".into(),
            message: format!(
                "Your IP {ip} is not in the access rules of {}. Add it?",
                resource.display_name()
            ),
            actions: [
                ConfirmAction {
                    label: "Cancel".into(),
                    style: ActionStyle::Cancel,
                    choice: ConfirmChoice::Cancel,
                },
                ConfirmAction {
                    label: "Add".into(),
                    style: ActionStyle::Default,
                    choice: ConfirmChoice::Confirm,
                },
            ],
        }
    }
}

/// Asks the user to confirm a mutation.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &ConfirmPrompt) -> impl Future<Output = ConfirmChoice> + Send;
}

/// Answers every prompt with the same choice (non-interactive runs).
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub ConfirmChoice);

impl Confirm for FixedChoice {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> impl Future<Output = ConfirmChoice> + Send {
        std::future::ready(self.0)
    }
}

// ── Outcome ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistOutcome {
    /// An existing rule already carries the IP; nothing was added.
    AlreadyWhitelisted { ip: String },
    /// A new rule was created.
    Added { ip: String },
    /// The user declined; nothing was mutated.
    Cancelled { ip: String },
}

impl WhitelistOutcome {
    pub fn ip(&self) -> &str {
        match self {
            Self::AlreadyWhitelisted { ip } | Self::Added { ip } | Self::Cancelled { ip } => ip,
        }
    }
}

/// Result of a read-only [`WhitelistCoordinator::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistCheck {
    /// The public IP the rules were scanned for.
    pub ip: String,
    pub listed: bool,
}

// ── In-flight guard ──────────────────────────────────────────────────

/// Holds a resource key in the in-flight set; releases it on drop.
struct InFlight<'a> {
    set: &'a DashSet<ResourceKey>,
    key: ResourceKey,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a DashSet<ResourceKey>, key: ResourceKey) -> Option<Self> {
        set.insert(key.clone()).then_some(Self { set, key })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

// ── Coordinator ──────────────────────────────────────────────────────

pub struct WhitelistCoordinator {
    gateway: GatewayClient,
    public_ip: PublicIpClient,
    store: Arc<StatusStore>,
    api_key_set: bool,
    rule_options: AddRuleOptions,
    in_flight: DashSet<ResourceKey>,
    /// Serializes prompts so only one question is on screen at a time.
    prompt_lock: Mutex<()>,
}

impl WhitelistCoordinator {
    pub fn new(
        gateway: GatewayClient,
        public_ip: PublicIpClient,
        store: Arc<StatusStore>,
        api_key_set: bool,
    ) -> Self {
        Self {
            gateway,
            public_ip,
            store,
            api_key_set,
            rule_options: AddRuleOptions::default(),
            in_flight: DashSet::new(),
            prompt_lock: Mutex::new(()),
        }
    }

    /// Override the action/priority of rules this coordinator creates.
    pub fn with_rule_options(mut self, options: AddRuleOptions) -> Self {
        self.rule_options = options;
        self
    }

    /// Ensure the caller's current public IP is in `resource`'s access rules.
    ///
    /// Fails with `WhitelistInProgress` if another call for the same
    /// resource key has not finished.
    pub async fn ensure_whitelisted<C: Confirm>(
        &self,
        resource: &Resource,
        confirm: &C,
    ) -> Result<WhitelistOutcome, CoreError> {
        let (resource_id, key) = self.preflight(resource)?;
        let _guard = InFlight::acquire(&self.in_flight, key.clone()).ok_or_else(|| {
            CoreError::WhitelistInProgress {
                key: key.to_string(),
            }
        })?;

        let ip = self.current_ip().await?;
        if self.ip_listed(resource_id, &ip).await? {
            info!(resource = %key, ip = %ip, "already whitelisted");
            self.store.set_whitelisted(key, true);
            return Ok(WhitelistOutcome::AlreadyWhitelisted { ip });
        }

        let prompt = ConfirmPrompt::add_ip(&ip, resource);
        let choice = {
            let _prompt = self.prompt_lock.lock().await;
            confirm.confirm(&prompt).await
        };
        if choice == ConfirmChoice::Cancel {
            debug!(resource = %key, "whitelist add cancelled");
            return Ok(WhitelistOutcome::Cancelled { ip });
        }

        self.gateway
            .add_access_rule(resource_id, &ip, self.rule_options)
            .await
            .map_err(|e| CoreError::AddRule {
                message: e.to_string(),
            })?;
        info!(resource = %key, ip = %ip, "added access rule");
        self.store.set_whitelisted(key, true);
        Ok(WhitelistOutcome::Added { ip })
    }

    /// Check, without mutating rules, whether the caller's IP is listed,
    /// and record the answer in the store.
    ///
    /// The returned IP is the one the rules were scanned for.
    pub async fn check(&self, resource: &Resource) -> Result<WhitelistCheck, CoreError> {
        let (resource_id, key) = self.preflight(resource)?;
        let ip = self.current_ip().await?;
        let listed = self.ip_listed(resource_id, &ip).await?;
        self.store.set_whitelisted(key, listed);
        Ok(WhitelistCheck { ip, listed })
    }

    async fn current_ip(&self) -> Result<String, CoreError> {
        self.public_ip
            .fetch_public_ip()
            .await
            .map_err(public_ip_error)
    }

    fn preflight(&self, resource: &Resource) -> Result<(i64, ResourceKey), CoreError> {
        if !self.api_key_set {
            return Err(CoreError::NotConfigured {
                message: "gateway API key is not set".into(),
            });
        }
        let resource_id = resource
            .resource_id
            .ok_or_else(|| CoreError::MissingResourceId {
                name: resource.display_name(),
            })?;
        Ok((resource_id, resource.key()))
    }

    async fn ip_listed(&self, resource_id: i64, ip: &str) -> Result<bool, CoreError> {
        let rules = self
            .gateway
            .list_resource_rules(resource_id)
            .await
            .and_then(RulesPayload::into_rules)
            .map_err(|e| CoreError::RuleFetch {
                message: e.to_string(),
            })?;
        debug!(resource_id, rules = rules.len(), "scanning access rules");
        Ok(contains_address(&rules, ip))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let set = DashSet::new();
        let first = InFlight::acquire(&set, "7".into());
        assert!(first.is_some());
        assert!(InFlight::acquire(&set, "7".into()).is_none());
        assert!(InFlight::acquire(&set, "8".into()).is_some());
        drop(first);
        assert!(InFlight::acquire(&set, "7".into()).is_some());
    }

    #[tokio::test]
    async fn fixed_choice_answers_immediately() {
        let r = Resource {
            resource_id: Some(1),
            nice_id: None,
            name: "svc".into(),
            full_domain: None,
            ssl: false,
            protocol: None,
            http: true,
            sso: false,
            enabled: true,
            whitelist: false,
            proxy_port: None,
            targets: Vec::new(),
        };
        let prompt = ConfirmPrompt::add_ip("1.2.3.4", &r);
        assert!(prompt.message.contains("1.2.3.4"));
        assert_eq!(prompt.actions[0].style, ActionStyle::Cancel);
        assert_eq!(
            FixedChoice(ConfirmChoice::Confirm).confirm(&prompt).await,
            ConfirmChoice::Confirm
        );
    }
}
