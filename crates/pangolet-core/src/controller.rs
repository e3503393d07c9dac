// ── Controller ──
//
// Lifecycle for one gateway: load the public resource list, fan out the
// initial probe batch after a short settle delay, run bulk refreshes and
// whitelist requests, and tear everything down on shutdown.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use pangolet_api::transport::{TlsMode, TransportConfig};
use pangolet_api::gateway::RulesPayload;
use pangolet_api::{GatewayClient, PublicIpClient};
use secrecy::ExposeSecret;

use crate::config::{GatewayConfig, TlsVerification};
use crate::discovery::DiscoveryService;
use crate::error::{CoreError, public_ip_error};
use crate::model::{AccessRule, HealthRecord, Resource, ResourceKey};
use crate::probe::HealthProber;
use crate::refresh::{BulkRefresher, RefreshOutcome};
use crate::store::StatusStore;
use crate::stream::StatusStream;
use crate::whitelist::{Confirm, WhitelistCheck, WhitelistCoordinator, WhitelistOutcome};

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: GatewayConfig,
    gateway: GatewayClient,
    public_ip: PublicIpClient,
    store: Arc<StatusStore>,
    prober: HealthProber,
    refresher: BulkRefresher,
    whitelist: WhitelistCoordinator,
    discovery: Option<DiscoveryService>,
    cancel: CancellationToken,
    /// Child token for the current probe batch; replaced on every load.
    batch_cancel: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Build clients from `config`. Makes no network calls.
    pub fn new(config: GatewayConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let gateway = GatewayClient::from_api_key(
            config.base_url.as_str(),
            &config.api_key,
            &config.org_id,
            &transport,
        )?;
        let public_ip = match config.public_ip_url {
            Some(ref url) => PublicIpClient::with_endpoint(url.as_str(), &transport)?,
            None => PublicIpClient::new(&transport)?,
        };
        let prober = HealthProber::new(&transport, config.probe)?;
        let discovery = config
            .discovery
            .as_ref()
            .map(|d| DiscoveryService::new(d, &transport))
            .transpose()?;

        let store = Arc::new(StatusStore::new());
        let api_key_set = !config.api_key.expose_secret().trim().is_empty();
        let whitelist = WhitelistCoordinator::new(
            gateway.clone(),
            public_ip.clone(),
            Arc::clone(&store),
            api_key_set,
        );
        let cancel = CancellationToken::new();
        let batch_cancel = cancel.child_token();

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                gateway,
                public_ip,
                store,
                prober,
                refresher: BulkRefresher::new(),
                whitelist,
                discovery,
                cancel,
                batch_cancel: Mutex::new(batch_cancel),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.inner.store
    }

    pub fn prober(&self) -> &HealthProber {
        &self.inner.prober
    }

    pub fn subscribe_health(&self) -> StatusStream<HealthRecord> {
        self.inner.store.subscribe_health()
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Fetch the public resource list, replace the stored one, and schedule
    /// the initial probe batch.
    ///
    /// Any probe batch from a previous load is cancelled and all health
    /// and whitelist records are cleared first.
    pub async fn load_resources(&self) -> Result<Arc<Vec<Arc<Resource>>>, CoreError> {
        let batch = {
            let mut current = self.inner.batch_cancel.lock().await;
            current.cancel();
            *current = self.inner.cancel.child_token();
            current.clone()
        };
        self.inner.store.clear_status();

        let raw = self.inner.gateway.list_public_resources().await?;
        let resources = self
            .inner
            .store
            .set_resources(raw.into_iter().map(Resource::from).collect());
        info!(count = resources.len(), "loaded resources");

        let handle = tokio::spawn(initial_probe_task(
            self.inner.prober.clone(),
            Arc::clone(&self.inner.store),
            Arc::clone(&resources),
            self.inner.config.probe.settle_delay,
            batch,
        ));
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);

        Ok(resources)
    }

    pub fn resources(&self) -> Arc<Vec<Arc<Resource>>> {
        self.inner.store.resources()
    }

    /// Find a loaded resource by key, nice id, or name.
    pub fn resolve(&self, query: &str) -> Option<Arc<Resource>> {
        let resources = self.inner.store.resources();
        let key = ResourceKey::from(query.trim());
        resources
            .iter()
            .find(|r| r.key() == key)
            .or_else(|| resources.iter().find(|r| r.matches(query)))
            .cloned()
    }

    /// Wait until every background probe task has finished.
    pub async fn wait_idle(&self) {
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    // ── Health ───────────────────────────────────────────────────────

    /// Re-probe every loaded resource concurrently.
    ///
    /// The refresh is tied to the current probe batch: a reload or
    /// shutdown stops it before it can write into the cleared store.
    pub async fn refresh_health(&self) -> RefreshOutcome {
        let batch = self.inner.batch_cancel.lock().await.clone();
        let resources = self.inner.store.resources();
        self.inner
            .refresher
            .refresh_all(&resources, &self.inner.prober, &self.inner.store, &batch)
            .await
    }

    // ── Whitelist ────────────────────────────────────────────────────

    /// Add the caller's public IP to the rules of the resource stored under `key`.
    pub async fn whitelist<C: Confirm>(
        &self,
        key: &ResourceKey,
        confirm: &C,
    ) -> Result<WhitelistOutcome, CoreError> {
        let resource = self.find(key)?;
        self.inner
            .whitelist
            .ensure_whitelisted(&resource, confirm)
            .await
    }

    /// Whether the caller's IP is already listed for `key`; updates the store.
    pub async fn check_whitelisted(
        &self,
        key: &ResourceKey,
    ) -> Result<WhitelistCheck, CoreError> {
        let resource = self.find(key)?;
        self.inner.whitelist.check(&resource).await
    }

    pub async fn access_rules(&self, key: &ResourceKey) -> Result<Vec<AccessRule>, CoreError> {
        let resource = self.find(key)?;
        let resource_id = resource
            .resource_id
            .ok_or_else(|| CoreError::MissingResourceId {
                name: resource.display_name(),
            })?;
        let rules = self
            .inner
            .gateway
            .list_resource_rules(resource_id)
            .await
            .and_then(RulesPayload::into_rules)
            .map_err(|e| CoreError::RuleFetch {
                message: e.to_string(),
            })?;
        Ok(rules.iter().map(AccessRule::from).collect())
    }

    pub async fn public_ip(&self) -> Result<String, CoreError> {
        self.inner
            .public_ip
            .fetch_public_ip()
            .await
            .map_err(public_ip_error)
    }

    // ── Discovery ────────────────────────────────────────────────────

    pub fn discovery(&self) -> Result<&DiscoveryService, CoreError> {
        self.inner
            .discovery
            .as_ref()
            .ok_or_else(|| CoreError::NotConfigured {
                message: "no discovery service URL is configured".into(),
            })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cancel background probes, wait for them, and clear all state.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.wait_idle().await;
        self.inner.store.clear();
        debug!("controller shut down");
    }

    fn find(&self, key: &ResourceKey) -> Result<Arc<Resource>, CoreError> {
        self.inner
            .store
            .find_resource(key)
            .ok_or_else(|| CoreError::ResourceNotFound {
                query: key.to_string(),
            })
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Sleep `settle`, then probe every resource concurrently until done or
/// cancelled.
async fn initial_probe_task(
    prober: HealthProber,
    store: Arc<StatusStore>,
    resources: Arc<Vec<Arc<Resource>>>,
    settle: std::time::Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        () = tokio::time::sleep(settle) => {}
    }

    let mut probes = JoinSet::new();
    for resource in resources.iter() {
        let prober = prober.clone();
        let store = Arc::clone(&store);
        let resource = Arc::clone(resource);
        probes.spawn(async move {
            prober.probe_into(&resource, &store).await;
        });
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            probes.abort_all();
            debug!("initial probe batch cancelled");
        }
        () = async { while probes.join_next().await.is_some() {} } => {
            debug!(count = resources.len(), "initial probe batch complete");
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &GatewayConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use secrecy::SecretString;

    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig::new(
            "https://gw.example.com/v1".parse().unwrap(),
            SecretString::from("k".to_owned()),
            "acme",
        )
    }

    #[test]
    fn tls_modes_map_one_to_one() {
        assert!(matches!(tls_to_transport(&TlsVerification::SystemDefaults), TlsMode::System));
        assert!(matches!(
            tls_to_transport(&TlsVerification::DangerAcceptInvalid),
            TlsMode::DangerAcceptInvalid
        ));
        let ca = PathBuf::from("/etc/ca.pem");
        assert!(matches!(
            tls_to_transport(&TlsVerification::CustomCa(ca.clone())),
            TlsMode::CustomCa(p) if p == ca
        ));
    }

    #[test]
    fn discovery_is_optional() {
        let controller = Controller::new(config()).unwrap();
        assert!(matches!(
            controller.discovery(),
            Err(CoreError::NotConfigured { .. })
        ));
    }

    #[tokio::test]
    async fn whitelist_unknown_key_is_not_found() {
        let controller = Controller::new(config()).unwrap();
        let err = controller
            .whitelist(
                &"nope".into(),
                &crate::whitelist::FixedChoice(crate::whitelist::ConfirmChoice::Confirm),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ResourceNotFound { .. }));
    }
}
