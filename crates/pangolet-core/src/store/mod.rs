// ── Status store ──
//
// Per-resource health and whitelist state, plus the most recently loaded
// resource list. Writers are the prober tasks and the whitelist
// coordinator; readers subscribe through `StatusStream`.

mod collection;

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;

pub use collection::Snapshot;
use collection::KeyedCollection;

use crate::model::{HealthRecord, Resource, ResourceKey};
use crate::stream::StatusStream;

/// Shared status state for every loaded resource.
///
/// Writes are whole-record replacements; the last write for a key wins.
/// A missing key means "unknown".
pub struct StatusStore {
    health: KeyedCollection<HealthRecord>,
    whitelisted: KeyedCollection<bool>,
    resources: ArcSwap<Vec<Arc<Resource>>>,
    resources_tx: watch::Sender<Arc<Vec<Arc<Resource>>>>,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore {
    pub fn new() -> Self {
        let (resources_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            health: KeyedCollection::new(),
            whitelisted: KeyedCollection::new(),
            resources: ArcSwap::from_pointee(Vec::new()),
            resources_tx,
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Replace the loaded resource list.
    pub fn set_resources(&self, resources: Vec<Resource>) -> Arc<Vec<Arc<Resource>>> {
        let list: Arc<Vec<Arc<Resource>>> = Arc::new(resources.into_iter().map(Arc::new).collect());
        self.resources.store(Arc::clone(&list));
        self.resources_tx.send_modify(|snap| *snap = Arc::clone(&list));
        list
    }

    pub fn resources(&self) -> Arc<Vec<Arc<Resource>>> {
        self.resources.load_full()
    }

    pub fn find_resource(&self, key: &ResourceKey) -> Option<Arc<Resource>> {
        self.resources
            .load()
            .iter()
            .find(|r| &r.key() == key)
            .cloned()
    }

    pub fn subscribe_resources(&self) -> watch::Receiver<Arc<Vec<Arc<Resource>>>> {
        self.resources_tx.subscribe()
    }

    // ── Health ───────────────────────────────────────────────────────

    pub fn set_health(&self, key: ResourceKey, record: HealthRecord) {
        self.health.upsert(key, record);
    }

    pub fn health(&self, key: &ResourceKey) -> Option<Arc<HealthRecord>> {
        self.health.get(key)
    }

    pub fn health_snapshot(&self) -> Snapshot<HealthRecord> {
        self.health.snapshot()
    }

    pub fn subscribe_health(&self) -> StatusStream<HealthRecord> {
        StatusStream::new(self.health.subscribe())
    }

    /// Number of health writes so far.
    pub fn health_version(&self) -> u64 {
        self.health.version()
    }

    // ── Whitelist ────────────────────────────────────────────────────

    pub fn set_whitelisted(&self, key: ResourceKey, whitelisted: bool) {
        self.whitelisted.upsert(key, whitelisted);
    }

    /// `None` until the caller's IP status for this resource is known.
    pub fn whitelisted(&self, key: &ResourceKey) -> Option<bool> {
        self.whitelisted.get(key).map(|v| *v)
    }

    pub fn subscribe_whitelisted(&self) -> StatusStream<bool> {
        StatusStream::new(self.whitelisted.subscribe())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Forget every per-resource record (resources are kept).
    pub fn clear_status(&self) {
        self.health.clear();
        self.whitelisted.clear();
    }

    pub fn forget(&self, key: &ResourceKey) {
        self.health.remove(key);
        self.whitelisted.remove(key);
    }

    /// Forget everything, including the resource list.
    pub fn clear(&self) {
        self.clear_status();
        self.set_resources(Vec::new());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let store = StatusStore::new();
        let key = ResourceKey::from("7");
        store.set_health(key.clone(), HealthRecord::from_hint("healthy"));
        store.set_health(key.clone(), HealthRecord::unreachable("connection refused"));
        let rec = store.health(&key).unwrap();
        assert!(!rec.up);
        assert_eq!(rec.info.as_deref(), Some("connection refused"));
        assert_eq!(store.health_snapshot().len(), 1);
    }

    #[test]
    fn unknown_until_written() {
        let store = StatusStore::new();
        let key = ResourceKey::from("7");
        assert!(store.health(&key).is_none());
        assert!(store.whitelisted(&key).is_none());
        store.set_whitelisted(key.clone(), true);
        assert_eq!(store.whitelisted(&key), Some(true));
        store.forget(&key);
        assert!(store.whitelisted(&key).is_none());
    }

    #[test]
    fn clear_status_keeps_resources() {
        let store = StatusStore::new();
        store.set_health("a".into(), HealthRecord::from_hint("healthy"));
        store.set_whitelisted("a".into(), true);
        store.clear_status();
        assert!(store.health_snapshot().is_empty());
        assert!(store.whitelisted(&"a".into()).is_none());
    }
}
