// ── Keyed reactive collection ──
//
// Concurrent per-resource storage with push-based change notification
// via `watch` channels.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::ResourceKey;

/// Ordered point-in-time view of a collection.
pub type Snapshot<T> = Arc<BTreeMap<ResourceKey, Arc<T>>>;

/// A concurrent, reactive map from resource key to record.
///
/// Every mutation replaces the whole value for its key and rebuilds the
/// snapshot that subscribers receive.
pub(crate) struct KeyedCollection<T: Send + Sync + 'static> {
    by_key: DashMap<ResourceKey, Arc<T>>,
    /// Bumped on every mutation.
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> KeyedCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(BTreeMap::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace the record for `key`. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: ResourceKey, value: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(value)).is_none();
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    pub(crate) fn remove(&self, key: &ResourceKey) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    pub(crate) fn get(&self, key: &ResourceKey) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        self.by_key.clear();
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let values: BTreeMap<ResourceKey, Arc<T>> = self
            .by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
