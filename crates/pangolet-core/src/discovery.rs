// ── Media discovery service ──
//
// Thin layer over `DiscoveryClient`: concurrent multi-list loading where a
// failed list degrades to an empty page, and a time-bounded genre cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, warn};

use pangolet_api::discovery::{
    DiscoverEndpoint, DiscoverParams, DiscoverResponse, Genre, MediaKind, MediaResult,
};
use pangolet_api::{DiscoveryClient, TransportConfig};

use crate::config::DiscoveryConfig;
use crate::error::CoreError;

// ── Genre cache ──────────────────────────────────────────────────────

struct CachedGenres {
    genres: Arc<Vec<Genre>>,
    fetched_at: DateTime<Utc>,
}

/// Genre lists per media kind, each valid for `ttl` after it was stored.
///
/// Time is passed in rather than read, so expiry is deterministic.
pub struct GenreCache {
    ttl: TimeDelta,
    entries: HashMap<MediaKind, CachedGenres>,
}

impl Default for GenreCache {
    fn default() -> Self {
        Self::new(TimeDelta::hours(24))
    }
}

impl GenreCache {
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The cached list for `kind`, if it was stored less than `ttl` before `now`.
    pub fn get(&self, kind: MediaKind, now: DateTime<Utc>) -> Option<Arc<Vec<Genre>>> {
        let entry = self.entries.get(&kind)?;
        (now.signed_duration_since(entry.fetched_at) < self.ttl).then(|| Arc::clone(&entry.genres))
    }

    pub fn put(&mut self, kind: MediaKind, genres: Vec<Genre>, now: DateTime<Utc>) -> Arc<Vec<Genre>> {
        let genres = Arc::new(genres);
        self.entries.insert(
            kind,
            CachedGenres {
                genres: Arc::clone(&genres),
                fetched_at: now,
            },
        );
        genres
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }
}

/// Names for `ids`, in order, skipping ids not present in `genres`.
pub fn genre_names(ids: &[i64], genres: &[Genre]) -> Vec<String> {
    if ids.is_empty() {
        return Vec::new();
    }
    let by_id: HashMap<i64, &str> = genres.iter().map(|g| (g.id, g.name.as_str())).collect();
    ids.iter()
        .filter_map(|id| by_id.get(id).map(|name| (*name).to_owned()))
        .collect()
}

// ── List configuration ───────────────────────────────────────────────

/// One discover list to load, keyed by `id` in the result map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverList {
    pub id: String,
    pub endpoint: DiscoverEndpoint,
    pub page: u32,
}

impl DiscoverList {
    pub fn new(endpoint: DiscoverEndpoint) -> Self {
        Self {
            id: endpoint.to_string(),
            endpoint,
            page: 1,
        }
    }

    /// First page of every discover endpoint.
    pub fn all() -> Vec<Self> {
        [
            DiscoverEndpoint::Trending,
            DiscoverEndpoint::Popular,
            DiscoverEndpoint::Movies,
            DiscoverEndpoint::Tv,
            DiscoverEndpoint::Upcoming,
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }
}

// ── Service ──────────────────────────────────────────────────────────

pub struct DiscoveryService {
    client: DiscoveryClient,
    genres: Mutex<GenreCache>,
}

impl DiscoveryService {
    pub fn new(config: &DiscoveryConfig, transport: &TransportConfig) -> Result<Self, CoreError> {
        let client = DiscoveryClient::new(config.url.as_str(), config.api_key.as_ref(), transport)?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: DiscoveryClient) -> Self {
        Self {
            client,
            genres: Mutex::new(GenreCache::default()),
        }
    }

    /// Base URL used to resolve poster and backdrop paths.
    pub fn image_base(&self) -> &str {
        self.client.base_url().as_str()
    }

    pub async fn discover(
        &self,
        endpoint: DiscoverEndpoint,
        params: &DiscoverParams,
    ) -> Result<DiscoverResponse, CoreError> {
        Ok(self.client.discover(endpoint, params).await?)
    }

    /// Load several lists concurrently. A list that fails is logged and
    /// replaced by an empty page; the map follows the order of `lists`.
    pub async fn load_lists(&self, lists: &[DiscoverList]) -> IndexMap<String, DiscoverResponse> {
        let pages = join_all(lists.iter().map(|list| async move {
            let params = DiscoverParams::page(list.page.max(1));
            match self.client.discover(list.endpoint, &params).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(list = %list.id, error = %e, "failed to load discover list");
                    DiscoverResponse::empty()
                }
            }
        }))
        .await;
        lists
            .iter()
            .map(|l| l.id.clone())
            .zip(pages)
            .collect()
    }

    /// Genres for `kind`, served from the cache for 24 hours.
    pub async fn genres(&self, kind: MediaKind) -> Result<Arc<Vec<Genre>>, CoreError> {
        self.genres_at(kind, Utc::now()).await
    }

    pub async fn genres_at(
        &self,
        kind: MediaKind,
        now: DateTime<Utc>,
    ) -> Result<Arc<Vec<Genre>>, CoreError> {
        let cached = self.cache().get(kind, now);
        if let Some(hit) = cached {
            debug!(%kind, "genre cache hit");
            return Ok(hit);
        }
        let fetched = self.client.fetch_genres(kind).await?;
        Ok(self.cache().put(kind, fetched, now))
    }

    /// Genre names for a result, or an empty list if genres cannot be loaded.
    pub async fn genre_names_for(&self, result: &MediaResult) -> Vec<String> {
        match self.genres(result.kind).await {
            Ok(genres) => genre_names(&result.genre_ids, &genres),
            Err(e) => {
                warn!(kind = %result.kind, error = %e, "failed to fetch genres");
                Vec::new()
            }
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, GenreCache> {
        self.genres.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
