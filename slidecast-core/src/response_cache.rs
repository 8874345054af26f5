//! TTL cache for content API responses.
//!
//! Each [`ResourceKind`] has a freshness horizon (after which an entry is
//! served as stale and should be refreshed) and a retention horizon (after
//! which the entry is dropped whether or not it is used). Writes sweep
//! expired entries at most once per shortest retention horizon.

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use slidecast_model::{QueryKey, ResourceKind};
use tracing::trace;

use crate::cache_key::query_cache_key;
use crate::clock::{SharedClock, system_clock};
use crate::config::{CacheConfig, CacheHorizon};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Fresh(T),
    Stale(T),
    Miss,
}

impl<T> CacheLookup<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheLookup::Fresh(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            CacheLookup::Fresh(value) | CacheLookup::Stale(value) => Some(value),
            CacheLookup::Miss => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: i64,
}

#[derive(Debug)]
pub struct ResponseCache {
    horizons: CacheConfig,
    clock: SharedClock,
    entries: DashMap<QueryKey, CacheEntry>,
    last_sweep: AtomicI64,
    sweep_interval_ms: i64,
}

impl ResponseCache {
    pub fn new(horizons: CacheConfig) -> Self {
        Self::with_clock(horizons, system_clock())
    }

    pub fn with_clock(horizons: CacheConfig, clock: SharedClock) -> Self {
        let sweep_interval_ms = ResourceKind::ALL
            .into_iter()
            .map(|kind| secs_to_millis(horizons.horizon(kind).gc_secs))
            .min()
            .unwrap_or(i64::MAX);
        let last_sweep = AtomicI64::new(clock.now_millis());
        Self {
            horizons,
            clock,
            entries: DashMap::new(),
            last_sweep,
            sweep_interval_ms,
        }
    }

    pub fn horizon(&self, kind: ResourceKind) -> CacheHorizon {
        self.horizons.horizon(kind)
    }

    pub fn lookup(&self, key: &QueryKey) -> CacheLookup<Value> {
        let now = self.clock.now_millis();
        let horizon = self.horizon(key.kind);

        // Copy out before touching the map again; holding a shard guard
        // across `remove` would deadlock.
        let found = self.entries.get(key).map(|entry| {
            (Self::age_millis(entry.stored_at, now), entry.value.clone())
        });

        let Some((age, value)) = found else {
            return CacheLookup::Miss;
        };

        if age >= secs_to_millis(horizon.gc_secs) {
            self.entries.remove(key);
            trace!(
                key = %key,
                cache_key = %query_cache_key(key),
                age_ms = age,
                "dropped expired response"
            );
            CacheLookup::Miss
        } else if age >= secs_to_millis(horizon.stale_secs) {
            CacheLookup::Stale(value)
        } else {
            CacheLookup::Fresh(value)
        }
    }

    pub fn insert(&self, key: QueryKey, value: Value) {
        let stored_at = self.clock.now_millis();
        trace!(key = %key, cache_key = %query_cache_key(&key), "cached response");
        self.entries.insert(key, CacheEntry { value, stored_at });
        self.maybe_sweep(stored_at);
    }

    /// Entries that are never looked up again would otherwise outlive their
    /// retention horizon, so writes trigger a periodic full sweep.
    fn maybe_sweep(&self, now: i64) {
        let last = self.last_sweep.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.sweep_interval_ms {
            return;
        }
        // Only the writer that wins the exchange sweeps.
        if self
            .last_sweep
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.collect_garbage();
        }
    }

    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry of `kind`, e.g. after the post list changed.
    pub fn invalidate_kind(&self, kind: ResourceKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.kind != kind);
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove entries past their retention horizon. Returns how many were
    /// removed.
    pub fn collect_garbage(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            let gc = secs_to_millis(self.horizons.horizon(key.kind).gc_secs);
            Self::age_millis(entry.stored_at, now) < gc
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            trace!(removed, "response cache garbage collected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn age_millis(stored_at: i64, now: i64) -> i64 {
        (now - stored_at).max(0)
    }
}

fn secs_to_millis(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1_000)).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::sync::Arc;

    fn cache() -> (ResponseCache, ManualClock) {
        let clock = ManualClock::new(0);
        let cache =
            ResponseCache::with_clock(CacheConfig::default(), Arc::new(clock.clone()));
        (cache, clock)
    }

    fn posts_key(page: u32) -> QueryKey {
        QueryKey::new("api", ResourceKind::Posts).with_param("page", page)
    }

    #[test]
    fn entries_go_fresh_then_stale_then_away() {
        let (cache, clock) = cache();
        cache.insert(posts_key(1), json!([1, 2, 3]));

        assert!(cache.lookup(&posts_key(1)).is_fresh());

        clock.set(2 * 60 * 1000);
        assert_eq!(
            cache.lookup(&posts_key(1)),
            CacheLookup::Stale(json!([1, 2, 3]))
        );

        clock.set(5 * 60 * 1000);
        assert_eq!(cache.lookup(&posts_key(1)), CacheLookup::Miss);
        assert!(cache.is_empty());
    }

    #[test]
    fn horizons_follow_resource_kind() {
        let (cache, clock) = cache();
        let site = QueryKey::new("api", ResourceKind::SiteInfo);
        cache.insert(site.clone(), json!({"name": "demo"}));
        cache.insert(posts_key(1), json!([]));

        clock.set(10 * 60 * 1000);
        assert!(cache.lookup(&site).is_fresh());
        assert_eq!(cache.lookup(&posts_key(1)), CacheLookup::Miss);
    }

    #[test]
    fn garbage_collection_only_drops_expired() {
        let (cache, clock) = cache();
        cache.insert(posts_key(1), json!(1));
        cache.insert(QueryKey::new("api", ResourceKind::Entity).with_id("7"), json!(2));

        clock.set(6 * 60 * 1000);
        assert_eq!(cache.collect_garbage(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_kind_leaves_other_kinds() {
        let (cache, _clock) = cache();
        cache.insert(posts_key(1), json!(1));
        cache.insert(posts_key(2), json!(2));
        cache.insert(QueryKey::new("api", ResourceKind::Search), json!(3));

        assert_eq!(cache.invalidate_kind(ResourceKind::Posts), 2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.invalidate(&posts_key(1)));
    }

    #[test]
    fn writes_sweep_entries_nobody_reads_again() {
        let (cache, clock) = cache();
        for prefix in 0..100 {
            let key = QueryKey::new("api", ResourceKind::Search)
                .with_param("search", prefix);
            cache.insert(key, json!([]));
        }
        assert_eq!(cache.len(), 100);

        clock.set(24 * 60 * 60 * 1000);
        cache.insert(posts_key(1), json!([1]));

        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&posts_key(1)).is_fresh());
    }

    #[test]
    fn writes_inside_the_sweep_interval_do_not_sweep() {
        let (cache, clock) = cache();
        cache.insert(posts_key(1), json!(1));

        // Posts expire at 5 minutes, which is also the sweep interval.
        clock.set(4 * 60 * 1000);
        cache.insert(posts_key(2), json!(2));
        clock.set(6 * 60 * 1000);
        cache.insert(posts_key(3), json!(3));

        // The sweep at 6 minutes drops page 1 only.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup(&posts_key(1)), CacheLookup::Miss);
        assert!(cache.lookup(&posts_key(2)).is_fresh());
    }
}
