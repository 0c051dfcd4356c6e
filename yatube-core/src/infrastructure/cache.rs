use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::domain::page::Page;
use crate::domain::post::Post;

pub const DEFAULT_MAX_ENTRIES: usize = 1_000;

/// A resolved index page: the clamped page size and the page number the
/// paginator settled on, never the raw query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub page_size: u64,
    pub number: u64,
}

struct Entry {
    page: Page<Post>,
    stored_at: Instant,
}

/// Side-cache for rendered index pages. Entries live for `ttl` and are never
/// invalidated by writes; `clear` is the only way to drop them early.
pub struct FeedCache {
    ttl: Duration,
    max_entries: usize,
    entries: DashMap<IndexKey, Entry>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_limit(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limit(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &IndexKey) -> Option<Page<Post>> {
        if !self.is_enabled() {
            return None;
        }
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.page.clone());
        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
        }
        hit
    }

    pub fn put(&self, key: IndexKey, page: Page<Post>) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            key,
            Entry {
                page,
                stored_at: Instant::now(),
            },
        );
        self.enforce_limit();
    }

    /// Drops expired entries first, then the oldest ones, until the cache is
    /// back under `max_entries`.
    fn enforce_limit(&self) {
        if self.entries.len() <= self.max_entries {
            return;
        }
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(IndexKey, Instant)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.stored_at))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);
        warn!(
            entries = by_age.len(),
            evict_count = excess,
            "feed cache limit exceeded, evicting oldest entries"
        );
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(entries = dropped, "feed cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::page::Paginator;

    fn page() -> Page<Post> {
        Paginator::new(0, 10).page(1, Vec::new())
    }

    fn key(number: u64) -> IndexKey {
        IndexKey {
            page_size: 10,
            number,
        }
    }

    #[test]
    fn stores_until_cleared() {
        let cache = FeedCache::new(Duration::from_secs(60));
        assert!(cache.get(&key(1)).is_none());

        cache.put(key(1), page());
        assert_eq!(cache.get(&key(1)), Some(page()));
        assert!(cache.get(&key(2)).is_none());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = FeedCache::new(Duration::from_nanos(1));
        cache.put(key(1), page());
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = FeedCache::disabled();
        cache.put(key(1), page());
        assert!(cache.is_empty());
    }

    #[test]
    fn oldest_entries_are_evicted_over_the_limit() {
        let cache = FeedCache::with_limit(Duration::from_secs(60), 3);
        for number in 1..=5 {
            cache.put(key(number), page());
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_none());
        assert!(cache.get(&key(5)).is_some());
    }
}
