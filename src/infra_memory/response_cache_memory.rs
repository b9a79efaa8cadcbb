use crate::domain_model::UserId;
use crate::domain_port::{CacheKey, CachedPayload, Clock, ResponseCache};
use crate::logger::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedPayload,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-local response cache.
///
/// Each entry is replaced whole under its shard lock, so a reader sees either
/// the previous payload or the new one. Expired entries stay in the map until
/// they are read or swept by [`ResponseCache::purge_expired`].
pub struct MemoryResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl MemoryResponseCache {
    /// `max_entries == 0` leaves the cache unbounded. Puts racing on new keys
    /// may overshoot the bound briefly; each put trims back before returning.
    pub fn new(clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            max_entries,
        }
    }

    fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Shrinks the map to `limit` entries: expired entries go first, then the
    /// entries closest to expiry.
    fn shrink_to(&self, limit: usize) {
        if self.entries.len() <= limit {
            return;
        }
        self.purge_expired();

        while self.entries.len() > limit {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().expires_at)
                .map(|entry| entry.key().clone());
            let Some(key) = victim else { break };
            self.entries.remove(&key);
            debug!(%key, "cache full, evicted entry closest to expiry");
        }
    }
}

impl ResponseCache for MemoryResponseCache {
    fn get(&self, key: &CacheKey) -> Option<CachedPayload> {
        let now = self.clock.now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.payload.clone()));

        match lookup {
            Some(Some(payload)) => Some(payload),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                None
            }
            None => None,
        }
    }

    fn put(&self, key: CacheKey, payload: CachedPayload, ttl: Duration) {
        let now = self.clock.now();
        let bounded = self.max_entries > 0;
        if bounded && !self.entries.contains_key(&key) {
            self.shrink_to(self.max_entries - 1);
        }
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                expires_at: Self::expiry(now, ttl),
            },
        );
        // Racing inserts of new keys can overshoot the bound.
        if bounded {
            self.shrink_to(self.max_entries);
        }
    }

    fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    fn invalidate_user(&self, user: &UserId) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let owned = key.belongs_to(user);
            if owned {
                removed += 1;
            }
            !owned
        });
        removed
    }

    fn invalidate_all(&self) {
        self.entries.clear();
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
