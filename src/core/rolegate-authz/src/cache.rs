//! Role cache keyed by principal name.
//!
//! A cached [`User`] is frozen: it is shared as `Arc<User>` and never
//! handed to a backend again. It is resolved anew once it expires or is
//! invalidated.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::User;

/// Cache of resolved users.
pub trait RoleCache: Send + Sync {
    /// Returns the cached user if present and not expired.
    fn get(&self, principal: &str) -> Option<Arc<User>>;

    /// Stores a resolved user and returns the frozen record.
    fn put(&self, user: User) -> Arc<User>;

    /// Drops the entry for `principal`.
    fn invalidate(&self, principal: &str);

    /// Drops every entry.
    fn invalidate_all(&self);

    /// Number of stored entries, including expired ones not yet evicted.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Longest TTL accepted by configuration.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    user: Arc<User>,
    /// `None` when `now + ttl` is not representable; such entries never expire.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Thread-safe in-memory cache with a per-entry TTL.
#[derive(Debug, Clone)]
pub struct InMemoryRoleCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl InMemoryRoleCache {
    /// Creates a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_entries: None,
        }
    }

    /// Bounds the number of entries.
    ///
    /// When full, expired entries are evicted first, then the entry closest
    /// to expiry.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    /// Entry TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Removes all expired entries.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, entry| entry.is_live(now));
    }
}

impl RoleCache for InMemoryRoleCache {
    fn get(&self, principal: &str) -> Option<Arc<User>> {
        let now = Instant::now();
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(principal)
            .filter(|entry| entry.is_live(now))
            .map(|entry| Arc::clone(&entry.user))
    }

    fn put(&self, user: User) -> Arc<User> {
        let user = Arc::new(user);
        let now = Instant::now();
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(max) = self.max_entries {
            if map.len() >= max && !map.contains_key(user.name()) {
                map.retain(|_, entry| entry.is_live(now));
            }
            if map.len() >= max && !map.contains_key(user.name()) {
                let oldest = map
                    .iter()
                    .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    map.remove(&key);
                }
            }
        }

        map.insert(
            user.name().to_string(),
            CacheEntry {
                user: Arc::clone(&user),
                expires_at: now.checked_add(self.ttl),
            },
        );
        user
    }

    fn invalidate(&self, principal: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(principal);
    }

    fn invalidate_all(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Cache that stores nothing; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl RoleCache for NoCache {
    fn get(&self, _principal: &str) -> Option<Arc<User>> {
        None
    }

    fn put(&self, user: User) -> Arc<User> {
        Arc::new(user)
    }

    fn invalidate(&self, _principal: &str) {}

    fn invalidate_all(&self) {}

    fn len(&self) -> usize {
        0
    }
}
