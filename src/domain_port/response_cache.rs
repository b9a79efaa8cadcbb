use crate::domain_model::UserId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Whose response an entry holds. Requests without a session share the
/// anonymous scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheScope {
    User(UserId),
    Anonymous,
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::User(id) => write!(f, "{}", id),
            CacheScope::Anonymous => f.write_str("anonymous"),
        }
    }
}

impl From<Option<UserId>> for CacheScope {
    fn from(user: Option<UserId>) -> Self {
        user.map(CacheScope::User).unwrap_or(CacheScope::Anonymous)
    }
}

/// `{userId|anonymous}:{path+query}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: CacheScope,
    pub path: String,
}

impl CacheKey {
    pub fn new(scope: CacheScope, path: impl Into<String>) -> Self {
        CacheKey {
            scope,
            path: path.into(),
        }
    }

    pub fn for_user(user: &UserId, path: impl Into<String>) -> Self {
        Self::new(CacheScope::User(user.clone()), path)
    }

    pub fn belongs_to(&self, user: &UserId) -> bool {
        matches!(&self.scope, CacheScope::User(owner) if owner == user)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.path)
    }
}

/// Serialized response body. Entries are immutable once stored, so readers
/// share them without copying.
pub type CachedPayload = Arc<str>;

pub trait ResponseCache: Send + Sync {
    /// Returns the payload unless it is absent or `now >= expires_at`.
    fn get(&self, key: &CacheKey) -> Option<CachedPayload>;
    /// Inserts or overwrites unconditionally.
    fn put(&self, key: CacheKey, payload: CachedPayload, ttl: Duration);
    fn invalidate(&self, key: &CacheKey) -> bool;
    /// Drops every entry owned by `user`, returning how many were removed.
    fn invalidate_user(&self, user: &UserId) -> usize;
    fn invalidate_all(&self);
    /// Physically removes expired entries.
    fn purge_expired(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
