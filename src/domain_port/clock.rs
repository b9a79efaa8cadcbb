use chrono::{DateTime, Utc};

/// Source of "now" for expiry decisions, injectable so tests can move time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
