//! Time source used for cache expiry and token lifetimes

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of wall-clock time.
///
/// Expiry checks in the local store and token `expires_at` computation read
/// time through this trait so tests can move time forward without sleeping.
pub trait Clock: Send + Sync + Debug {
    /// Current time as Unix epoch milliseconds
    fn now_millis(&self) -> i64;

    /// Current time as Unix epoch seconds
    fn now_secs(&self) -> i64 {
        self.now_millis().div_euclid(1000)
    }
}

/// Deadline `ttl` after `now_millis`, saturating instead of wrapping for huge TTLs
pub fn deadline_millis(now_millis: i64, ttl: Duration) -> i64 {
    now_millis.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for deterministic tests
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_millis),
        }
    }

    /// Starts at 2024-01-01 00:00:00 UTC
    pub fn fixed() -> Self {
        Self::new(1_704_067_200_000)
    }

    pub fn advance(&self, by: Duration) {
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(deadline_millis(now, by))
            });
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
