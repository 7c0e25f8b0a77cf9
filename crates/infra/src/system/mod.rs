use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

// Time sits behind a trait so tests can pin the clock instead of sleeping.
pub trait ISys: Send + Sync {
    /// The current timestamp in millis
    fn get_timestamp_millis(&self) -> i64;
}

/// Wall clock, used outside of tests
pub struct RealSys {}
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a chosen timestamp. Tests advance it explicitly.
pub struct FrozenSys {
    now: AtomicI64,
}

impl FrozenSys {
    pub fn at(timestamp_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(timestamp_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl ISys for FrozenSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
