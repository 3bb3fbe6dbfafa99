//! Nullable clock — deterministic time for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use teller_store::Clock;
use teller_types::Timestamp;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Atomic so it can be shared with
/// a store as `Arc<dyn Clock>` while the test keeps a handle to steer it.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }
}
