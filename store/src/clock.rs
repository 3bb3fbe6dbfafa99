//! Clock abstraction.
//!
//! Stores stamp records through an injected clock so tests can pin time.

use teller_types::Timestamp;

/// Source of the current time for record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Production clock: reads the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(a <= b);
    }
}
