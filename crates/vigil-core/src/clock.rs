//! Time source abstraction.
//!
//! Operations that stamp wall-clock timestamps (detaching a resource,
//! completing a nemesis run, closing a test) take a [`Clock`] rather than
//! sampling the system time directly, so tests can supply a deterministic
//! instant.

use chrono::{DateTime, Utc};

/// A source of the current wall-clock time.
pub trait Clock {
    /// Return the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same instant.
///
/// Intended for tests that need deterministic timestamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Create a fixed clock at the given number of seconds past the epoch.
    ///
    /// # Panics
    ///
    /// Panics if `secs` is outside the representable timestamp range.
    #[must_use]
    pub fn at(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).expect("timestamp in range"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock::at(16000);
        assert_eq!(clock.now().timestamp(), 16000);
        assert_eq!(clock.now(), clock.now());
    }
}
