//! Time source used for validity-window checks.

use std::sync::atomic::{AtomicI64, Ordering};

/// Seconds since the unix epoch. Campaign windows are stored in this unit.
pub type UnixSeconds = i64;

/// Source of "now".
///
/// Resolutions read the clock once and pass the instant down, so every window
/// check inside one resolution agrees on the same second.
pub trait Clock: Send + Sync {
    fn now(&self) -> UnixSeconds;
}

impl<C> Clock for std::sync::Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> UnixSeconds {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixSeconds {
        chrono::Utc::now().timestamp()
    }
}

/// Settable clock for tests and benchmarks.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn at(now: UnixSeconds) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: UnixSeconds) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> UnixSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
