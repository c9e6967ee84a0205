use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds since the UNIX epoch.
pub type UnixSeconds = u64;

/// Source of the current time for time-gated transitions.
pub trait Clock: Send + Sync {
    /// Current time in seconds. Never lower than a value previously returned.
    fn now(&self) -> UnixSeconds;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> UnixSeconds {
        (**self).now()
    }
}

fn system_time_secs() -> UnixSeconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Wall clock clamped to be non-decreasing.
///
/// A system clock step backwards is absorbed by repeating the last reported
/// second until wall time catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_secs: Mutex<UnixSeconds>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last_secs: Mutex::new(system_time_secs()),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> UnixSeconds {
        let mut last = self.last_secs.lock();
        let candidate = system_time_secs();
        if candidate > *last {
            *last = candidate;
        }
        *last
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(start: UnixSeconds) -> Self {
        Self {
            secs: AtomicU64::new(start),
        }
    }

    /// Move the clock forward by `secs` seconds, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) -> UnixSeconds {
        let mut current = self.secs.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(secs);
            match self
                .secs
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Jump to `target`. Earlier targets are ignored; returns the resulting time.
    pub fn set(&self, target: UnixSeconds) -> UnixSeconds {
        let previous = self.secs.fetch_max(target, Ordering::SeqCst);
        previous.max(target)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixSeconds {
        self.secs.load(Ordering::SeqCst)
    }
}
