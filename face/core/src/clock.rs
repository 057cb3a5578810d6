//! Monotonic Time Sources
//!
//! Every timer in the rig compares `now - last_event > deadline`, where all
//! three values are [`Duration`]s measured from the clock's epoch. The epoch
//! is fixed when the clock is created and never wraps within a session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

/// A monotonically non-decreasing time source
pub trait Clock {
    /// Time elapsed since the clock's epoch
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Wall clock backed by [`Instant`], with its epoch at construction
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Start a clock whose epoch is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Manually driven clock for replay and tests
///
/// Clones share the same reading, so a test can keep one handle and advance
/// time while the rig reads through another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock reading `start`
    #[must_use]
    pub fn starting_at(start: Duration) -> Self {
        let clock = Self::new();
        clock.set(start);
        clock
    }

    /// Jump to an absolute reading
    ///
    /// Readings earlier than the current one are ignored so the clock stays
    /// monotonic.
    pub fn set(&self, at: Duration) {
        let nanos = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_max(nanos, Ordering::SeqCst);
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let nanos = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(nanos))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// `true` once more than `deadline` has passed since `since`
///
/// Uses saturating subtraction, so a reading earlier than `since` counts as
/// no time elapsed.
#[must_use]
pub fn deadline_passed(now: Duration, since: Duration, deadline: Duration) -> bool {
    now.saturating_sub(since) > deadline
}

/// Draw a duration uniformly from `[low_secs, high_secs)`
///
/// Collapses to `high_secs` when the range is empty.
pub fn uniform_secs<R: Rng + ?Sized>(rng: &mut R, low_secs: f64, high_secs: f64) -> Duration {
    if low_secs >= high_secs {
        return Duration::from_secs_f64(high_secs.max(0.0));
    }
    Duration::from_secs_f64(rng.gen_range(low_secs..high_secs))
}
