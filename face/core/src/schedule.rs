//! Tick Schedule
//!
//! Fixed-period tick primitive. Frame cadence is owned here rather than by
//! the length of the microphone sampling window; the default rate keeps the
//! rig's ~35 Hz pacing, with the 28ms sampling window fitting inside one
//! period.

use std::time::Duration;

/// Default tick rate
pub const DEFAULT_RATE_HZ: f64 = 35.0;

/// Fixed-period tick deadlines
///
/// Async drivers take [`TickSchedule::period`] and hand it to their timer;
/// synchronous drivers (replay harnesses, tests) call [`TickSchedule::poll`]
/// with the current clock reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickSchedule {
    period: Duration,
    next_due: Duration,
}

impl TickSchedule {
    /// Schedule ticks every `period`, the first one due immediately
    #[must_use]
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            next_due: Duration::ZERO,
        }
    }

    /// Schedule ticks at `rate_hz`
    ///
    /// Rates rejected by [`TickSchedule::try_from_rate`] fall back to
    /// [`DEFAULT_RATE_HZ`].
    #[must_use]
    pub fn from_rate(rate_hz: f64) -> Self {
        Self::try_from_rate(rate_hz).unwrap_or_default()
    }

    /// Schedule ticks at `rate_hz`, if its period is representable
    ///
    /// Returns `None` for non-positive or non-finite rates, for rates so low
    /// the period overflows a [`Duration`], and for rates so high the period
    /// rounds to zero.
    #[must_use]
    pub fn try_from_rate(rate_hz: f64) -> Option<Self> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / rate_hz)
            .ok()
            .filter(|period| !period.is_zero())
            .map(Self::every)
    }

    /// Time between ticks
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks per second
    #[must_use]
    pub fn rate_hz(&self) -> f64 {
        1.0 / self.period.as_secs_f64()
    }

    /// Whether a sampling window of this length fits inside one period
    #[must_use]
    pub fn fits_window(&self, window: Duration) -> bool {
        window <= self.period
    }

    /// Start the schedule at `now`
    pub fn start_at(&mut self, now: Duration) {
        self.next_due = now;
    }

    /// When the next tick is due
    #[must_use]
    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Time remaining until the next tick
    #[must_use]
    pub fn until_next(&self, now: Duration) -> Duration {
        self.next_due.saturating_sub(now)
    }

    /// Returns `true` if a tick is due at `now` and schedules the next one
    ///
    /// Missed ticks are skipped, not replayed: the next deadline is the first
    /// period boundary after `now`.
    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_due {
            return false;
        }
        if self.period.is_zero() {
            self.next_due = now;
            return true;
        }

        let behind = now - self.next_due;
        let missed = behind.as_nanos() / self.period.as_nanos();
        let skipped = u32::try_from(missed + 1).unwrap_or(u32::MAX);
        self.next_due += self.period * skipped;
        true
    }
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self::every(Duration::from_secs_f64(1.0 / DEFAULT_RATE_HZ))
    }
}
