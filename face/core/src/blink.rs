//! Blink State Machine
//!
//! Cycles the eyelid overlay `Paused -> Closing -> Opening -> Paused` on
//! randomized timers. Each phase's deadline is derived from the previous one:
//!
//! | Entering  | Deadline                                  |
//! |-----------|-------------------------------------------|
//! | `Closing` | U(30ms, 70ms)                             |
//! | `Opening` | exactly 2x the closing deadline           |
//! | `Paused`  | U(3x the opening deadline, 5s), at most 5s |

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::clock::{deadline_passed, uniform_secs};

/// Shortest eyelid close
pub const CLOSING_MIN_SECS: f64 = 0.03;

/// Longest eyelid close
pub const CLOSING_MAX_SECS: f64 = 0.07;

/// Upper bound on the pause between blinks
pub const PAUSE_MAX_SECS: f64 = 5.0;

/// Sprite row of the fully closed eyelid
pub const EYELID_CLOSED_FRAME: u8 = 3;

/// Sprite row shown for the whole opening phase
///
/// The opening frame is held constant rather than interpolated across the
/// opening interval.
pub const EYELID_OPENING_FRAME: u8 = 1;

/// Sprite row of the open eye
pub const EYELID_OPEN_FRAME: u8 = 0;

/// Eyelid phase, with the numeric codes used by the rig's sprite sheets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum BlinkPhase {
    /// Eyes open between blinks
    Paused = 0,
    /// Eyelid coming down
    Closing = 1,
    /// Eyelid going back up
    Opening = 2,
}

impl BlinkPhase {
    /// The phase that follows this one
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Paused => Self::Closing,
            Self::Closing => Self::Opening,
            Self::Opening => Self::Paused,
        }
    }

    /// Eyelid sprite row for this phase
    #[must_use]
    pub fn eyelid_frame(self) -> u8 {
        match self {
            Self::Paused => EYELID_OPEN_FRAME,
            Self::Closing => EYELID_CLOSED_FRAME,
            Self::Opening => EYELID_OPENING_FRAME,
        }
    }
}

/// Eyelid timer and phase
#[derive(Clone, Debug, PartialEq)]
pub struct BlinkStateMachine {
    phase: BlinkPhase,
    deadline: Duration,
    last_transition: Duration,
}

impl BlinkStateMachine {
    /// Start mid-blink, eyes opening, as the rig does at power-on
    pub fn new<R: Rng + ?Sized>(now: Duration, rng: &mut R) -> Self {
        Self {
            phase: BlinkPhase::Opening,
            deadline: uniform_secs(rng, 0.25, 0.5),
            last_transition: now,
        }
    }

    /// Start in an explicit phase with an explicit deadline
    #[must_use]
    pub fn with_phase(phase: BlinkPhase, deadline: Duration, now: Duration) -> Self {
        Self {
            phase,
            deadline,
            last_transition: now,
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// How long the current phase lasts
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// When the current phase began
    #[must_use]
    pub fn last_transition(&self) -> Duration {
        self.last_transition
    }

    /// Eyelid sprite row for the current phase
    #[must_use]
    pub fn eyelid_frame(&self) -> u8 {
        self.phase.eyelid_frame()
    }

    /// Advance at most one phase if the current deadline has passed
    ///
    /// Returns `true` when the phase changed.
    pub fn update<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) -> bool {
        if !deadline_passed(now, self.last_transition, self.deadline) {
            return false;
        }

        self.last_transition = now;
        self.phase = self.phase.next();
        self.deadline = match self.phase {
            BlinkPhase::Closing => uniform_secs(rng, CLOSING_MIN_SECS, CLOSING_MAX_SECS),
            BlinkPhase::Opening => self.deadline * 2,
            BlinkPhase::Paused => {
                uniform_secs(rng, self.deadline.as_secs_f64() * 3.0, PAUSE_MAX_SECS)
            }
        };

        debug!(
            phase = ?self.phase,
            deadline_ms = self.deadline.as_millis() as u64,
            "Blink phase changed"
        );
        true
    }
}
