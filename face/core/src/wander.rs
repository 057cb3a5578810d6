//! Pupil Wander
//!
//! The pupil rests at center, darts to a random point, holds there briefly,
//! then returns to center and rests again. Target ranges are already safe
//! for the 64x32 panel, so the offset is never clamped.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::clock::{deadline_passed, uniform_secs};

/// Horizontal target range in pixels
pub const WANDER_X_RANGE: Range<f32> = -5.5..5.6;

/// Vertical target range in pixels
pub const WANDER_Y_RANGE: Range<f32> = -0.5..5.6;

/// Hold time off-center, seconds
const HOLD_SECS: (f64, f64) = (0.01, 3.6);

/// Rest time at center, seconds
const REST_SECS: (f64, f64) = (0.5, 8.5);

/// Delay before the first move after power-on, seconds
const FIRST_MOVE_SECS: (f64, f64) = (1.0, 10.0);

/// Pupil position and wander timer
#[derive(Clone, Debug, PartialEq)]
pub struct EyeWanderStateMachine {
    x: f32,
    y: f32,
    active: bool,
    deadline: Duration,
    last_move: Duration,
}

impl EyeWanderStateMachine {
    /// Start centered, waiting U(1s, 10s) before the first move
    pub fn new<R: Rng + ?Sized>(now: Duration, rng: &mut R) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            active: false,
            deadline: uniform_secs(rng, FIRST_MOVE_SECS.0, FIRST_MOVE_SECS.1),
            last_move: now,
        }
    }

    /// Fractional pupil offset
    #[must_use]
    pub fn offset(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Whether the pupil is currently off-center
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time until the next toggle, measured from the last one
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Pupil offset truncated toward zero to whole pixels
    #[must_use]
    pub fn pixel_offset(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }

    /// Toggle between centered and off-center once the deadline has passed
    ///
    /// Returns `true` when the pupil moved.
    pub fn update<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) -> bool {
        if !deadline_passed(now, self.last_move, self.deadline) {
            return false;
        }

        self.last_move = now;
        if self.active {
            self.x = 0.0;
            self.y = 0.0;
            self.active = false;
            self.deadline = uniform_secs(rng, REST_SECS.0, REST_SECS.1);
        } else {
            self.x = rng.gen_range(WANDER_X_RANGE);
            self.y = rng.gen_range(WANDER_Y_RANGE);
            self.active = true;
            self.deadline = uniform_secs(rng, HOLD_SECS.0, HOLD_SECS.1);
        }

        debug!(
            active = self.active,
            x = self.x,
            y = self.y,
            deadline_ms = self.deadline.as_millis() as u64,
            "Pupil moved"
        );
        true
    }
}
