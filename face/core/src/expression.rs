//! Expression State Machine
//!
//! Tilting the rig past a threshold on either of two accelerometer axes
//! picks one of four poses and raises its intensity one step per tick while
//! held. Once both axes are back inside the threshold, intensity decays one
//! step per decay period; reaching zero returns the face to neutral.
//!
//! Axis-A is evaluated before axis-B every tick, so when both axes trigger
//! at once, axis-B's pose wins.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::deadline_passed;
use crate::hardware::{Acceleration, STANDARD_GRAVITY};

/// Default trigger threshold in g
pub const DEFAULT_THRESHOLD_G: f32 = 0.4;

/// Default decay period (one intensity step per period)
pub const DEFAULT_DECAY: Duration = Duration::from_secs(1);

/// Tilt-triggered pose, with its column in the expression sprite sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pose {
    /// Axis-A tilted positive
    AxisAPositive = 0,
    /// Axis-A tilted negative
    AxisANegative = 1,
    /// Axis-B tilted negative
    AxisBNegative = 2,
    /// Axis-B tilted positive
    AxisBPositive = 3,
}

impl Pose {
    /// Column index in the expression sprite sheet
    #[must_use]
    pub fn column(self) -> u8 {
        self as u8
    }
}

/// Expression strength, always in `0..=3`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Intensity(u8);

impl Intensity {
    /// Strongest expression row
    pub const MAX: u8 = 3;

    /// Neutral
    pub const ZERO: Self = Self(0);

    /// Clamp a raw value into `0..=3`
    #[must_use]
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, i64::from(Self::MAX)) as u8)
    }

    /// Sprite row of this intensity
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Whether this is the neutral intensity
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// One step stronger, capped at [`Intensity::MAX`]
    #[must_use]
    pub fn raised(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }

    /// One step weaker, floored at zero
    #[must_use]
    pub fn lowered(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

/// A physical accelerometer axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelAxis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl AccelAxis {
    /// Read this axis from a sample
    #[must_use]
    pub fn pick(self, sample: &Acceleration) -> f32 {
        match self {
            Self::X => sample.x,
            Self::Y => sample.y,
            Self::Z => sample.z,
        }
    }
}

impl std::fmt::Display for AccelAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// Tuning for [`ExpressionStateMachine`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpressionConfig {
    /// Tilt magnitude (g) beyond which a pose triggers
    pub threshold_g: f32,
    /// Neutral time per intensity step of decay
    pub decay: Duration,
    /// Physical axis feeding axis-A
    pub axis_a: AccelAxis,
    /// Physical axis feeding axis-B
    pub axis_b: AccelAxis,
    /// m/s² per g
    pub gravity: f32,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            threshold_g: DEFAULT_THRESHOLD_G,
            decay: DEFAULT_DECAY,
            axis_a: AccelAxis::X,
            axis_b: AccelAxis::Z,
            gravity: STANDARD_GRAVITY,
        }
    }
}

/// Tilt on the two expression axes, in g
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TiltReading {
    /// Axis-A tilt
    pub axis_a: f32,
    /// Axis-B tilt
    pub axis_b: f32,
}

impl TiltReading {
    /// Tilt from two readings already in g
    #[must_use]
    pub const fn new(axis_a: f32, axis_b: f32) -> Self {
        Self { axis_a, axis_b }
    }

    /// Select and normalize the configured axes of a raw sample
    #[must_use]
    pub fn from_acceleration(sample: &Acceleration, config: &ExpressionConfig) -> Self {
        Self {
            axis_a: config.axis_a.pick(sample) / config.gravity,
            axis_b: config.axis_b.pick(sample) / config.gravity,
        }
    }
}

/// Pose and intensity driven by tilt
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionStateMachine {
    config: ExpressionConfig,
    pose: Option<Pose>,
    intensity: Intensity,
    last_event: Duration,
}

impl ExpressionStateMachine {
    /// Start neutral
    #[must_use]
    pub fn new(config: ExpressionConfig, now: Duration) -> Self {
        Self {
            config,
            pose: None,
            intensity: Intensity::ZERO,
            last_event: now,
        }
    }

    /// Active pose, `None` when neutral
    #[must_use]
    pub fn pose(&self) -> Option<Pose> {
        self.pose
    }

    /// Current intensity
    #[must_use]
    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// Time of the last trigger or decay step
    #[must_use]
    pub fn last_event(&self) -> Duration {
        self.last_event
    }

    /// Expression sprite column; neutral shares column 0
    #[must_use]
    pub fn column(&self) -> u8 {
        self.pose.map_or(0, Pose::column)
    }

    /// The machine's tuning
    #[must_use]
    pub fn config(&self) -> &ExpressionConfig {
        &self.config
    }

    /// Evaluate axis-A then axis-B for this tick
    ///
    /// Returns `true` when pose or intensity changed.
    pub fn update(&mut self, now: Duration, tilt: TiltReading) -> bool {
        let before = (self.pose, self.intensity);

        self.apply_axis(now, tilt.axis_a, Pose::AxisAPositive, Pose::AxisANegative);
        self.apply_axis(now, tilt.axis_b, Pose::AxisBPositive, Pose::AxisBNegative);

        let changed = before != (self.pose, self.intensity);
        if changed {
            debug!(
                pose = ?self.pose,
                intensity = self.intensity.get(),
                "Expression changed"
            );
        }
        changed
    }

    fn apply_axis(&mut self, now: Duration, reading: f32, positive: Pose, negative: Pose) {
        let triggered = if reading > self.config.threshold_g {
            Some(positive)
        } else if reading < -self.config.threshold_g {
            Some(negative)
        } else {
            None
        };

        match triggered {
            Some(pose) => {
                self.pose = Some(pose);
                self.last_event = now;
                self.intensity = self.intensity.raised();
            }
            None => {
                if self.intensity.is_zero()
                    || !deadline_passed(now, self.last_event, self.config.decay)
                {
                    return;
                }
                // A decay step restarts the decay timer
                self.last_event = now;
                self.intensity = self.intensity.lowered();
                if self.intensity.is_zero() {
                    self.pose = None;
                }
            }
        }
    }
}
