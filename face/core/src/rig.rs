//! Face Rig
//!
//! One tick of the face: read the mouth window, read tilt, advance the
//! blink, wander and expression machines, then compose a [`LayerFrame`].
//! All state lives in [`AnimationState`], owned by the rig and threaded
//! through each tick, so two rigs built from the same seed and fed the same
//! sensor readings produce identical frames.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::blink::BlinkStateMachine;
use crate::clock::Clock;
use crate::compositor::{Compositor, FaceOutputs, LayerFrame};
use crate::config::FaceConfig;
use crate::expression::{ExpressionConfig, ExpressionStateMachine, TiltReading};
use crate::hardware::{Acceleration, Accelerometer, AmplitudeSampler, HardwareError};
use crate::mouth::{MouthLevel, MouthSyncFilter};
use crate::wander::EyeWanderStateMachine;

/// State carried from one tick to the next
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    /// Eyelid timer
    pub blink: BlinkStateMachine,
    /// Pupil timer and offset
    pub wander: EyeWanderStateMachine,
    /// Pose and intensity
    pub expression: ExpressionStateMachine,
    /// Mouth level from the most recent window
    pub mouth: MouthLevel,
}

impl AnimationState {
    /// Power-on state at `now`
    pub fn new<R: Rng + ?Sized>(now: Duration, rng: &mut R, expression: ExpressionConfig) -> Self {
        Self {
            blink: BlinkStateMachine::new(now, rng),
            wander: EyeWanderStateMachine::new(now, rng),
            expression: ExpressionStateMachine::new(expression, now),
            mouth: MouthLevel::CLOSED,
        }
    }

    /// Advance every machine to `now`
    ///
    /// Returns `true` if anything visible changed.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        mouth: MouthLevel,
        tilt: TiltReading,
        rng: &mut R,
    ) -> bool {
        let blinked = self.blink.update(now, rng);
        let wandered = self.wander.update(now, rng);
        let expressed = self.expression.update(now, tilt);
        let spoke = self.mouth != mouth;
        self.mouth = mouth;
        blinked || wandered || expressed || spoke
    }

    /// Sprite selections for the compositor
    #[must_use]
    pub fn outputs(&self) -> FaceOutputs {
        FaceOutputs {
            pupil: self.wander.pixel_offset(),
            eyelid_frame: self.blink.eyelid_frame(),
            mouth: self.mouth,
            expression_column: self.expression.column(),
            intensity: self.expression.intensity(),
        }
    }
}

/// The whole face: state machines, mouth filter and compositor
#[derive(Debug)]
pub struct FaceRig<R: Rng = StdRng> {
    state: AnimationState,
    rng: R,
    mouth: MouthSyncFilter,
    compositor: Compositor,
    ticks: u64,
}

impl FaceRig<StdRng> {
    /// Build a rig from resolved configuration
    ///
    /// Uses the configured seed when present, OS entropy otherwise.
    #[must_use]
    pub fn from_config(config: &FaceConfig, now: Duration) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                info!(seed, "Seeding face rig");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, now, rng)
    }

    /// Build a rig with a fixed seed, ignoring any configured one
    #[must_use]
    pub fn with_seed(config: &FaceConfig, now: Duration, seed: u64) -> Self {
        Self::with_rng(config, now, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FaceRig<R> {
    /// Build a rig around a caller-supplied random source
    pub fn with_rng(config: &FaceConfig, now: Duration, mut rng: R) -> Self {
        let state = AnimationState::new(now, &mut rng, config.expression);
        Self {
            state,
            rng,
            mouth: MouthSyncFilter::new(config.mouth),
            compositor: Compositor::new(config.atlas.clone()),
            ticks: 0,
        }
    }

    /// Current animation state
    #[must_use]
    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Number of ticks run so far
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The compositor, for atlas access
    #[must_use]
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Frame to draw before the first tick
    #[must_use]
    pub fn initial_frame(&self) -> LayerFrame {
        self.compositor.initial_frame()
    }

    /// Advance with sensor readings already in hand
    pub fn step(&mut self, now: Duration, mouth: MouthLevel, sample: Acceleration) -> LayerFrame {
        let tilt = TiltReading::from_acceleration(&sample, self.state.expression.config());
        if self.state.advance(now, mouth, tilt, &mut self.rng) {
            debug!(tick = self.ticks, outputs = ?self.state.outputs(), "Face changed");
        }
        self.ticks += 1;
        self.compositor.compose(&self.state.outputs())
    }

    /// Run one full tick against the hardware seams
    ///
    /// The tick time is read before the mouth window, so timers see the
    /// start of the tick.
    ///
    /// # Errors
    ///
    /// Returns the first sensor error; the state is left untouched.
    pub fn tick<C, M, A>(
        &mut self,
        clock: &C,
        mic: &mut M,
        accel: &mut A,
    ) -> Result<LayerFrame, HardwareError>
    where
        C: Clock + ?Sized,
        M: AmplitudeSampler + ?Sized,
        A: Accelerometer + ?Sized,
    {
        let now = clock.now();
        let mouth = self.mouth.sample_window(mic, clock)?;
        let sample = accel.acceleration()?;
        Ok(self.step(now, mouth, sample))
    }
}
