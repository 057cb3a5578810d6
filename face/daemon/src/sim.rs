//! Simulated Sensors
//!
//! Stand-ins for the microphone ADC and accelerometer so the daemon can run
//! the full rig on a desktop. Both are driven by the same monotonic clock as
//! the rig and by their own seeded random sources.

use std::time::Duration;

use face_core::clock::uniform_secs;
use face_core::{
    deadline_passed, Acceleration, Accelerometer, AmplitudeSampler, Clock, HardwareError,
    STANDARD_GRAVITY,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// ADC mid-scale, the reading for silence
const MID_SCALE: i32 = 32_768;

/// Sample swing while silent
const HISS: i32 = 80;

/// Talking on/off for stretches of random length
#[derive(Debug)]
pub struct SimulatedMicrophone<C: Clock> {
    clock: C,
    rng: StdRng,
    speaking: bool,
    since: Duration,
    deadline: Duration,
    loudness: i32,
}

impl<C: Clock> SimulatedMicrophone<C> {
    /// Start silent
    pub fn new(clock: C, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let since = clock.now();
        let deadline = uniform_secs(&mut rng, 0.5, 3.0);
        Self {
            clock,
            rng,
            speaking: false,
            since,
            deadline,
            loudness: 0,
        }
    }

    fn roll(&mut self, now: Duration) {
        self.speaking = !self.speaking;
        self.since = now;
        if self.speaking {
            self.deadline = uniform_secs(&mut self.rng, 0.3, 1.5);
            self.loudness = self.rng.gen_range(8_000..32_000);
        } else {
            self.deadline = uniform_secs(&mut self.rng, 0.5, 3.0);
        }
        trace!(speaking = self.speaking, loudness = self.loudness, "Simulated speech toggled");
    }
}

impl<C: Clock> AmplitudeSampler for SimulatedMicrophone<C> {
    fn sample(&mut self) -> Result<u16, HardwareError> {
        let now = self.clock.now();
        if deadline_passed(now, self.since, self.deadline) {
            self.roll(now);
        }
        let swing = if self.speaking { self.loudness } else { HISS };
        let value = MID_SCALE + self.rng.gen_range(-swing..=swing);
        Ok(value.clamp(0, i32::from(u16::MAX)) as u16)
    }
}

/// Mostly upright, occasionally tipped along one axis
#[derive(Debug)]
pub struct SimulatedAccelerometer<C: Clock> {
    clock: C,
    rng: StdRng,
    tilt: Acceleration,
    since: Duration,
    deadline: Duration,
}

impl<C: Clock> SimulatedAccelerometer<C> {
    /// Start upright, gravity along Y
    pub fn new(clock: C, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let since = clock.now();
        let deadline = uniform_secs(&mut rng, 2.0, 6.0);
        Self {
            clock,
            rng,
            tilt: Self::upright(),
            since,
            deadline,
        }
    }

    fn upright() -> Acceleration {
        Acceleration::new(0.0, STANDARD_GRAVITY, 0.0)
    }

    fn roll(&mut self, now: Duration) {
        self.since = now;
        if self.tilt == Self::upright() {
            let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let g: f32 = sign * self.rng.gen_range(0.5..0.9);
            self.tilt = if self.rng.gen_bool(0.5) {
                Acceleration::from_g(g, 0.9, 0.0)
            } else {
                Acceleration::from_g(0.0, 0.9, g)
            };
            self.deadline = uniform_secs(&mut self.rng, 0.2, 1.5);
        } else {
            self.tilt = Self::upright();
            self.deadline = uniform_secs(&mut self.rng, 2.0, 8.0);
        }
        trace!(tilt = ?self.tilt, "Simulated tilt changed");
    }
}

impl<C: Clock> Accelerometer for SimulatedAccelerometer<C> {
    fn acceleration(&mut self) -> Result<Acceleration, HardwareError> {
        let now = self.clock.now();
        if deadline_passed(now, self.since, self.deadline) {
            self.roll(now);
        }
        Ok(self.tilt)
    }
}
