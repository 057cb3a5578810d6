//! Mouth Sync
//!
//! Turns a short window of raw microphone samples into one of four mouth
//! sprites. The filter is stateless: every tick measures a fresh window and
//! nothing carries over, so there is no smoothing or hysteresis.
//!
//! ```text
//! level = clamp( (peak_to_peak - noise_floor) * gain_numerator / gain_denominator , 0, 3 )
//! ```

use std::time::Duration;

use serde::Serialize;

use crate::clock::Clock;
use crate::hardware::{AmplitudeSampler, HardwareError};

/// Default sampling window (~35 Hz)
pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_millis(28);

/// Default peak-to-peak value treated as silence
pub const DEFAULT_NOISE_FLOOR: i32 = 250;

/// Default gain numerator
pub const DEFAULT_GAIN_NUMERATOR: i32 = 2;

/// Default gain denominator
pub const DEFAULT_GAIN_DENOMINATOR: i32 = 40383;

/// Discrete mouth openness, always in `0..=3`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MouthLevel(u8);

impl MouthLevel {
    /// Widest mouth sprite
    pub const MAX: u8 = 3;

    /// Closed mouth
    pub const CLOSED: Self = Self(0);

    /// Clamp a raw level into `0..=3`
    #[must_use]
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, i64::from(Self::MAX)) as u8)
    }

    /// Sprite row of this level
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Tuning for [`MouthSyncFilter`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouthConfig {
    /// How long to listen each tick
    pub sample_window: Duration,
    /// Peak-to-peak amplitude subtracted before scaling
    pub noise_floor: i32,
    /// Gain applied after noise removal, numerator
    pub gain_numerator: i32,
    /// Gain applied after noise removal, denominator (non-zero)
    pub gain_denominator: i32,
}

impl Default for MouthConfig {
    fn default() -> Self {
        Self {
            sample_window: DEFAULT_SAMPLE_WINDOW,
            noise_floor: DEFAULT_NOISE_FLOOR,
            gain_numerator: DEFAULT_GAIN_NUMERATOR,
            gain_denominator: DEFAULT_GAIN_DENOMINATOR,
        }
    }
}

/// Running min/max over one sampling window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleWindow {
    min: u16,
    max: u16,
    count: usize,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self {
            min: u16::MAX,
            max: 0,
            count: 0,
        }
    }
}

impl SampleWindow {
    /// Fold one sample into the window
    pub fn record(&mut self, sample: u16) {
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
        self.count += 1;
    }

    /// Number of samples seen
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Max minus min, or zero for an empty window
    #[must_use]
    pub fn peak_to_peak(&self) -> i32 {
        if self.count == 0 {
            0
        } else {
            i32::from(self.max - self.min)
        }
    }
}

/// Converts windowed microphone amplitude into a [`MouthLevel`]
#[derive(Clone, Copy, Debug, Default)]
pub struct MouthSyncFilter {
    config: MouthConfig,
}

impl MouthSyncFilter {
    /// Create a filter with the given tuning
    #[must_use]
    pub fn new(config: MouthConfig) -> Self {
        Self { config }
    }

    /// The filter's tuning
    #[must_use]
    pub fn config(&self) -> &MouthConfig {
        &self.config
    }

    /// Map a peak-to-peak amplitude to a mouth level
    ///
    /// Integer arithmetic truncates toward zero before clamping.
    #[must_use]
    pub fn level_for(&self, peak_to_peak: i32) -> MouthLevel {
        let denominator = i64::from(self.config.gain_denominator);
        if denominator == 0 {
            return MouthLevel::CLOSED;
        }
        let signal = i64::from(peak_to_peak) - i64::from(self.config.noise_floor);
        MouthLevel::clamped(signal * i64::from(self.config.gain_numerator) / denominator)
    }

    /// Sample for one full window and return min/max statistics
    ///
    /// Blocks until `sample_window` has elapsed on `clock`; there is no
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns the sampler's error, abandoning the window.
    pub fn measure_window<S, C>(
        &self,
        sampler: &mut S,
        clock: &C,
    ) -> Result<SampleWindow, HardwareError>
    where
        S: AmplitudeSampler + ?Sized,
        C: Clock + ?Sized,
    {
        let start = clock.now();
        let mut window = SampleWindow::default();
        while clock.now().saturating_sub(start) < self.config.sample_window {
            window.record(sampler.sample()?);
        }
        Ok(window)
    }

    /// Sample for one window and map the result to a mouth level
    ///
    /// # Errors
    ///
    /// Returns the sampler's error, abandoning the window.
    pub fn sample_window<S, C>(&self, sampler: &mut S, clock: &C) -> Result<MouthLevel, HardwareError>
    where
        S: AmplitudeSampler + ?Sized,
        C: Clock + ?Sized,
    {
        let window = self.measure_window(sampler, clock)?;
        let level = self.level_for(window.peak_to_peak());
        tracing::trace!(
            samples = window.count(),
            peak_to_peak = window.peak_to_peak(),
            level = level.get(),
            "Mouth window measured"
        );
        Ok(level)
    }
}
