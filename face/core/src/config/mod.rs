//! TOML Configuration File Support
//!
//! Centralized configuration loading for the face rig, supporting a TOML
//! file at `~/.config/matrix-face/face.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`FACE_SEED`, `FACE_RATE_HZ`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [atlas]
//! frame_width = 64
//! frame_height = 32
//! transparent = [255, 0, 255]
//! sprites_dir = "/opt/face/sprites"
//!
//! [atlas.expression]
//! bitmap = "exp.bmp"
//! anchor = [0, 32]
//!
//! [mouth]
//! sample_window_ms = 28
//! noise_floor = 250
//! gain_numerator = 2
//! gain_denominator = 40383
//!
//! [expression]
//! threshold_g = 0.4
//! decay_secs = 1.0
//! axis_a = "x"
//! axis_b = "z"
//!
//! [schedule]
//! rate_hz = 35.0
//!
//! [rig]
//! seed = 7
//! ```

mod atlas;

pub use atlas::{
    Anchor, AtlasConfig, LayerSpec, Rgb, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_TRANSPARENT,
};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compositor::LayerId;
use crate::expression::{AccelAxis, ExpressionConfig};
use crate::mouth::MouthConfig;
use crate::schedule::{TickSchedule, DEFAULT_RATE_HZ};

/// Environment variable overriding the RNG seed
pub const ENV_SEED: &str = "FACE_SEED";

/// Environment variable overriding the tick rate
pub const ENV_RATE_HZ: &str = "FACE_RATE_HZ";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// One layer's entry in the `[atlas]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerToml {
    /// Bitmap file
    pub bitmap: Option<PathBuf>,

    /// Base anchor as `[x, y]`
    pub anchor: Option<[i32; 2]>,
}

/// Atlas section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasToml {
    /// Sprite frame width in pixels
    pub frame_width: Option<i32>,

    /// Sprite frame height in pixels
    pub frame_height: Option<i32>,

    /// Transparency key as `[r, g, b]`
    pub transparent: Option<[u8; 3]>,

    /// Directory holding the bitmaps
    pub sprites_dir: Option<PathBuf>,

    /// Opaque face background
    pub base: LayerToml,

    /// Pupil layer
    pub pupil: LayerToml,

    /// Eyelid overlay
    pub eyes: LayerToml,

    /// Mouth overlay
    pub mouth: LayerToml,

    /// Expression overlay
    pub expression: LayerToml,
}

impl AtlasToml {
    fn layer(&self, layer: LayerId) -> &LayerToml {
        match layer {
            LayerId::Base => &self.base,
            LayerId::Pupil => &self.pupil,
            LayerId::Eyes => &self.eyes,
            LayerId::Mouth => &self.mouth,
            LayerId::Expression => &self.expression,
        }
    }
}

/// Mouth sync section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MouthToml {
    /// Sampling window in milliseconds
    pub sample_window_ms: Option<u64>,

    /// Peak-to-peak amplitude treated as silence
    pub noise_floor: Option<i32>,

    /// Gain numerator
    pub gain_numerator: Option<i32>,

    /// Gain denominator
    pub gain_denominator: Option<i32>,
}

/// Expression section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionToml {
    /// Trigger threshold in g
    pub threshold_g: Option<f32>,

    /// Seconds of neutral tilt per decay step
    pub decay_secs: Option<f64>,

    /// Physical axis feeding axis-A
    pub axis_a: Option<AccelAxis>,

    /// Physical axis feeding axis-B
    pub axis_b: Option<AccelAxis>,

    /// m/s² per g
    pub gravity: Option<f32>,
}

/// Schedule section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleToml {
    /// Ticks per second
    pub rate_hz: Option<f64>,
}

/// Rig section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RigToml {
    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceToml {
    /// Sprite atlas section
    pub atlas: AtlasToml,

    /// Mouth sync section
    pub mouth: MouthToml,

    /// Expression section
    pub expression: ExpressionToml,

    /// Tick schedule section
    pub schedule: ScheduleToml,

    /// Rig section
    pub rig: RigToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for the face rig
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct FaceConfig {
    /// Sprite atlas layout
    pub atlas: AtlasConfig,

    /// Mouth sync tuning
    pub mouth: MouthConfig,

    /// Expression tuning
    pub expression: ExpressionConfig,

    /// Ticks per second
    pub rate_hz: f64,

    /// RNG seed; `None` draws from entropy
    pub seed: Option<u64>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            atlas: AtlasConfig::default(),
            mouth: MouthConfig::default(),
            expression: ExpressionConfig::default(),
            rate_hz: DEFAULT_RATE_HZ,
            seed: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl FaceConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Tick schedule for the configured rate
    #[must_use]
    pub fn schedule(&self) -> TickSchedule {
        TickSchedule::from_rate(self.rate_hz)
    }

    /// Check values that would break the rig's arithmetic
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atlas.frame_width <= 0 || self.atlas.frame_height <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "sprite frame must be non-empty, got {}x{}",
                self.atlas.frame_width, self.atlas.frame_height
            )));
        }
        if self.mouth.gain_denominator == 0 {
            return Err(ConfigError::ValidationError(
                "mouth.gain_denominator must be non-zero".to_string(),
            ));
        }
        let Some(schedule) = TickSchedule::try_from_rate(self.rate_hz) else {
            return Err(ConfigError::ValidationError(format!(
                "schedule.rate_hz must give a positive, representable tick period, got {}",
                self.rate_hz
            )));
        };
        if !(self.expression.threshold_g.is_finite() && self.expression.threshold_g > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "expression.threshold_g must be positive, got {}",
                self.expression.threshold_g
            )));
        }
        if !(self.expression.gravity.is_finite() && self.expression.gravity > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "expression.gravity must be positive, got {}",
                self.expression.gravity
            )));
        }
        if self.expression.axis_a == self.expression.axis_b {
            return Err(ConfigError::ValidationError(format!(
                "expression axes must differ, both are {}",
                self.expression.axis_a
            )));
        }

        if !schedule.fits_window(self.mouth.sample_window) {
            tracing::warn!(
                window_ms = self.mouth.sample_window.as_millis() as u64,
                period_ms = schedule.period().as_millis() as u64,
                "Mouth sampling window is longer than the tick period; ticks will run late"
            );
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/matrix-face/face.toml` or
/// `~/.config/matrix-face/face.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("matrix-face").join("face.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resolved values fail validation. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<FaceConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resolved values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<FaceConfig, ConfigError> {
    let mut config = FaceConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: FaceToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut FaceConfig, toml: &FaceToml) -> Result<(), ConfigError> {
    // Atlas
    if let Some(width) = toml.atlas.frame_width {
        config.atlas.frame_width = width;
    }
    if let Some(height) = toml.atlas.frame_height {
        config.atlas.frame_height = height;
    }
    if let Some([r, g, b]) = toml.atlas.transparent {
        config.atlas.transparent = Rgb(r, g, b);
    }
    if let Some(ref dir) = toml.atlas.sprites_dir {
        config.atlas.set_sprites_dir(dir);
    }
    for layer in LayerId::ALL {
        let entry = toml.atlas.layer(layer);
        let spec = config.atlas.layer_mut(layer);
        if let Some(ref bitmap) = entry.bitmap {
            spec.bitmap = bitmap.clone();
        }
        if let Some(anchor) = entry.anchor {
            spec.anchor = Anchor::from(anchor);
        }
    }

    // Mouth
    if let Some(ms) = toml.mouth.sample_window_ms {
        config.mouth.sample_window = Duration::from_millis(ms);
    }
    if let Some(floor) = toml.mouth.noise_floor {
        config.mouth.noise_floor = floor;
    }
    if let Some(numerator) = toml.mouth.gain_numerator {
        config.mouth.gain_numerator = numerator;
    }
    if let Some(denominator) = toml.mouth.gain_denominator {
        config.mouth.gain_denominator = denominator;
    }

    // Expression
    if let Some(threshold) = toml.expression.threshold_g {
        config.expression.threshold_g = threshold;
    }
    if let Some(secs) = toml.expression.decay_secs {
        config.expression.decay = Duration::try_from_secs_f64(secs).map_err(|e| {
            ConfigError::ValidationError(format!(
                "expression.decay_secs must be a non-negative duration, got {secs}: {e}"
            ))
        })?;
    }
    if let Some(axis) = toml.expression.axis_a {
        config.expression.axis_a = axis;
    }
    if let Some(axis) = toml.expression.axis_b {
        config.expression.axis_b = axis;
    }
    if let Some(gravity) = toml.expression.gravity {
        config.expression.gravity = gravity;
    }

    // Schedule and rig
    if let Some(rate) = toml.schedule.rate_hz {
        config.rate_hz = rate;
    }
    if toml.rig.seed.is_some() {
        config.seed = toml.rig.seed;
    }
    Ok(())
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut FaceConfig) {
    if let Ok(seed) = std::env::var(ENV_SEED) {
        if let Ok(s) = seed.parse::<u64>() {
            config.seed = Some(s);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(rate) = std::env::var(ENV_RATE_HZ) {
        if let Ok(r) = rate.parse::<f64>() {
            config.rate_hz = r;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// RNG seed override
    pub seed: Option<u64>,

    /// Tick rate override
    pub rate_hz: Option<f64>,

    /// Sprites directory override
    pub sprites_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set RNG seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set tick rate override
    #[must_use]
    pub fn with_rate_hz(mut self, rate_hz: f64) -> Self {
        self.rate_hz = Some(rate_hz);
        self
    }

    /// Set sprites directory override
    #[must_use]
    pub fn with_sprites_dir(mut self, dir: PathBuf) -> Self {
        self.sprites_dir = Some(dir);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override makes the
    /// configuration invalid.
    pub fn apply(&self, config: &mut FaceConfig) -> Result<(), ConfigError> {
        if self.seed.is_some() || self.rate_hz.is_some() || self.sprites_dir.is_some() {
            config.source = ConfigSource::Cli;
        }

        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(rate) = self.rate_hz {
            config.rate_hz = rate;
        }
        if let Some(ref dir) = self.sprites_dir {
            config.atlas.set_sprites_dir(dir);
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
