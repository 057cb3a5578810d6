//! Hardware Seams
//!
//! The rig never talks to drivers directly. The microphone ADC, the
//! accelerometer and the LED matrix renderer are reached through the traits
//! in this module, so the same tick logic runs against real drivers, the
//! daemon's simulators, or scripted test doubles.

use thiserror::Error;

use crate::compositor::LayerFrame;
use crate::config::AtlasConfig;

/// Standard gravity in m/s², used to turn accelerometer output into g
pub const STANDARD_GRAVITY: f32 = 9.806;

/// Errors raised by sensor drivers and renderers
///
/// The rig has no retry policy: the first error ends the tick loop.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// A sensor read failed
    #[error("Sensor read failed ({sensor}): {message}")]
    Sensor {
        /// Which sensor failed
        sensor: &'static str,
        /// Driver-supplied detail
        message: String,
    },

    /// The renderer rejected a frame
    #[error("Render failed: {0}")]
    Render(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Build a sensor error
    pub fn sensor(sensor: &'static str, message: impl Into<String>) -> Self {
        Self::Sensor {
            sensor,
            message: message.into(),
        }
    }
}

/// A three-axis acceleration sample in m/s²
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Acceleration {
    /// X axis
    pub x: f32,
    /// Y axis
    pub y: f32,
    /// Z axis
    pub z: f32,
}

impl Acceleration {
    /// Create a sample from three axis readings
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build a sample from readings already expressed in g
    #[must_use]
    pub fn from_g(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: x * STANDARD_GRAVITY,
            y: y * STANDARD_GRAVITY,
            z: z * STANDARD_GRAVITY,
        }
    }
}

/// Instantaneous microphone amplitude source
pub trait AmplitudeSampler {
    /// Read one raw amplitude value
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Sensor`] when the ADC read fails.
    fn sample(&mut self) -> Result<u16, HardwareError>;
}

/// Three-axis accelerometer
pub trait Accelerometer {
    /// Read one acceleration sample in m/s²
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Sensor`] when the bus read fails.
    fn acceleration(&mut self) -> Result<Acceleration, HardwareError>;
}

/// Consumer of layer placements
pub trait Renderer {
    /// Load bitmaps and transparency keys before the first frame
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Io`] when a bitmap cannot be loaded.
    fn load_atlas(&mut self, atlas: &AtlasConfig) -> Result<(), HardwareError> {
        let _ = atlas;
        Ok(())
    }

    /// Move the layers to the placements in `frame`
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Render`] or [`HardwareError::Io`] when the
    /// frame cannot be drawn.
    fn render(&mut self, frame: &LayerFrame) -> Result<(), HardwareError>;
}

impl<T: AmplitudeSampler + ?Sized> AmplitudeSampler for &mut T {
    fn sample(&mut self) -> Result<u16, HardwareError> {
        (**self).sample()
    }
}

impl<T: Accelerometer + ?Sized> Accelerometer for &mut T {
    fn acceleration(&mut self) -> Result<Acceleration, HardwareError> {
        (**self).acceleration()
    }
}

impl<T: Renderer + ?Sized> Renderer for &mut T {
    fn load_atlas(&mut self, atlas: &AtlasConfig) -> Result<(), HardwareError> {
        (**self).load_atlas(atlas)
    }

    fn render(&mut self, frame: &LayerFrame) -> Result<(), HardwareError> {
        (**self).render(frame)
    }
}
