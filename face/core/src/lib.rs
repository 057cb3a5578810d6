//! Face Core - Sensor-Driven Animation for an LED Matrix Face
//!
//! This crate holds the animation logic for a 64x32 LED matrix face:
//! randomized eye blinks, wandering pupils, a mouth driven by microphone
//! loudness and tilt-triggered expressions. It never touches a driver; all
//! I/O goes through the traits in [`hardware`], so the same rig runs on the
//! panel, in the simulator daemon, or under scripted tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Hardware Seams                           │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │ AmplitudeSampler │  │  Accelerometer   │  │    Renderer    │  │
//! │  │   (mic ADC)      │  │     (tilt)       │  │  (LED matrix)  │  │
//! │  └────────┬─────────┘  └────────┬─────────┘  └───────▲────────┘  │
//! └───────────┼─────────────────────┼────────────────────┼───────────┘
//!             │ u16 samples         │ m/s²               │ LayerFrame
//! ┌───────────┼─────────────────────┼────────────────────┼───────────┐
//! │           ▼                     ▼         FACE RIG   │           │
//! │  ┌─────────────────┐  ┌──────────────────┐  ┌────────┴────────┐  │
//! │  │ MouthSyncFilter │  │ ExpressionState  │  │   Compositor    │  │
//! │  └────────┬────────┘  └────────┬─────────┘  └────────▲────────┘  │
//! │           │  ┌───────────────┐ │ ┌────────────────┐  │           │
//! │           │  │ BlinkState    │ │ │ EyeWanderState │  │           │
//! │           │  └───────┬───────┘ │ └───────┬────────┘  │           │
//! │           └──────────┴─────────┴─────────┴───────────┘           │
//! │                        AnimationState -> FaceOutputs             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`FaceRig`]: Owns the animation state and runs one tick at a time
//! - [`AnimationState`]: The four state machines carried between ticks
//! - [`Compositor`]: Maps sprite selections to layer placements
//! - [`TickSchedule`]: Fixed-rate tick deadlines (35 Hz by default)
//! - [`FaceConfig`]: Resolved configuration from file, env and CLI
//!
//! # Module Overview
//!
//! - [`blink`]: Eyelid phase cycle on randomized timers
//! - [`clock`]: Monotonic and manual time sources, deadline checks
//! - [`compositor`]: Layer identities, placements and sprite geometry
//! - [`config`]: TOML configuration and atlas layout
//! - [`expression`]: Tilt-triggered poses and intensity decay
//! - [`hardware`]: Sensor and renderer traits
//! - [`mouth`]: Windowed peak-to-peak loudness to mouth level
//! - [`rig`]: The per-tick pipeline
//! - [`schedule`]: Tick cadence
//! - [`wander`]: Pupil darting and resting
//!
//! # No Async Runtime
//!
//! The core is synchronous and owns no threads or timers. Drivers decide
//! how ticks are paced; the daemon uses a tokio interval, tests step a
//! [`ManualClock`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blink;
pub mod clock;
pub mod compositor;
pub mod config;
pub mod expression;
pub mod hardware;
pub mod mouth;
pub mod rig;
pub mod schedule;
pub mod wander;

// Timing exports
pub use clock::{deadline_passed, Clock, ManualClock, MonotonicClock};
pub use schedule::{TickSchedule, DEFAULT_RATE_HZ};

// State machine exports
pub use blink::{BlinkPhase, BlinkStateMachine};
pub use expression::{
    AccelAxis, ExpressionConfig, ExpressionStateMachine, Intensity, Pose, TiltReading,
};
pub use mouth::{MouthConfig, MouthLevel, MouthSyncFilter, SampleWindow};
pub use wander::EyeWanderStateMachine;

// Rendering exports
pub use compositor::{Compositor, FaceOutputs, LayerFrame, LayerId, LayerPlacement};
pub use rig::{AnimationState, FaceRig};

// Hardware exports
pub use hardware::{
    Acceleration, Accelerometer, AmplitudeSampler, HardwareError, Renderer, STANDARD_GRAVITY,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, Anchor, AtlasConfig, ConfigError,
    ConfigOverrides, ConfigSource, FaceConfig, FaceToml, LayerSpec, Rgb,
};
