//! Integration tests for the face rig
//!
//! These tests drive the whole tick pipeline through the hardware seams with
//! a manual clock, the way a replay harness would. Tests cover:
//! - Tilt-triggered expression rising and decaying back to neutral, including
//!   a tilt held for several seconds
//! - Loud audio opening the mouth
//! - Seeded replays producing identical frame sequences
//! - TOML configuration affecting placements

use std::io::Write;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use face_core::config::{load_config_from_path, ConfigSource};
use face_core::{
    Acceleration, Accelerometer, AmplitudeSampler, Clock, FaceConfig, FaceRig, HardwareError,
    Intensity, LayerFrame, LayerId, ManualClock, Pose, TickSchedule,
};

// =============================================================================
// Scripted hardware
// =============================================================================

/// Microphone that replays a sample pattern, one sample per simulated
/// millisecond
struct ScriptedMic {
    clock: ManualClock,
    pattern: Vec<u16>,
    next: usize,
}

impl ScriptedMic {
    fn new(clock: &ManualClock, pattern: Vec<u16>) -> Self {
        Self {
            clock: clock.clone(),
            pattern,
            next: 0,
        }
    }
}

impl AmplitudeSampler for ScriptedMic {
    fn sample(&mut self) -> Result<u16, HardwareError> {
        let value = self.pattern[self.next % self.pattern.len()];
        self.next += 1;
        self.clock.advance(Duration::from_millis(1));
        Ok(value)
    }
}

/// Accelerometer whose reading is a function of the clock
struct ScriptedTilt<F: FnMut(Duration) -> Acceleration> {
    clock: ManualClock,
    script: F,
}

impl<F: FnMut(Duration) -> Acceleration> Accelerometer for ScriptedTilt<F> {
    fn acceleration(&mut self) -> Result<Acceleration, HardwareError> {
        Ok((self.script)(self.clock.now()))
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Run `ticks` scheduled ticks, jumping the clock to each deadline
fn replay<M, A>(
    rig: &mut FaceRig,
    clock: &ManualClock,
    mic: &mut M,
    accel: &mut A,
    ticks: usize,
) -> Vec<LayerFrame>
where
    M: AmplitudeSampler,
    A: Accelerometer,
{
    let mut schedule = TickSchedule::default();
    schedule.start_at(clock.now());
    let mut frames = Vec::with_capacity(ticks);

    while frames.len() < ticks {
        if schedule.poll(clock.now()) {
            frames.push(rig.tick(clock, mic, accel).unwrap());
        } else {
            clock.set(schedule.next_due());
        }
    }
    frames
}

// =============================================================================
// Test 1: Tilt raises and decays the expression
// =============================================================================

/// Holding a tilt for three ticks reaches full intensity; once level, the
/// expression steps down once per second and returns to neutral.
#[test]
fn test_tilt_then_level_decays_to_neutral() {
    let mut rig = FaceRig::with_seed(&FaceConfig::default(), Duration::ZERO, 5);
    let tilted = Acceleration::from_g(0.8, 0.0, 0.0);
    let level = Acceleration::default();
    let quiet = face_core::MouthLevel::CLOSED;

    for tick in 0..3u64 {
        rig.step(ms(28 * tick), quiet, tilted);
    }
    assert_eq!(rig.state().expression.pose(), Some(Pose::AxisAPositive));
    assert_eq!(rig.state().expression.intensity().get(), 3);

    // Last trigger at 56ms; each decay needs strictly more than 1s of quiet
    let mut steps = Vec::new();
    let mut previous = rig.state().expression.intensity();
    for tick in 3..150u64 {
        let now = ms(28 * tick);
        rig.step(now, quiet, level);
        let intensity = rig.state().expression.intensity();
        if intensity != previous {
            steps.push((now, intensity.get()));
            previous = intensity;
        }
    }

    assert_eq!(steps, vec![(ms(1064), 2), (ms(2072), 1), (ms(3080), 0)]);
    assert_eq!(rig.state().expression.pose(), None);

    let frame = rig.step(ms(28 * 150), quiet, level);
    assert_eq!(frame.position(LayerId::Expression), (0, 32));
}

/// Holding 0.6g for two seconds keeps the expression pinned at full
/// intensity; decay only starts a second after the final crossing and the
/// face is neutral again about three seconds after the tilt ends.
#[test]
fn test_sustained_tilt_decays_from_last_crossing() {
    let mut rig = FaceRig::with_seed(&FaceConfig::default(), Duration::ZERO, 5);
    let tilted = Acceleration::from_g(0.6, 0.0, 0.0);
    let level = Acceleration::default();
    let quiet = face_core::MouthLevel::CLOSED;

    // Ticks at 0..=1988ms are tilted; 1988ms is the last crossing
    let mut tick = 0u64;
    while 28 * tick < 2000 {
        rig.step(ms(28 * tick), quiet, tilted);
        assert_eq!(rig.state().expression.pose(), Some(Pose::AxisAPositive));
        let expected = u8::try_from(tick + 1).unwrap_or(u8::MAX).min(3);
        assert_eq!(rig.state().expression.intensity().get(), expected);
        tick += 1;
    }
    assert_eq!(ms(28 * tick), ms(2016));

    let mut steps = Vec::new();
    let mut previous = rig.state().expression.intensity();
    while tick < 250 {
        let now = ms(28 * tick);
        rig.step(now, quiet, level);
        let intensity = rig.state().expression.intensity();
        if intensity != previous {
            steps.push((now, intensity.get()));
            previous = intensity;
        }
        tick += 1;
    }

    // First tick past 1988 + 1000 is 2996, then one step per elapsed second
    assert_eq!(steps, vec![(ms(2996), 2), (ms(4004), 1), (ms(5012), 0)]);
    assert_eq!(rig.state().expression.pose(), None);
    assert!(ms(5012) - ms(2016) < ms(3100));
}

/// Re-tilting during decay restarts the climb on the new pose.
#[test]
fn test_retilt_during_decay_switches_pose() {
    let mut rig = FaceRig::with_seed(&FaceConfig::default(), Duration::ZERO, 5);
    let quiet = face_core::MouthLevel::CLOSED;

    rig.step(ms(0), quiet, Acceleration::from_g(0.8, 0.0, 0.0));
    rig.step(ms(28), quiet, Acceleration::from_g(0.8, 0.0, 0.0));
    rig.step(ms(1100), quiet, Acceleration::default());
    assert_eq!(rig.state().expression.intensity().get(), 1);

    let frame = rig.step(ms(1128), quiet, Acceleration::from_g(0.0, 0.0, -0.8));
    assert_eq!(rig.state().expression.pose(), Some(Pose::AxisBNegative));
    assert_eq!(rig.state().expression.intensity(), Intensity::clamped(2));
    assert_eq!(frame.position(LayerId::Expression), (-128, -32));
}

// =============================================================================
// Test 2: Audio drives the mouth
// =============================================================================

#[test]
fn test_loud_audio_opens_mouth_through_tick() {
    let clock = ManualClock::new();
    let mut mic = ScriptedMic::new(&clock, vec![0, 65_535]);
    let mut accel = ScriptedTilt {
        clock: clock.clone(),
        script: |_: Duration| Acceleration::default(),
    };
    let mut rig = FaceRig::with_seed(&FaceConfig::default(), clock.now(), 8);

    let frames = replay(&mut rig, &clock, &mut mic, &mut accel, 3);

    for frame in &frames {
        assert_eq!(frame.position(LayerId::Mouth), (0, -96));
    }
}

#[test]
fn test_silence_keeps_mouth_closed() {
    let clock = ManualClock::new();
    let mut mic = ScriptedMic::new(&clock, vec![32_000, 32_100, 32_200]);
    let mut accel = ScriptedTilt {
        clock: clock.clone(),
        script: |_: Duration| Acceleration::default(),
    };
    let mut rig = FaceRig::with_seed(&FaceConfig::default(), clock.now(), 8);

    let frames = replay(&mut rig, &clock, &mut mic, &mut accel, 10);

    assert!(frames
        .iter()
        .all(|f| f.position(LayerId::Mouth) == (0, 0)));
}

// =============================================================================
// Test 3: Seeded replay is deterministic
// =============================================================================

fn speech_pattern() -> Vec<u16> {
    // Bursts of loud swing separated by near silence
    (0..400u32)
        .map(|i| {
            let swing = if (i / 100) % 2 == 0 { 30_000 } else { 100 };
            let jitter = i * 7919 % 997 % 50;
            let value = if i % 2 == 0 {
                32_768 - swing / 2 + jitter
            } else {
                32_768 + swing / 2 - jitter
            };
            value as u16
        })
        .collect()
}

fn run_seeded(seed: u64, ticks: usize) -> Vec<LayerFrame> {
    let clock = ManualClock::new();
    let mut mic = ScriptedMic::new(&clock, speech_pattern());
    let mut accel = ScriptedTilt {
        clock: clock.clone(),
        script: |now: Duration| {
            // Tilt left for a second every five seconds
            if now.as_millis() % 5_000 < 1_000 {
                Acceleration::from_g(-0.7, 0.0, 0.1)
            } else {
                Acceleration::from_g(0.05, 0.0, -0.1)
            }
        },
    };
    let mut rig = FaceRig::with_seed(&FaceConfig::default(), clock.now(), seed);
    replay(&mut rig, &clock, &mut mic, &mut accel, ticks)
}

#[test]
fn test_same_seed_replays_identically() {
    let first = run_seeded(2024, 1_500);
    let second = run_seeded(2024, 1_500);

    assert_eq!(first.len(), 1_500);
    assert_eq!(first, second);
}

#[test]
fn test_replay_frames_stay_in_sprite_bounds() {
    let frames = run_seeded(77, 3_000);

    for frame in &frames {
        assert_eq!(frame.position(LayerId::Base), (0, 0));

        let (px, py) = frame.position(LayerId::Pupil);
        assert!((-5..=5).contains(&px));
        assert!((0..=5).contains(&py));

        let (_, ey) = frame.position(LayerId::Eyes);
        assert!([0, -32, -96].contains(&ey), "unexpected eyelid row at {ey}");

        let (_, my) = frame.position(LayerId::Mouth);
        assert!((-96..=0).contains(&my) && my % 32 == 0);

        let (xx, xy) = frame.position(LayerId::Expression);
        assert!((-192..=0).contains(&xx) && xx % 64 == 0);
        assert!((-64..=32).contains(&xy) && xy % 32 == 0);
    }

    // The periodic left tilt shows up at full strength
    assert!(frames
        .iter()
        .any(|f| f.position(LayerId::Expression) == (-64, -64)));
}

// =============================================================================
// Test 4: TOML configuration affects placements
// =============================================================================

#[test]
fn test_toml_config_moves_anchors() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[atlas]
frame_width = 32
frame_height = 16

[atlas.pupil]
anchor = [4, 2]

[atlas.expression]
anchor = [0, 16]

[expression]
axis_b = "y"

[rig]
seed = 12
"#,
    )
    .unwrap();

    let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
    assert_eq!(config.source(), ConfigSource::File);

    let mut rig = FaceRig::from_config(&config, Duration::ZERO);
    let frame = rig.step(
        Duration::ZERO,
        face_core::MouthLevel::clamped(1),
        Acceleration::from_g(0.0, 0.9, 0.0),
    );

    assert_eq!(frame.position(LayerId::Pupil), (4, 2));
    assert_eq!(frame.position(LayerId::Mouth), (0, -16));
    // Axis-B now reads Y: positive tilt is column 3, intensity 1
    assert_eq!(frame.position(LayerId::Expression), (-96, 0));
}
