//! Integration Test: Sleep Prohibition
//!
//! **Policy**: The animation core MUST NOT sleep. Every timer compares clock
//! readings, and tick pacing belongs to the driver (the daemon's tokio
//! interval), so a replay harness can step time without waiting on it.
//!
//! **Exceptions**: Test code.

use architectural_enforcement::{assert_clean, find_violations};

/// Test that the core does not contain sleep() calls
#[test]
fn test_no_sleep_in_core() {
    let violations = find_violations("face/core/src", &["::sleep(", ".sleep(", "sleep_ms("]);
    assert_clean(
        &violations,
        "Sleep calls found in face-core; compare clock readings instead",
    );
}

/// The daemon paces ticks with an interval, never with sleep
#[test]
fn test_daemon_paces_with_interval() {
    let violations = find_violations("face/daemon/src", &["::sleep(", ".sleep("]);
    assert_clean(
        &violations,
        "Sleep calls found in face-daemon; use tokio::time::interval",
    );
}
