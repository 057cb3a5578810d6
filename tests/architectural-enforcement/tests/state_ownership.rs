//! Integration Test: Explicit State Ownership
//!
//! **Policy**: All animation state lives in values owned by the rig and is
//! passed through each tick. No mutable globals, no thread-locals, no lazy
//! statics, and no async runtime inside the core.

use std::fs;

use architectural_enforcement::{assert_clean, find_violations, workspace_root};

#[test]
fn test_no_mutable_globals_in_core() {
    let violations = find_violations(
        "face/core/src",
        &[
            "static mut",
            "lazy_static!",
            "thread_local!",
            "OnceCell",
            "OnceLock",
            "LazyLock",
        ],
    );
    assert_clean(&violations, "Global state found in face-core");
}

#[test]
fn test_no_unwrap_in_core() {
    let violations = find_violations("face/core/src", &[".unwrap()", ".expect("]);
    assert_clean(
        &violations,
        "unwrap/expect found in face-core production code; propagate errors",
    );
}

#[test]
fn test_core_has_no_async_runtime() {
    let manifest = fs::read_to_string(workspace_root().join("face/core/Cargo.toml"))
        .unwrap_or_default();
    let dependencies = manifest
        .split("[dev-dependencies]")
        .next()
        .unwrap_or_default();

    for runtime in ["tokio", "async-std", "smol"] {
        assert!(
            !dependencies
                .lines()
                .any(|l| l.trim_start().starts_with(runtime)),
            "face-core must not depend on {runtime}"
        );
    }

    let violations = find_violations("face/core/src", &["async fn", ".await"]);
    assert_clean(&violations, "Async code found in face-core");
}
