#![forbid(unsafe_code)]

//! Session recording and deterministic replay for `bloom-core`.
//!
//! - **Recording**: [`SessionRecorder`] feeds [`InputEvent`]s to a
//!   controller and checkpoints every tick with an FNV-1a checksum.
//! - **Replay**: [`replay`] runs a trace through a fresh controller and
//!   reports the first diverging step.
//! - **Demo**: [`demo::demo_session`] scripts a full visit from synthetic
//!   poses so the pipeline can be exercised without a camera.
//!
//! Traces are JSONL so they diff well and can be trimmed by hand.
//!
//! [`InputEvent`]: bloom_core::event::InputEvent

pub mod demo;
pub mod trace;

pub use trace::{
    ReplayError, ReplayReport, SCHEMA_VERSION, SessionRecorder, SessionTrace, TraceError,
    TraceRecord, checksum_state, replay,
};

use bloom_core::{BloomConfig, ConfigError};

/// Record the demo session for `seed` with `config`.
///
/// # Errors
///
/// Returns an error if `config` does not validate.
pub fn record_demo(config: BloomConfig, seed: u64) -> Result<SessionTrace, ConfigError> {
    let mut recorder = SessionRecorder::new(config, seed)?;
    for event in demo::demo_session(seed) {
        recorder.push(event);
    }
    Ok(recorder.finish())
}
