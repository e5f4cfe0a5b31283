#![forbid(unsafe_code)]

//! Deterministic session recording and replay.
//!
//! A session trace is a JSONL file: one [`TraceRecord`] per line.
//!
//! - **Header** (first): schema version, seed and the full [`BloomConfig`].
//! - **Input**: one [`InputEvent`] fed to the controller.
//! - **Snapshot**: after every tick, the FNV-1a checksum of the
//!   [`ArbitratedState`], the running checksum chain and the state itself.
//! - **Summary** (last): snapshot count and final chain.
//!
//! # Determinism contract
//!
//! The controller has no clock and no randomness: time only advances via
//! `tick` events and focus picks are ordered. Replaying the same inputs
//! through a fresh controller with the same config must reproduce every
//! snapshot checksum bit for bit.

use std::fmt;
use std::io;
use std::path::Path;

use bloom_core::arbiter::ActiveInputs;
use bloom_core::event::InputEvent;
use bloom_core::{ArbitratedState, BloomConfig, ConfigError, GestureController, InteractionPhase};
use serde::{Deserialize, Serialize};

/// Schema version written into every header.
pub const SCHEMA_VERSION: &str = "bloom-trace-v1";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a64_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a64_pair(prev: u64, next: u64) -> u64 {
    let hash = fnv1a64_bytes(FNV_OFFSET_BASIS, &prev.to_le_bytes());
    fnv1a64_bytes(hash, &next.to_le_bytes())
}

/// FNV-1a checksum of every field of a snapshot.
///
/// Floats are hashed by bit pattern, so `0.0` and `-0.0` differ.
#[must_use]
pub fn checksum_state(state: &ArbitratedState) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    h = fnv1a64_bytes(h, state.gesture.as_str().as_bytes());
    h = fnv1a64_bytes(h, &state.rotation_velocity.to_bits().to_le_bytes());
    h = fnv1a64_bytes(h, &state.view_angle.to_bits().to_le_bytes());
    match state.focused_id {
        Some(id) => {
            h = fnv1a64_bytes(h, &[1]);
            h = fnv1a64_bytes(h, &id.0.to_le_bytes());
        }
        None => h = fnv1a64_bytes(h, &[0]),
    }
    h = fnv1a64_bytes(h, &[phase_byte(state.phase)]);
    match state.transition {
        Some(t) => {
            h = fnv1a64_bytes(h, &[1, phase_byte(t.to)]);
            h = fnv1a64_bytes(h, &t.progress.to_bits().to_le_bytes());
        }
        None => h = fnv1a64_bytes(h, &[0]),
    }
    h = fnv1a64_bytes(h, &[u8::from(state.keyboard_override)]);
    fnv1a64_bytes(h, &[state.active_inputs.bits()])
}

fn phase_byte(phase: InteractionPhase) -> u8 {
    match phase {
        InteractionPhase::Compact => 0,
        InteractionPhase::Expanded => 1,
    }
}

/// One line of a session trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Session header (must be first).
    Header {
        schema_version: String,
        seed: u64,
        config: BloomConfig,
    },
    /// An input fed to the controller.
    Input { step: u64, event: InputEvent },
    /// State after a tick.
    Snapshot {
        step: u64,
        checksum: u64,
        checksum_chain: u64,
        state: ArbitratedState,
    },
    /// Trace summary (must be last).
    Summary {
        total_snapshots: u64,
        final_checksum_chain: u64,
    },
}

/// A complete recorded session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTrace {
    pub records: Vec<TraceRecord>,
}

/// Errors reading, writing or validating a trace.
#[derive(Debug)]
pub enum TraceError {
    /// Filesystem error.
    Io(io::Error),
    /// A line is not a valid record. `line` is 1-based.
    Json {
        line: usize,
        source: serde_json::Error,
    },
    /// A record failed to serialize.
    Encode(serde_json::Error),
    /// The trace has no records.
    Empty,
    /// The first record is not a header.
    MissingHeader,
    /// The header names a schema this build does not understand.
    SchemaMismatch { found: String },
    /// A header or summary appears out of place.
    Misplaced { index: usize, record: &'static str },
    /// The summary disagrees with the snapshot records.
    SummaryMismatch {
        expected_snapshots: u64,
        actual_snapshots: u64,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json { line, source } => write!(f, "line {line}: {source}"),
            Self::Encode(e) => write!(f, "encode error: {e}"),
            Self::Empty => write!(f, "trace is empty"),
            Self::MissingHeader => write!(f, "trace missing header record"),
            Self::SchemaMismatch { found } => {
                write!(f, "unsupported schema {found:?} (expected {SCHEMA_VERSION:?})")
            }
            Self::Misplaced { index, record } => {
                write!(f, "{record} record out of place at index {index}")
            }
            Self::SummaryMismatch {
                expected_snapshots,
                actual_snapshots,
            } => write!(
                f,
                "summary claims {expected_snapshots} snapshots, trace has {actual_snapshots}"
            ),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json { source, .. } => Some(source),
            Self::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl SessionTrace {
    /// Seed and config from the header.
    pub fn header(&self) -> Result<(u64, &BloomConfig), TraceError> {
        match self.records.first() {
            Some(TraceRecord::Header {
                schema_version,
                seed,
                config,
            }) => {
                if schema_version != SCHEMA_VERSION {
                    return Err(TraceError::SchemaMismatch {
                        found: schema_version.clone(),
                    });
                }
                Ok((*seed, config))
            }
            Some(_) => Err(TraceError::MissingHeader),
            None => Err(TraceError::Empty),
        }
    }

    /// Number of snapshot records.
    #[must_use]
    pub fn snapshot_count(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Snapshot { .. }))
            .count() as u64
    }

    /// Final checksum chain from the summary, if present.
    #[must_use]
    pub fn final_checksum_chain(&self) -> Option<u64> {
        self.records.iter().rev().find_map(|r| match r {
            TraceRecord::Summary {
                final_checksum_chain,
                ..
            } => Some(*final_checksum_chain),
            _ => None,
        })
    }

    /// Check structure: header first with a known schema, at most one
    /// summary and only as the last record, summary count consistent.
    pub fn validate(&self) -> Result<(), TraceError> {
        self.header()?;
        let last = self.records.len() - 1;
        for (index, record) in self.records.iter().enumerate().skip(1) {
            match record {
                TraceRecord::Header { .. } => {
                    return Err(TraceError::Misplaced {
                        index,
                        record: "header",
                    });
                }
                TraceRecord::Summary {
                    total_snapshots, ..
                } => {
                    if index != last {
                        return Err(TraceError::Misplaced {
                            index,
                            record: "summary",
                        });
                    }
                    let actual = self.snapshot_count();
                    if *total_snapshots != actual {
                        return Err(TraceError::SummaryMismatch {
                            expected_snapshots: *total_snapshots,
                            actual_snapshots: actual,
                        });
                    }
                }
                TraceRecord::Input { .. } | TraceRecord::Snapshot { .. } => {}
            }
        }
        Ok(())
    }

    /// Serialize as JSONL, one record per line.
    pub fn to_jsonl(&self) -> Result<String, TraceError> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record).map_err(TraceError::Encode)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse JSONL. Blank lines are skipped; errors carry the line number.
    pub fn from_jsonl(input: &str) -> Result<Self, TraceError> {
        let mut records = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|source| TraceError::Json {
                line: idx + 1,
                source,
            })?;
            records.push(record);
        }
        let trace = Self { records };
        trace.validate()?;
        Ok(trace)
    }

    /// Write the trace to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), TraceError> {
        std::fs::write(path, self.to_jsonl()?)?;
        Ok(())
    }

    /// Read and validate a trace from `path`.
    pub fn read_from(path: &Path) -> Result<Self, TraceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_jsonl(&text)
    }
}

/// Replace values JSON cannot carry with ones the controller treats the
/// same way: a non-finite drag or tick length becomes `0.0`, a non-finite
/// frame becomes "no hand", non-finite projections are dropped.
fn finite_event(event: InputEvent) -> InputEvent {
    match event {
        InputEvent::PointerDrag { dx } if !dx.is_finite() => InputEvent::PointerDrag { dx: 0.0 },
        InputEvent::Tick { dt_ms } if !dt_ms.is_finite() => InputEvent::Tick { dt_ms: 0.0 },
        InputEvent::Landmarks { frame: Some(f) } if !f.is_finite() => {
            InputEvent::Landmarks { frame: None }
        }
        InputEvent::UpdateProjections { mut projections } => {
            projections.retain(|p| p.is_finite());
            InputEvent::UpdateProjections { projections }
        }
        other => other,
    }
}

/// Drives a controller and records everything it sees.
pub struct SessionRecorder {
    controller: GestureController,
    records: Vec<TraceRecord>,
    checksum_chain: u64,
    step: u64,
}

impl SessionRecorder {
    /// Start a session.
    pub fn new(config: BloomConfig, seed: u64) -> Result<Self, ConfigError> {
        let controller = GestureController::new(config.clone())?;
        Ok(Self {
            controller,
            records: vec![TraceRecord::Header {
                schema_version: SCHEMA_VERSION.to_string(),
                seed,
                config,
            }],
            checksum_chain: 0,
            step: 0,
        })
    }

    /// Feed one event. Ticks also record a snapshot, which is returned.
    ///
    /// Non-finite values are replaced before recording so the trace stays
    /// valid JSON; the controller reacts to the replacement exactly as it
    /// would to the original.
    pub fn push(&mut self, event: InputEvent) -> Option<ArbitratedState> {
        let event = finite_event(event);
        let step = self.step;
        self.step += 1;
        self.controller.handle(&event);
        let is_tick = matches!(event, InputEvent::Tick { .. });
        self.records.push(TraceRecord::Input { step, event });
        if !is_tick {
            return None;
        }
        let state = self.controller.snapshot();
        let checksum = checksum_state(&state);
        self.checksum_chain = fnv1a64_pair(self.checksum_chain, checksum);
        self.records.push(TraceRecord::Snapshot {
            step,
            checksum,
            checksum_chain: self.checksum_chain,
            state,
        });
        Some(state)
    }

    /// The controller being recorded.
    #[must_use]
    pub fn controller(&self) -> &GestureController {
        &self.controller
    }

    /// Close the session.
    #[must_use]
    pub fn finish(mut self) -> SessionTrace {
        let total_snapshots = self
            .records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Snapshot { .. }))
            .count() as u64;
        self.records.push(TraceRecord::Summary {
            total_snapshots,
            final_checksum_chain: self.checksum_chain,
        });
        tracing::debug!(
            steps = self.step,
            snapshots = total_snapshots,
            "session recorded"
        );
        SessionTrace {
            records: self.records,
        }
    }
}

/// Outcome of a successful replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// Inputs replayed.
    pub steps: u64,
    /// Snapshots verified.
    pub snapshots: u64,
    /// Final checksum chain.
    pub final_checksum_chain: u64,
    /// Rotation sources seen active at any point.
    pub active_inputs_seen: ActiveInputs,
}

/// Errors that can occur during replay.
#[derive(Debug)]
pub enum ReplayError {
    /// The trace is malformed.
    Trace(TraceError),
    /// The header config does not validate.
    Config(ConfigError),
    /// A snapshot diverged from the recording.
    ChecksumMismatch {
        step: u64,
        expected: u64,
        actual: u64,
    },
    /// The summary chain disagrees with the replayed chain.
    ChainMismatch { expected: u64, actual: u64 },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace(e) => write!(f, "invalid trace: {e}"),
            Self::Config(e) => write!(f, "invalid config: {e}"),
            Self::ChecksumMismatch {
                step,
                expected,
                actual,
            } => write!(
                f,
                "checksum mismatch at step {step}: expected {expected:016x}, got {actual:016x}"
            ),
            Self::ChainMismatch { expected, actual } => write!(
                f,
                "final checksum chain mismatch: expected {expected:016x}, got {actual:016x}"
            ),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Trace(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TraceError> for ReplayError {
    fn from(e: TraceError) -> Self {
        Self::Trace(e)
    }
}

impl From<ConfigError> for ReplayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Replay a trace through a fresh controller and verify every snapshot.
///
/// Stops at the first diverging snapshot.
pub fn replay(trace: &SessionTrace) -> Result<ReplayReport, ReplayError> {
    trace.validate()?;
    let (_, config) = trace.header()?;
    let mut controller = GestureController::new(config.clone())?;

    let mut steps = 0u64;
    let mut snapshots = 0u64;
    let mut chain = 0u64;
    let mut seen = ActiveInputs::empty();

    for record in &trace.records {
        match record {
            TraceRecord::Input { event, .. } => {
                controller.handle(event);
                steps += 1;
            }
            TraceRecord::Snapshot {
                step,
                checksum: expected,
                ..
            } => {
                let state = controller.snapshot();
                let actual = checksum_state(&state);
                if actual != *expected {
                    tracing::warn!(step, expected, actual, "snapshot diverged");
                    return Err(ReplayError::ChecksumMismatch {
                        step: *step,
                        expected: *expected,
                        actual,
                    });
                }
                chain = fnv1a64_pair(chain, actual);
                seen |= state.active_inputs;
                snapshots += 1;
            }
            TraceRecord::Header { .. } => {}
            TraceRecord::Summary {
                final_checksum_chain,
                ..
            } => {
                if *final_checksum_chain != chain {
                    return Err(ReplayError::ChainMismatch {
                        expected: *final_checksum_chain,
                        actual: chain,
                    });
                }
            }
        }
    }

    tracing::info!(steps, snapshots, "replay verified");
    Ok(ReplayReport {
        steps,
        snapshots,
        final_checksum_chain: chain,
        active_inputs_seen: seen,
    })
}
