#![forbid(unsafe_code)]

//! Core: hand-gesture classification, temporal debouncing, input arbitration,
//! and the phase/focus state machine behind the bloom greeting card.
//!
//! Data flows one way:
//!
//! ```text
//! LandmarkFrame ─▶ classifier ─▶ debounce ─▶ arbiter (+ pointer / keys) ─▶ phase & focus ─▶ ArbitratedState
//!                      ▲
//!                wave tracker
//! ```
//!
//! [`controller::GestureController`] owns every component and exposes the
//! per-video-frame and per-render-tick entry points.

pub mod animation;
pub mod arbiter;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod event;
pub mod focus;
pub mod gesture;
pub mod landmark;
pub mod logging;
pub mod phase;
pub mod shared;
pub mod snapshot;
pub mod synthetic;
pub mod wave;

pub use config::BloomConfig;
pub use controller::GestureController;
pub use error::{ConfigError, FrameError};
pub use gesture::GestureLabel;
pub use landmark::{LandmarkFrame, Point};
pub use phase::InteractionPhase;
pub use snapshot::{ArbitratedState, ItemId};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};
