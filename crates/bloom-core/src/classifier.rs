#![forbid(unsafe_code)]

//! Per-frame gesture classification.
//!
//! [`classify`] is a pure function of one [`LandmarkFrame`], the wave
//! tracker's recent horizontal range, and a [`ClassifierConfig`]. It holds no
//! state; temporal smoothing happens downstream in
//! [`debounce`](crate::debounce).
//!
//! # Algorithm
//!
//! 1. `palm = |wrist − index_mcp|`, floored at `palm_floor` when degenerate.
//! 2. A non-thumb finger is extended when its tip is more than
//!    `finger_extension_ratio ×` as far from the wrist as its middle joint.
//!    The ratio is relaxed (1.1) so partial curls still count.
//! 3. The thumb bends on a different axis, so it is tested by the distance
//!    from its tip to its MCP joint against `thumb_extension_ratio × palm`.
//! 4. Decision order on the extended count `n`:
//!    - `n ≥ 3` and wrist x-range `> wave_range_threshold` → `Wave`
//!    - `n ≥ 3` → `Open`
//!    - `n = 0` → `Fist`
//!    - `n ∈ {1, 2}` and the index tip is higher than the middle, ring and
//!      pinky tips by more than `point_up_margin` → `PointUp`
//!    - pinch enabled and `|thumb_tip − index_tip| < pinch_ratio × palm` → `Pinch`
//!    - otherwise `None`

use crate::error::{ConfigError, ensure_in_range, ensure_non_negative, ensure_positive};
use crate::gesture::GestureLabel;
use crate::landmark::{LandmarkFrame, joints};

/// (tip, middle joint) pairs for index, middle, ring and pinky.
const FINGER_JOINTS: [(usize, usize); 4] = [
    (joints::INDEX_TIP, joints::INDEX_PIP),
    (joints::MIDDLE_TIP, joints::MIDDLE_PIP),
    (joints::RING_TIP, joints::RING_PIP),
    (joints::PINKY_TIP, joints::PINKY_PIP),
];

/// Below this, palm size is considered degenerate.
const PALM_EPSILON: f32 = 1e-6;

/// Tunable classifier thresholds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassifierConfig {
    /// Palm size used when the measured one is degenerate.
    /// Default: 0.1
    pub palm_floor: f32,

    /// Tip-to-wrist over mid-to-wrist ratio above which a finger is extended.
    /// Default: 1.1
    pub finger_extension_ratio: f32,

    /// Thumb tip-to-MCP distance, as a fraction of palm size, above which
    /// the thumb is extended.
    /// Default: 0.85
    pub thumb_extension_ratio: f32,

    /// Minimum height (normalized y) by which the index tip must clear the
    /// other fingertips for `PointUp`.
    /// Default: 0.08
    pub point_up_margin: f32,

    /// Wrist x-range over the wave window above which an open hand is a wave.
    /// Default: 0.08
    pub wave_range_threshold: f32,

    /// Thumb-to-index distance, as a fraction of palm size, below which the
    /// pose is a pinch. `None` disables pinch detection.
    /// Default: None (`Some(0.35)` when enabled)
    pub pinch_ratio: Option<f32>,
}

impl ClassifierConfig {
    /// Pinch ratio used by [`with_pinch`](Self::with_pinch).
    pub const DEFAULT_PINCH_RATIO: f32 = 0.35;

    /// Enable pinch detection with the default ratio.
    #[must_use]
    pub fn with_pinch(mut self) -> Self {
        self.pinch_ratio = Some(Self::DEFAULT_PINCH_RATIO);
        self
    }

    /// Check thresholds for nonsensical values.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("classifier.palm_floor", self.palm_floor)?;
        ensure_positive(
            "classifier.finger_extension_ratio",
            self.finger_extension_ratio,
        )?;
        ensure_positive(
            "classifier.thumb_extension_ratio",
            self.thumb_extension_ratio,
        )?;
        ensure_non_negative("classifier.point_up_margin", self.point_up_margin)?;
        ensure_in_range(
            "classifier.wave_range_threshold",
            self.wave_range_threshold,
            0.0,
            1.0,
        )?;
        if let Some(ratio) = self.pinch_ratio {
            ensure_positive("classifier.pinch_ratio", ratio)?;
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            palm_floor: 0.1,
            finger_extension_ratio: 1.1,
            thumb_extension_ratio: 0.85,
            point_up_margin: 0.08,
            wave_range_threshold: 0.08,
            pinch_ratio: None,
        }
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// The raw (undebounced) label.
    pub label: GestureLabel,
    /// Number of extended fingers, thumb included (0–5).
    pub extended_count: u8,
    /// Palm size after flooring.
    pub palm_size: f32,
}

/// Palm size (wrist to index MCP), floored when degenerate.
#[must_use]
pub fn palm_size(frame: &LandmarkFrame, config: &ClassifierConfig) -> f32 {
    let palm = frame.distance(joints::WRIST, joints::INDEX_MCP);
    if palm.is_finite() && palm > PALM_EPSILON {
        palm
    } else {
        config.palm_floor
    }
}

/// Count extended fingers, thumb included.
#[must_use]
pub fn extended_fingers(frame: &LandmarkFrame, palm: f32, config: &ClassifierConfig) -> u8 {
    let wrist = frame.wrist();
    let fingers = FINGER_JOINTS
        .iter()
        .filter(|&&(tip, mid)| {
            let tip_dist = frame.point(tip).distance(wrist);
            let mid_dist = frame.point(mid).distance(wrist);
            tip_dist > mid_dist * config.finger_extension_ratio
        })
        .count() as u8;

    let thumb_dist = frame.distance(joints::THUMB_TIP, joints::THUMB_MCP);
    let thumb = u8::from(thumb_dist > palm * config.thumb_extension_ratio);

    fingers + thumb
}

/// Whether the index tip clears the middle, ring and pinky tips.
fn index_pointed_up(frame: &LandmarkFrame, margin: f32) -> bool {
    let index_y = frame.point(joints::INDEX_TIP).y;
    [joints::MIDDLE_TIP, joints::RING_TIP, joints::PINKY_TIP]
        .iter()
        .all(|&tip| index_y < frame.point(tip).y - margin)
}

/// Classify one frame.
///
/// `wave_range` is the wrist x-range over the wave tracker's window
/// ([`WaveTracker::range`](crate::wave::WaveTracker::range)); pass `0.0`
/// when no motion history is available.
#[must_use]
pub fn classify(
    frame: &LandmarkFrame,
    wave_range: f32,
    config: &ClassifierConfig,
) -> Classification {
    let palm = palm_size(frame, config);
    let extended = extended_fingers(frame, palm, config);

    let label = if extended >= 3 {
        if wave_range > config.wave_range_threshold {
            GestureLabel::Wave
        } else {
            GestureLabel::Open
        }
    } else if extended == 0 {
        GestureLabel::Fist
    } else if index_pointed_up(frame, config.point_up_margin) {
        GestureLabel::PointUp
    } else if config.pinch_ratio.is_some_and(|ratio| {
        frame.distance(joints::THUMB_TIP, joints::INDEX_TIP) < palm * ratio
    }) {
        GestureLabel::Pinch
    } else {
        GestureLabel::None
    };

    Classification {
        label,
        extended_count: extended,
        palm_size: palm,
    }
}
