#![forbid(unsafe_code)]

//! Hand landmark frames.
//!
//! A [`LandmarkFrame`] holds the 21 normalized 2D joint positions produced
//! by the upstream hand-landmark model for one detected hand in one video
//! frame. Coordinates are in `[0, 1]` image space with `y` growing downward,
//! so a *smaller* `y` is *higher* on screen.
//!
//! The joint numbering follows the upstream hand topology and must not be
//! reordered; see [`joints`].

use crate::error::FrameError;

/// Number of joints in a hand landmark frame.
pub const LANDMARK_COUNT: usize = 21;

/// Joint indices into a [`LandmarkFrame`].
pub mod joints {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// A 2D point in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether both coordinates are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// One hand's 21 landmarks for a single processed video frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LandmarkFrame {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Build a frame from exactly 21 points.
    #[must_use]
    pub const fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a frame from a slice, validating length and finiteness.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::WrongLandmarkCount`] if the slice does not hold
    /// exactly [`LANDMARK_COUNT`] points, or [`FrameError::NonFinite`] if any
    /// coordinate is NaN or infinite.
    pub fn from_slice(points: &[Point]) -> Result<Self, FrameError> {
        let points: [Point; LANDMARK_COUNT] =
            points
                .try_into()
                .map_err(|_| FrameError::WrongLandmarkCount {
                    expected: LANDMARK_COUNT,
                    actual: points.len(),
                })?;
        if let Some(joint) = points.iter().position(|p| !p.is_finite()) {
            return Err(FrameError::NonFinite { joint });
        }
        Ok(Self { points })
    }

    /// Point at joint index `joint`.
    ///
    /// # Panics
    ///
    /// Panics if `joint >= LANDMARK_COUNT`. Use the [`joints`] constants.
    #[inline]
    #[must_use]
    pub fn point(&self, joint: usize) -> Point {
        self.points[joint]
    }

    /// The wrist joint.
    #[inline]
    #[must_use]
    pub fn wrist(&self) -> Point {
        self.points[joints::WRIST]
    }

    /// Distance between two joints.
    #[inline]
    #[must_use]
    pub fn distance(&self, a: usize, b: usize) -> f32 {
        self.points[a].distance(self.points[b])
    }

    /// Whether every coordinate is finite.
    ///
    /// Frames built with [`new`](Self::new) or deserialized skip the check
    /// [`from_slice`](Self::from_slice) performs.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// All points in joint order.
    #[must_use]
    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    /// Mirror horizontally (`x -> 1 - x`).
    ///
    /// Selfie-view cameras deliver a mirrored image; hosts flip the
    /// landmarks so that moving the hand right moves it right on screen.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let mut points = self.points;
        for p in &mut points {
            p.x = 1.0 - p.x;
        }
        Self { points }
    }
}
