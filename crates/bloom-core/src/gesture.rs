#![forbid(unsafe_code)]

//! Gesture vocabulary.

use std::fmt;
use std::str::FromStr;

/// A discrete hand-pose or motion category.
///
/// `PointUp` drives focus selection. `Pinch` is part of the vocabulary but
/// only produced when the classifier's pinch ratio is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GestureLabel {
    /// No hand, or a pose that matches nothing.
    #[default]
    None,
    /// Three or more fingers extended, hand still.
    Open,
    /// No fingers extended.
    Fist,
    /// Open hand moving side to side.
    Wave,
    /// Index finger raised above the others.
    PointUp,
    /// Thumb tip touching the index tip.
    Pinch,
}

impl GestureLabel {
    /// Every label, in declaration order.
    pub const ALL: [GestureLabel; 6] = [
        Self::None,
        Self::Open,
        Self::Fist,
        Self::Wave,
        Self::PointUp,
        Self::Pinch,
    ];

    /// Stable lowercase name (`"point_up"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Open => "open",
            Self::Fist => "fist",
            Self::Wave => "wave",
            Self::PointUp => "point_up",
            Self::Pinch => "pinch",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown gesture name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGesture(pub String);

impl fmt::Display for UnknownGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown gesture {:?}", self.0)
    }
}

impl std::error::Error for UnknownGesture {}

impl FromStr for GestureLabel {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for g in GestureLabel::ALL {
            assert_eq!(g.to_string().parse::<GestureLabel>(), Ok(g));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("POINT_UP".parse(), Ok(GestureLabel::PointUp));
        assert_eq!(" fist ".parse(), Ok(GestureLabel::Fist));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "grab".parse::<GestureLabel>().unwrap_err();
        assert_eq!(err.to_string(), "unknown gesture \"grab\"");
    }

    #[test]
    fn default_is_none() {
        assert_eq!(GestureLabel::default(), GestureLabel::None);
    }
}
