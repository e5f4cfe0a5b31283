#![forbid(unsafe_code)]

//! Error types.
//!
//! The per-frame pipeline never fails: bad landmark data is treated as "no
//! hand" and degenerate geometry is floored. Errors only surface at the
//! edges, when building a [`LandmarkFrame`](crate::LandmarkFrame) from raw
//! data or when validating a [`BloomConfig`](crate::BloomConfig).

use std::fmt;

/// Rejected landmark input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The landmark slice does not have one point per joint.
    WrongLandmarkCount { expected: usize, actual: usize },
    /// A coordinate is NaN or infinite.
    NonFinite { joint: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLandmarkCount { expected, actual } => {
                write!(f, "expected {expected} landmarks, got {actual}")
            }
            Self::NonFinite { joint } => write!(f, "landmark {joint} has a non-finite coordinate"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Invalid configuration, reported once at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value must be finite and strictly positive.
    NotPositive { field: &'static str, value: f32 },
    /// A value must be finite and zero or greater.
    Negative { field: &'static str, value: f32 },
    /// A value must lie in the given half-open range `(min, max]`.
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    /// A buffer capacity must hold at least `min` samples.
    CapacityTooSmall {
        field: &'static str,
        value: usize,
        min: usize,
    },
    /// A vote threshold cannot exceed the window it votes over.
    VotesExceedCapacity { votes: usize, capacity: usize },
    /// Two key actions are bound to the same key.
    DuplicateKeyBinding { key: char },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be finite and > 0 (got {value})")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must be finite and >= 0 (got {value})")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be in ({min}, {max}] (got {value})"),
            Self::CapacityTooSmall { field, value, min } => {
                write!(f, "{field} must be at least {min} (got {value})")
            }
            Self::VotesExceedCapacity { votes, capacity } => write!(
                f,
                "wave fast-path votes ({votes}) exceed debounce window ({capacity})"
            ),
            Self::DuplicateKeyBinding { key } => write!(f, "key {key:?} is bound twice"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Check that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Check that `value` is finite and not negative.
pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Check that `value` lies in `(min, max]`.
pub(crate) fn ensure_in_range(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && value > min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = FrameError::WrongLandmarkCount {
            expected: 21,
            actual: 3,
        };
        assert_eq!(e.to_string(), "expected 21 landmarks, got 3");

        let e = ConfigError::OutOfRange {
            field: "decay_factor",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(e.to_string(), "decay_factor must be in (0, 1] (got 1.5)");
    }

    #[test]
    fn positive_check() {
        assert!(ensure_positive("x", 0.1).is_ok());
        assert!(ensure_positive("x", 0.0).is_err());
        assert!(ensure_positive("x", f32::NAN).is_err());
        assert!(ensure_positive("x", f32::INFINITY).is_err());
    }

    #[test]
    fn non_negative_check() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -0.01).is_err());
    }

    #[test]
    fn range_check_is_half_open() {
        assert!(ensure_in_range("x", 1.0, 0.0, 1.0).is_ok());
        assert!(ensure_in_range("x", 0.0, 0.0, 1.0).is_err());
    }
}
