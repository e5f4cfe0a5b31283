#![forbid(unsafe_code)]

//! Wrist motion tracking.
//!
//! Keeps a short FIFO of wrist x positions (capacity 15). Two signals come
//! out of it:
//!
//! - **velocity**: last sample minus the previous one (zero on the first
//!   sample). The arbiter turns this into rotation while waving.
//! - **range**: max − min over the window. The classifier uses it to
//!   upgrade an open hand to a wave.

use std::collections::VecDeque;

use crate::error::ConfigError;

/// Configuration for the wave tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WaveConfig {
    /// Number of wrist samples kept.
    /// Default: 15
    pub capacity: usize,
}

impl WaveConfig {
    /// Check the window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot hold two samples, since
    /// velocity needs a previous sample.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 2 {
            return Err(ConfigError::CapacityTooSmall {
                field: "wave.capacity",
                value: self.capacity,
                min: 2,
            });
        }
        Ok(())
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self { capacity: 15 }
    }
}

/// Fixed-capacity wrist-x history with velocity and range queries.
#[derive(Debug, Clone)]
pub struct WaveTracker {
    samples: VecDeque<f32>,
    capacity: usize,
    velocity: f32,
}

impl WaveTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(config: &WaveConfig) -> Self {
        Self {
            samples: VecDeque::with_capacity(config.capacity),
            capacity: config.capacity,
            velocity: 0.0,
        }
    }

    /// Record a wrist x position and return the new velocity.
    pub fn push(&mut self, x: f32) -> f32 {
        let prev = self.samples.back().copied().unwrap_or(x);
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(x);
        self.velocity = x - prev;
        self.velocity
    }

    /// Signed per-frame horizontal velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Horizontal range (max − min) over the window; 0 when empty.
    #[must_use]
    pub fn range(&self) -> f32 {
        let mut iter = self.samples.iter().copied();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
        max - min
    }

    /// Number of samples in the window.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Zero the instantaneous velocity, keeping history.
    ///
    /// Used for frames with no hand: motion history is frozen rather than
    /// polluted with placeholder samples.
    pub fn hold(&mut self) {
        self.velocity = 0.0;
    }

    /// Drop all history.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.velocity = 0.0;
    }
}

impl Default for WaveTracker {
    fn default() -> Self {
        Self::new(&WaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_has_zero_velocity() {
        let mut w = WaveTracker::default();
        assert_eq!(w.push(0.4), 0.0);
        assert_eq!(w.range(), 0.0);
    }

    #[test]
    fn velocity_is_difference_of_last_two() {
        let mut w = WaveTracker::default();
        w.push(0.4);
        w.push(0.45);
        let v = w.push(0.42);
        assert!((v - (-0.03)).abs() < 1e-6);
        assert_eq!(w.velocity(), v);
    }

    #[test]
    fn range_spans_window() {
        let mut w = WaveTracker::default();
        for x in [0.5, 0.3, 0.6, 0.4] {
            w.push(x);
        }
        assert!((w.range() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn old_samples_fall_out_of_range() {
        let mut w = WaveTracker::new(&WaveConfig { capacity: 3 });
        w.push(0.0);
        w.push(0.5);
        w.push(0.5);
        w.push(0.5);
        assert_eq!(w.len(), 3);
        assert_eq!(w.range(), 0.0);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut w = WaveTracker::default();
        for i in 0..100 {
            w.push(i as f32 * 0.01);
            assert!(w.len() <= 15);
        }
    }

    #[test]
    fn hold_keeps_history() {
        let mut w = WaveTracker::default();
        w.push(0.2);
        w.push(0.4);
        w.hold();
        assert_eq!(w.velocity(), 0.0);
        assert!((w.range() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_everything() {
        let mut w = WaveTracker::default();
        w.push(0.2);
        w.push(0.4);
        w.reset();
        assert!(w.is_empty());
        assert_eq!(w.velocity(), 0.0);
    }

    #[test]
    fn tiny_window_is_rejected() {
        assert!(WaveConfig { capacity: 1 }.validate().is_err());
        assert!(WaveConfig::default().validate().is_ok());
    }
}
