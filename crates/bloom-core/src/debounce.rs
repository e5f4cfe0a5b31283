#![forbid(unsafe_code)]

//! Temporal debouncing of raw gesture labels.
//!
//! Landmark detection is noisy: a held fist will occasionally classify as
//! `none` or `open` for a single frame. The debouncer absorbs that flicker
//! with sliding-window voting so downstream consumers only see a gesture once
//! it is stable.
//!
//! # Algorithm
//!
//! Each raw label is pushed into a FIFO window (capacity 5, oldest evicted
//! first). The raw label becomes the asserted gesture when either:
//!
//! - the window is full and every entry equals it (unanimous), or
//! - it is `wave` and at least `wave_votes` (2) window entries are `wave`.
//!
//! Wave gets the fast path because it is itself a temporal signal; requiring
//! five unanimous frames would make it feel sluggish. No other label is
//! relaxed. When neither rule fires the previous asserted gesture stays.
//!
//! # Invariants
//!
//! 1. The window never holds more than `capacity` labels.
//! 2. A non-wave label is asserted no earlier than the `capacity`-th
//!    consecutive frame carrying it.
//! 3. The asserted gesture only changes inside [`GestureDebouncer::push`]
//!    or [`GestureDebouncer::reset`].

use std::collections::VecDeque;

use crate::error::ConfigError;
use crate::gesture::GestureLabel;

/// Configuration for gesture debouncing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebounceConfig {
    /// Window length; also the unanimous-agreement length.
    /// Default: 5
    pub capacity: usize,

    /// Wave entries needed in the window for the wave fast path.
    /// Default: 2
    pub wave_votes: usize,
}

impl DebounceConfig {
    /// Check the window and vote sizes.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty window, a zero vote count, or more
    /// votes than the window holds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 1 {
            return Err(ConfigError::CapacityTooSmall {
                field: "debounce.capacity",
                value: self.capacity,
                min: 1,
            });
        }
        if self.wave_votes < 1 {
            return Err(ConfigError::CapacityTooSmall {
                field: "debounce.wave_votes",
                value: self.wave_votes,
                min: 1,
            });
        }
        if self.wave_votes > self.capacity {
            return Err(ConfigError::VotesExceedCapacity {
                votes: self.wave_votes,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            wave_votes: 2,
        }
    }
}

/// Fixed-capacity FIFO of recent raw labels.
#[derive(Debug, Clone)]
pub struct GestureBuffer {
    labels: VecDeque<GestureLabel>,
    capacity: usize,
}

impl GestureBuffer {
    /// Create an empty buffer holding at most `capacity` labels.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            labels: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a label, evicting the oldest one first when full.
    pub fn push(&mut self, label: GestureLabel) {
        if self.labels.len() == self.capacity {
            self.labels.pop_front();
        }
        self.labels.push_back(label);
    }

    /// Number of buffered labels.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether the buffer holds `capacity` labels.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.labels.len() == self.capacity
    }

    /// Count of entries equal to `label`.
    #[must_use]
    pub fn count(&self, label: GestureLabel) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Whether the buffer is full and every entry equals `label`.
    #[must_use]
    pub fn unanimous(&self, label: GestureLabel) -> bool {
        self.is_full() && self.labels.iter().all(|&l| l == label)
    }

    /// Buffered labels, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = GestureLabel> + '_ {
        self.labels.iter().copied()
    }

    /// Drop every buffered label.
    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

/// Sticky, vote-based gesture debouncer.
///
/// Feed raw labels via [`push`](GestureDebouncer::push) and read the stable
/// gesture from [`asserted`](GestureDebouncer::asserted).
#[derive(Debug, Clone)]
pub struct GestureDebouncer {
    config: DebounceConfig,
    buffer: GestureBuffer,
    asserted: GestureLabel,
    /// Diagnostic: total asserted-gesture changes.
    switches: u64,
}

impl GestureDebouncer {
    /// Create a debouncer. The initial asserted gesture is `None`.
    #[must_use]
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            buffer: GestureBuffer::new(config.capacity),
            config,
            asserted: GestureLabel::None,
            switches: 0,
        }
    }

    /// Push one raw label and return the asserted gesture.
    ///
    /// Returns `(asserted, changed)` where `changed` is true when this push
    /// switched the asserted gesture.
    pub fn push(&mut self, raw: GestureLabel) -> (GestureLabel, bool) {
        self.buffer.push(raw);

        let wins = self.buffer.unanimous(raw)
            || (raw == GestureLabel::Wave
                && self.buffer.count(GestureLabel::Wave) >= self.config.wave_votes);

        let changed = wins && raw != self.asserted;
        if changed {
            crate::debug!(from = %self.asserted, to = %raw, "asserted gesture changed");
            self.asserted = raw;
            self.switches += 1;
        }
        (self.asserted, changed)
    }

    /// The currently asserted gesture.
    #[inline]
    #[must_use]
    pub fn asserted(&self) -> GestureLabel {
        self.asserted
    }

    /// The raw-label window.
    #[must_use]
    pub fn buffer(&self) -> &GestureBuffer {
        &self.buffer
    }

    /// Clear history and assert `None`.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.asserted = GestureLabel::None;
    }

    /// Number of asserted-gesture changes (diagnostic, survives reset).
    #[inline]
    #[must_use]
    pub fn switch_count(&self) -> u64 {
        self.switches
    }

    /// Get a reference to the current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }
}

impl Default for GestureDebouncer {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GestureLabel::*;

    fn debouncer() -> GestureDebouncer {
        GestureDebouncer::default()
    }

    // --- Buffer tests ---

    #[test]
    fn buffer_evicts_oldest() {
        let mut buf = GestureBuffer::new(3);
        for g in [Open, Fist, Wave, PointUp] {
            buf.push(g);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.iter().collect::<Vec<_>>(), vec![Fist, Wave, PointUp]);
    }

    #[test]
    fn unanimous_requires_full_buffer() {
        let mut buf = GestureBuffer::new(3);
        buf.push(Open);
        buf.push(Open);
        assert!(!buf.unanimous(Open));
        buf.push(Open);
        assert!(buf.unanimous(Open));
    }

    // --- Debouncer tests ---

    #[test]
    fn initial_state_is_none() {
        let d = debouncer();
        assert_eq!(d.asserted(), None);
        assert_eq!(d.switch_count(), 0);
    }

    #[test]
    fn five_identical_labels_assert_on_fifth() {
        let mut d = debouncer();
        for i in 1..=4 {
            let (g, changed) = d.push(Fist);
            assert_eq!(g, None, "asserted early at frame {i}");
            assert!(!changed);
        }
        let (g, changed) = d.push(Fist);
        assert_eq!(g, Fist);
        assert!(changed);
    }

    #[test]
    fn single_frame_glitch_does_not_flicker() {
        let mut d = debouncer();
        for _ in 0..5 {
            d.push(Open);
        }
        assert_eq!(d.asserted(), Open);
        d.push(None);
        assert_eq!(d.asserted(), Open);
        for _ in 0..4 {
            d.push(Open);
            assert_eq!(d.asserted(), Open);
        }
    }

    #[test]
    fn previous_gesture_is_sticky() {
        let mut d = debouncer();
        for _ in 0..5 {
            d.push(Open);
        }
        // Alternating noise never reaches unanimity.
        for i in 0..20 {
            d.push(if i % 2 == 0 { Fist } else { PointUp });
        }
        assert_eq!(d.asserted(), Open);
    }

    #[test]
    fn wave_fast_path_on_second_vote() {
        let mut d = debouncer();
        for _ in 0..5 {
            d.push(Open);
        }
        let (g, _) = d.push(Wave);
        assert_eq!(g, Open, "one wave vote is not enough");
        let (g, changed) = d.push(Wave);
        assert_eq!(g, Wave);
        assert!(changed);
    }

    #[test]
    fn wave_fast_path_with_gap() {
        let mut d = debouncer();
        d.push(Wave);
        d.push(Open);
        d.push(Open);
        let (g, _) = d.push(Wave);
        assert_eq!(g, Wave);
    }

    #[test]
    fn wave_vote_outside_window_does_not_count() {
        let mut d = debouncer();
        d.push(Wave);
        for _ in 0..5 {
            d.push(Open);
        }
        assert_eq!(d.asserted(), Open);
        let (g, _) = d.push(Wave);
        assert_eq!(g, Open);
    }

    #[test]
    fn fast_path_only_for_wave() {
        let mut d = debouncer();
        d.push(Fist);
        d.push(Fist);
        d.push(Fist);
        assert_eq!(d.asserted(), None);
    }

    #[test]
    fn reset_clears_history() {
        let mut d = debouncer();
        for _ in 0..5 {
            d.push(Fist);
        }
        d.reset();
        assert_eq!(d.asserted(), None);
        assert!(d.buffer().is_empty());
        // switch count is NOT cleared by reset (it's a diagnostic counter)
        assert_eq!(d.switch_count(), 1);
    }

    #[test]
    fn repeated_assertion_is_not_a_change() {
        let mut d = debouncer();
        for _ in 0..5 {
            d.push(Open);
        }
        let (_, changed) = d.push(Open);
        assert!(!changed);
        assert_eq!(d.switch_count(), 1);
    }

    // --- Config tests ---

    #[test]
    fn default_config_values() {
        let c = DebounceConfig::default();
        assert_eq!(c.capacity, 5);
        assert_eq!(c.wave_votes, 2);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn votes_cannot_exceed_window() {
        let c = DebounceConfig {
            capacity: 3,
            wave_votes: 4,
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::VotesExceedCapacity {
                votes: 4,
                capacity: 3
            })
        );
    }

    #[test]
    fn debug_format() {
        let d = debouncer();
        let dbg = format!("{:?}", d);
        assert!(dbg.contains("GestureDebouncer"));
    }
}
