#![forbid(unsafe_code)]

//! Transition timing and easing curves.
//!
//! The core does not animate geometry. It only needs to know whether a
//! phase transition is still running and how far along it is; rendering
//! reads the eased progress from [`TransitionView`](crate::snapshot::TransitionView)
//! and interpolates particles and photos with it.

use std::time::Duration;

/// Shape of a transition's progress curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Easing {
    /// Constant rate.
    #[default]
    Linear,
    /// Fast burst, long settle. Suits the tree blooming open.
    OutExpo,
    /// Slow at both ends. Suits the nebula folding back into the tree.
    InOutCubic,
}

impl Easing {
    /// Map linear progress `t` to eased progress. Both are in `[0, 1]`;
    /// `t` is clamped first.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutExpo if t >= 1.0 => 1.0,
            Self::OutExpo => 1.0 - 2f32.powf(-10.0 * t),
            Self::InOutCubic if t < 0.5 => 4.0 * t * t * t,
            Self::InOutCubic => 1.0 - (2.0 - 2.0 * t).powi(3) / 2.0,
        }
    }
}

/// Elapsed-time clock for one transition.
///
/// Elapsed time accumulates as a [`Duration`], so many small render ticks
/// add up exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionClock {
    elapsed: Duration,
    duration: Duration,
    easing: Easing,
}

impl TransitionClock {
    /// Start a clock. A zero `duration` finishes on the first nonzero tick.
    #[must_use]
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: duration.max(Duration::from_nanos(1)),
            easing,
        }
    }

    /// Add `dt` and report whether the clock has run out.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.is_done()
    }

    /// Whether the full duration has elapsed.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Progress before easing.
    #[must_use]
    pub fn linear_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }

    /// Eased progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.easing.apply(self.linear_progress())
    }

    /// Time left until the clock runs out.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const CURVES: [Easing; 3] = [Easing::Linear, Easing::OutExpo, Easing::InOutCubic];

    #[test]
    fn curves_pin_endpoints() {
        for e in CURVES {
            assert_eq!(e.apply(0.0), 0.0, "{e:?}");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e:?}");
        }
    }

    #[test]
    fn curves_clamp_input() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::OutExpo.apply(2.0), 1.0);
        assert_eq!(Easing::InOutCubic.apply(5.0), 1.0);
    }

    #[test]
    fn out_expo_front_loads() {
        assert!(Easing::OutExpo.apply(0.2) > 0.7);
    }

    #[test]
    fn in_out_cubic_crosses_half_at_midpoint() {
        assert!((Easing::InOutCubic.apply(0.5) - 0.5).abs() < 1e-6);
        assert!(Easing::InOutCubic.apply(0.25) < 0.25);
    }

    #[test]
    fn curves_are_monotonic() {
        for e in CURVES {
            let mut last = 0.0;
            for i in 0..=100 {
                let v = e.apply(i as f32 / 100.0);
                assert!(v >= last, "{e:?} dips at {i}");
                last = v;
            }
        }
    }

    #[test]
    fn clock_runs_out_after_duration() {
        let mut clock = TransitionClock::new(MS_100, Easing::Linear);
        assert!(!clock.advance(Duration::from_millis(60)));
        assert!((clock.progress() - 0.6).abs() < 1e-4);
        assert_eq!(clock.remaining(), Duration::from_millis(40));
        assert!(clock.advance(Duration::from_millis(40)));
        assert_eq!(clock.progress(), 1.0);
        assert_eq!(clock.remaining(), Duration::ZERO);
    }

    #[test]
    fn clock_applies_easing() {
        let mut clock = TransitionClock::new(MS_100, Easing::OutExpo);
        clock.advance(Duration::from_millis(50));
        assert!(clock.progress() > clock.linear_progress());
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut clock = TransitionClock::new(Duration::ZERO, Easing::Linear);
        assert!(!clock.is_done());
        assert!(clock.advance(Duration::from_nanos(1)));
    }
}
