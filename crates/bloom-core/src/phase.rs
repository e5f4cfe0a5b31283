#![forbid(unsafe_code)]

//! Interaction phase state machine.
//!
//! Two phases: `Compact` (the tree) and `Expanded` (the photo nebula).
//!
//! ```text
//!            open edge, idle                  transition done
//!  Compact ───────────────────▶ [→Expanded] ───────────────────▶ Expanded
//!     ▲                                                              │
//!     │        transition done                  fist edge, idle      │
//!     └────────────────────────── [→Compact] ◀───────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. Gesture-driven transitions fire on the *edge* into `open` / `fist`,
//!    compared against the gesture seen on the previous tick. Holding a
//!    gesture never re-fires.
//! 2. While a transition is in flight every phase request is ignored.
//! 3. The phase value only changes when a transition completes.

use std::fmt;
use std::time::Duration;

use crate::animation::{Easing, TransitionClock};
use crate::error::ConfigError;
use crate::gesture::GestureLabel;
use crate::snapshot::TransitionView;

/// High-level display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InteractionPhase {
    /// The closed tree.
    #[default]
    Compact,
    /// The bloomed photo nebula.
    Expanded,
}

impl InteractionPhase {
    /// The other phase.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Compact => Self::Expanded,
            Self::Expanded => Self::Compact,
        }
    }
}

impl fmt::Display for InteractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Expanded => "expanded",
        })
    }
}

/// Transition timing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhaseConfig {
    /// Compact → Expanded duration.
    /// Default: 2s
    pub expand_duration: Duration,

    /// Expanded → Compact duration.
    /// Default: 1.5s
    pub collapse_duration: Duration,

    /// Progress curve when blooming.
    /// Default: `OutExpo`
    pub expand_easing: Easing,

    /// Progress curve when closing.
    /// Default: `InOutCubic`
    pub collapse_easing: Easing,
}

impl PhaseConfig {
    /// Check the durations.
    ///
    /// # Errors
    ///
    /// Returns an error if either duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, d) in [
            ("phase.expand_duration", self.expand_duration),
            ("phase.collapse_duration", self.collapse_duration),
        ] {
            if d.is_zero() {
                return Err(ConfigError::NotPositive { field, value: 0.0 });
            }
        }
        Ok(())
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            expand_duration: Duration::from_millis(2000),
            collapse_duration: Duration::from_millis(1500),
            expand_easing: Easing::OutExpo,
            collapse_easing: Easing::InOutCubic,
        }
    }
}

/// Why a transition was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    /// An asserted gesture edge.
    Gesture(GestureLabel),
    /// A keyboard shortcut.
    Key,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    to: InteractionPhase,
    clock: TransitionClock,
}

/// Phase state machine with in-flight transition tracking.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    config: PhaseConfig,
    phase: InteractionPhase,
    transition: Option<Transition>,
    prev_gesture: GestureLabel,
}

impl PhaseMachine {
    /// Create a machine in the `Compact` phase.
    #[must_use]
    pub fn new(config: PhaseConfig) -> Self {
        Self {
            config,
            phase: InteractionPhase::Compact,
            transition: None,
            prev_gesture: GestureLabel::None,
        }
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    /// Whether a transition is in flight.
    #[inline]
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// The in-flight transition, if any.
    #[must_use]
    pub fn transition(&self) -> Option<TransitionView> {
        self.transition.map(|t| TransitionView {
            to: t.to,
            progress: t.clock.progress(),
        })
    }

    /// Gesture observed on the previous [`observe`](Self::observe) call.
    #[inline]
    #[must_use]
    pub fn previous_gesture(&self) -> GestureLabel {
        self.prev_gesture
    }

    /// Advance an in-flight transition.
    ///
    /// Returns the newly entered phase when the transition completes.
    pub fn advance(&mut self, dt: Duration) -> Option<InteractionPhase> {
        let t = self.transition.as_mut()?;
        if !t.clock.advance(dt) {
            return None;
        }
        let to = t.to;
        self.transition = None;
        self.phase = to;
        crate::info!(phase = %to, "phase transition complete");
        Some(to)
    }

    /// Feed this tick's gesture and start a transition on a qualifying edge.
    ///
    /// Returns the target phase when a transition started.
    pub fn observe(&mut self, gesture: GestureLabel) -> Option<InteractionPhase> {
        let prev = std::mem::replace(&mut self.prev_gesture, gesture);
        if gesture == prev {
            return None;
        }
        let target = match (self.phase, gesture) {
            (InteractionPhase::Compact, GestureLabel::Open) => InteractionPhase::Expanded,
            (InteractionPhase::Expanded, GestureLabel::Fist) => InteractionPhase::Compact,
            _ => return None,
        };
        self.request(target, TransitionCause::Gesture(gesture))
            .then_some(target)
    }

    /// Request a transition to `to`.
    ///
    /// Returns `false` (and does nothing) when a transition is already in
    /// flight or the machine is already in `to`.
    pub fn request(&mut self, to: InteractionPhase, cause: TransitionCause) -> bool {
        if self.transition.is_some() || self.phase == to {
            return false;
        }
        let (duration, easing) = match to {
            InteractionPhase::Expanded => (self.config.expand_duration, self.config.expand_easing),
            InteractionPhase::Compact => {
                (self.config.collapse_duration, self.config.collapse_easing)
            }
        };
        self.transition = Some(Transition {
            to,
            clock: TransitionClock::new(duration, easing),
        });
        crate::info!(from = %self.phase, to = %to, cause = ?cause, "phase transition started");
        true
    }

    /// Forget the previous gesture so the next one counts as an edge.
    pub fn forget_gesture(&mut self) {
        self.prev_gesture = GestureLabel::None;
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new(PhaseConfig::default())
    }
}
