#![forbid(unsafe_code)]

//! The read-only state rendering consumes every frame.

use std::fmt;

use crate::arbiter::ActiveInputs;
use crate::gesture::GestureLabel;
use crate::phase::InteractionPhase;

/// Identifier of a photographed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A phase transition in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionView {
    /// Phase entered when the transition completes.
    pub to: InteractionPhase,
    /// Eased progress in [0, 1].
    pub progress: f32,
}

/// Snapshot of the arbitrated interaction state.
///
/// Produced by [`GestureController::snapshot`](crate::GestureController::snapshot)
/// and cheap to copy across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArbitratedState {
    /// Authoritative gesture after keyboard override.
    pub gesture: GestureLabel,
    /// Signed spin velocity, always within the configured clamp.
    pub rotation_velocity: f32,
    /// Accumulated view rotation in radians.
    pub view_angle: f32,
    /// Highlighted item, if any.
    pub focused_id: Option<ItemId>,
    /// Current display phase.
    pub phase: InteractionPhase,
    /// Transition in flight, if any.
    pub transition: Option<TransitionView>,
    /// Whether the grab key is overriding the hand gesture.
    pub keyboard_override: bool,
    /// Rotation sources that were active on the last tick.
    pub active_inputs: ActiveInputs,
}

impl ArbitratedState {
    /// Whether a phase transition is in flight.
    #[inline]
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }
}

impl Default for ArbitratedState {
    fn default() -> Self {
        Self {
            gesture: GestureLabel::None,
            rotation_velocity: 0.0,
            view_angle: 0.0,
            focused_id: None,
            phase: InteractionPhase::Compact,
            transition: None,
            keyboard_override: false,
            active_inputs: ActiveInputs::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle_compact() {
        let s = ArbitratedState::default();
        assert_eq!(s.phase, InteractionPhase::Compact);
        assert_eq!(s.gesture, GestureLabel::None);
        assert_eq!(s.rotation_velocity, 0.0);
        assert!(s.focused_id.is_none());
        assert!(!s.is_transitioning());
    }

    #[test]
    fn item_id_display() {
        assert_eq!(ItemId(42).to_string(), "#42");
    }
}
