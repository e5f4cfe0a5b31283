#![forbid(unsafe_code)]

//! Canonical input events and key bindings.
//!
//! The host's input layer (browser events, a window toolkit, a replay
//! trace) converts whatever it receives into [`InputEvent`]s, or calls the
//! matching [`GestureController`](crate::GestureController) methods directly.
//!
//! # Design Notes
//!
//! - Keys are matched case-insensitively: `Char('A')` and `Char('a')` bind
//!   to the same action.
//! - Pointer drags carry a horizontal pixel delta only; vertical motion
//!   does not affect rotation.
//! - Key auto-repeat is harmless: held keys are tracked as a set, so a
//!   repeated key-down is a no-op.

use bitflags::bitflags;

use crate::error::ConfigError;
use crate::focus::ProjectedItem;
use crate::landmark::LandmarkFrame;
use crate::snapshot::ItemId;

/// Key codes the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Space bar.
    Space,
    /// Escape key.
    Escape,
}

impl KeyCode {
    /// Lowercase character keys so bindings are case-insensitive.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Char(c) => Self::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeyAction {
    /// Spin counter-clockwise while held.
    RotateLeft,
    /// Spin clockwise while held.
    RotateRight,
    /// Act as a `point_up` gesture while held (camera-free focus).
    Grab,
    /// Request the expanded phase.
    Expand,
    /// Request the compact phase.
    Collapse,
}

bitflags! {
    /// Held key actions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeldActions: u8 {
        const ROTATE_LEFT  = 0b001;
        const ROTATE_RIGHT = 0b010;
        const GRAB         = 0b100;
    }
}

impl HeldActions {
    /// The flag tracking a held action, if the action is held at all.
    ///
    /// `Expand` and `Collapse` fire once on key-down and are not tracked.
    #[must_use]
    pub const fn for_action(action: KeyAction) -> Option<Self> {
        match action {
            KeyAction::RotateLeft => Some(Self::ROTATE_LEFT),
            KeyAction::RotateRight => Some(Self::ROTATE_RIGHT),
            KeyAction::Grab => Some(Self::GRAB),
            KeyAction::Expand | KeyAction::Collapse => None,
        }
    }
}

/// Key-to-action table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyBindings {
    bindings: Vec<(KeyCode, KeyAction)>,
}

impl KeyBindings {
    /// An empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding (builder). Later bindings for the same key win.
    #[must_use]
    pub fn bind(mut self, key: KeyCode, action: KeyAction) -> Self {
        let key = key.normalized();
        self.bindings.retain(|(k, _)| *k != key);
        self.bindings.push((key, action));
        self
    }

    /// Look up the action bound to `key`.
    #[must_use]
    pub fn action(&self, key: KeyCode) -> Option<KeyAction> {
        let key = key.normalized();
        self.bindings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, action)| action)
    }

    /// All bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (KeyCode, KeyAction)> + '_ {
        self.bindings.iter().copied()
    }

    /// Check that no key is bound twice.
    ///
    /// Tables built with [`bind`](Self::bind) are always valid; this catches
    /// tables loaded from configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKeyBinding`] naming the first repeat.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, (key, _)) in self.bindings.iter().enumerate() {
            let key = key.normalized();
            if self.bindings[..i].iter().any(|(k, _)| k.normalized() == key) {
                let ch = match key {
                    KeyCode::Char(c) => c,
                    KeyCode::Left => '←',
                    KeyCode::Right => '→',
                    KeyCode::Space => ' ',
                    KeyCode::Escape => '\u{1b}',
                };
                return Err(ConfigError::DuplicateKeyBinding { key: ch });
            }
        }
        Ok(())
    }
}

impl Default for KeyBindings {
    /// `a`/`d` and the arrow keys rotate, `p` grabs, `o` expands, `f` collapses.
    fn default() -> Self {
        Self::empty()
            .bind(KeyCode::Char('a'), KeyAction::RotateLeft)
            .bind(KeyCode::Char('d'), KeyAction::RotateRight)
            .bind(KeyCode::Left, KeyAction::RotateLeft)
            .bind(KeyCode::Right, KeyAction::RotateRight)
            .bind(KeyCode::Char('p'), KeyAction::Grab)
            .bind(KeyCode::Char('o'), KeyAction::Expand)
            .bind(KeyCode::Char('f'), KeyAction::Collapse)
    }
}

/// One input delivered to the controller.
///
/// Mirrors the controller's entry points one-to-one so hosts and replay
/// traces can drive it through a single [`handle`](crate::GestureController::handle).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum InputEvent {
    /// A processed video frame; `None` when no hand was detected.
    Landmarks { frame: Option<LandmarkFrame> },
    /// Pointer (mouse / touch) pressed.
    PointerDown,
    /// Pointer released.
    PointerUp,
    /// Pointer moved by `dx` pixels while held.
    PointerDrag { dx: f32 },
    /// Key pressed (or auto-repeated).
    KeyDown { key: KeyCode },
    /// Key released.
    KeyUp { key: KeyCode },
    /// Render tick of `dt_ms` milliseconds.
    Tick { dt_ms: f32 },
    /// A photographed item now exists.
    AddItem { id: ItemId },
    /// A photographed item was deleted.
    RemoveItem { id: ItemId },
    /// An item was clicked.
    ClickItem { id: ItemId },
    /// Rendering reprojected the items.
    UpdateProjections { projections: Vec<ProjectedItem> },
    /// The landmark source (camera) stopped.
    SourceStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action(KeyCode::Char('a')), Some(KeyAction::RotateLeft));
        assert_eq!(keys.action(KeyCode::Char('d')), Some(KeyAction::RotateRight));
        assert_eq!(keys.action(KeyCode::Left), Some(KeyAction::RotateLeft));
        assert_eq!(keys.action(KeyCode::Char('p')), Some(KeyAction::Grab));
        assert_eq!(keys.action(KeyCode::Char('o')), Some(KeyAction::Expand));
        assert_eq!(keys.action(KeyCode::Char('f')), Some(KeyAction::Collapse));
        assert_eq!(keys.action(KeyCode::Char('z')), None);
        assert!(keys.validate().is_ok());
    }

    #[test]
    fn bindings_are_case_insensitive() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action(KeyCode::Char('P')), Some(KeyAction::Grab));
    }

    #[test]
    fn rebinding_replaces() {
        let keys = KeyBindings::default().bind(KeyCode::Char('A'), KeyAction::Grab);
        assert_eq!(keys.action(KeyCode::Char('a')), Some(KeyAction::Grab));
        assert_eq!(keys.iter().filter(|(k, _)| *k == KeyCode::Char('a')).count(), 1);
    }

    #[test]
    fn duplicate_binding_rejected() {
        let keys = KeyBindings {
            bindings: vec![
                (KeyCode::Char('x'), KeyAction::Grab),
                (KeyCode::Char('X'), KeyAction::Expand),
            ],
        };
        assert_eq!(
            keys.validate(),
            Err(ConfigError::DuplicateKeyBinding { key: 'x' })
        );
    }

    #[test]
    fn held_flags_only_for_holdable_actions() {
        assert_eq!(
            HeldActions::for_action(KeyAction::Grab),
            Some(HeldActions::GRAB)
        );
        assert_eq!(HeldActions::for_action(KeyAction::Expand), None);
    }
}
