#![forbid(unsafe_code)]

//! Input arbitration: one rotation velocity from many sources.
//!
//! Three sources can drive the spin (pointer drag, rotate keys, hand wave)
//! and one can override the hand gesture (the grab key). Each render tick
//! combines them in a fixed precedence:
//!
//! | step | source            | effect                                               |
//! |------|-------------------|------------------------------------------------------|
//! | 1    | grab key held     | effective gesture forced to `point_up`               |
//! | 2    | pointer drag      | `v = dx / tick_ms × drag_velocity_scale`             |
//! | 3    | rotate keys held  | `v ± key_rotate_step`                                |
//! | 4    | asserted wave     | `v += hand_velocity × wave_velocity_scale`           |
//! | 5    | nothing active    | `v *= decay_factor`                                  |
//! | 6    | always            | clamp to `±max_rotation_velocity`                    |
//! | 7    | item focused      | `v = 0`                                              |
//!
//! Drag deltas also rotate the view immediately, between ticks, so dragging
//! feels attached to the pointer.
//!
//! # Invariants
//!
//! 1. After every tick `|rotation_velocity| <= max_rotation_velocity`.
//! 2. While an item is focused the velocity is exactly `0.0`.
//! 3. Decay applies at most once per tick and never reaches exactly zero
//!    from a non-zero start.

use std::time::Duration;

use bitflags::bitflags;

use crate::error::{ConfigError, ensure_in_range, ensure_non_negative, ensure_positive};
use crate::event::{HeldActions, KeyAction};
use crate::gesture::GestureLabel;
use crate::phase::InteractionPhase;

bitflags! {
    /// Rotation sources that contributed during a tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ActiveInputs: u8 {
        /// Pointer held or moved since the last tick.
        const DRAG = 0b001;
        /// A rotate key was held.
        const KEYS = 0b010;
        /// The effective gesture was `wave`.
        const WAVE = 0b100;
    }
}

/// Tuning for the arbiter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArbiterConfig {
    /// Immediate view rotation per dragged pixel, in radians.
    /// Default: 0.005
    pub drag_angle_per_px: f32,

    /// Scale from dragged pixels per millisecond to velocity.
    /// Default: 5.0
    pub drag_velocity_scale: f32,

    /// Velocity added per tick while a rotate key is held.
    /// Default: 2.0
    pub key_rotate_step: f32,

    /// Scale from wrist velocity to rotation velocity while waving.
    /// Default: 15.0
    pub wave_velocity_scale: f32,

    /// Wrist velocities at or below this magnitude are ignored.
    /// Default: 0.005
    pub wave_deadband: f32,

    /// Per-tick multiplier applied when no source is active. Must be in (0, 1].
    /// Default: 0.96
    pub decay_factor: f32,

    /// Symmetric velocity clamp.
    /// Default: 10.0
    pub max_rotation_velocity: f32,

    /// Idle spin in the expanded phase, in radians per second.
    /// Default: 0.1
    pub base_spin: f32,

    /// Fraction of the remaining view angle removed per tick in the compact
    /// phase. Must be in (0, 1].
    /// Default: 0.1
    pub compact_return_rate: f32,
}

impl ArbiterConfig {
    /// Check every tuning value.
    ///
    /// # Errors
    ///
    /// Returns the first value that is non-finite or outside its range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("arbiter.drag_angle_per_px", self.drag_angle_per_px)?;
        ensure_positive("arbiter.drag_velocity_scale", self.drag_velocity_scale)?;
        ensure_positive("arbiter.key_rotate_step", self.key_rotate_step)?;
        ensure_positive("arbiter.wave_velocity_scale", self.wave_velocity_scale)?;
        ensure_non_negative("arbiter.wave_deadband", self.wave_deadband)?;
        ensure_in_range("arbiter.decay_factor", self.decay_factor, 0.0, 1.0)?;
        ensure_positive("arbiter.max_rotation_velocity", self.max_rotation_velocity)?;
        ensure_non_negative("arbiter.base_spin", self.base_spin)?;
        ensure_in_range(
            "arbiter.compact_return_rate",
            self.compact_return_rate,
            0.0,
            1.0,
        )
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            drag_angle_per_px: 0.005,
            drag_velocity_scale: 5.0,
            key_rotate_step: 2.0,
            wave_velocity_scale: 15.0,
            wave_deadband: 0.005,
            decay_factor: 0.96,
            max_rotation_velocity: 10.0,
            base_spin: 0.1,
            compact_return_rate: 0.1,
        }
    }
}

/// Per-tick context supplied by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    /// Time since the previous tick.
    pub dt: Duration,
    /// Effective gesture (after keyboard override).
    pub gesture: GestureLabel,
    /// Latest wrist velocity from the wave tracker.
    pub hand_velocity: f32,
    /// Phase after this tick's transitions were applied.
    pub phase: InteractionPhase,
    /// Whether an item is focused after this tick's focus update.
    pub focused: bool,
}

/// Combines pointer, keyboard and hand input into a rotation velocity and
/// view angle.
#[derive(Debug, Clone)]
pub struct InputArbiter {
    config: ArbiterConfig,
    pointer_down: bool,
    pending_dx: f32,
    held: HeldActions,
    velocity: f32,
    view_angle: f32,
    last_active: ActiveInputs,
}

impl InputArbiter {
    /// Create an idle arbiter.
    #[must_use]
    pub fn new(config: ArbiterConfig) -> Self {
        Self {
            config,
            pointer_down: false,
            pending_dx: 0.0,
            held: HeldActions::empty(),
            velocity: 0.0,
            view_angle: 0.0,
            last_active: ActiveInputs::empty(),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    // --- pointer ---

    /// Pointer pressed.
    pub fn pointer_down(&mut self) {
        self.pointer_down = true;
    }

    /// Pointer released. Movement since the last tick still becomes a flick
    /// on the next tick.
    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    /// Whether the pointer is held.
    #[inline]
    #[must_use]
    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    /// Pointer moved `dx` pixels. Ignored unless the pointer is held.
    pub fn pointer_drag(&mut self, dx: f32) {
        if !self.pointer_down || !dx.is_finite() {
            return;
        }
        self.pending_dx += dx;
        self.view_angle += dx * self.config.drag_angle_per_px;
    }

    // --- keys ---

    /// Mark a holdable action as held. Returns `true` if it was not already.
    pub fn press(&mut self, action: KeyAction) -> bool {
        let Some(flag) = HeldActions::for_action(action) else {
            return false;
        };
        let newly = !self.held.contains(flag);
        self.held.insert(flag);
        newly
    }

    /// Release a holdable action.
    pub fn release(&mut self, action: KeyAction) {
        if let Some(flag) = HeldActions::for_action(action) {
            self.held.remove(flag);
        }
    }

    /// Currently held actions.
    #[inline]
    #[must_use]
    pub fn held(&self) -> HeldActions {
        self.held
    }

    /// Whether the grab key is overriding the hand gesture.
    #[inline]
    #[must_use]
    pub fn keyboard_override(&self) -> bool {
        self.held.contains(HeldActions::GRAB)
    }

    /// Apply the keyboard override to the asserted hand gesture.
    #[must_use]
    pub fn effective_gesture(&self, asserted: GestureLabel) -> GestureLabel {
        if self.keyboard_override() {
            GestureLabel::PointUp
        } else {
            asserted
        }
    }

    // --- tick ---

    /// Combine this tick's inputs into the rotation velocity, then integrate
    /// the view angle. Returns the sources that were active.
    pub fn tick(&mut self, input: TickInput) -> ActiveInputs {
        let cfg = &self.config;
        let mut active = ActiveInputs::empty();
        let mut v = self.velocity;

        if self.pointer_down || self.pending_dx != 0.0 {
            active |= ActiveInputs::DRAG;
            let tick_ms = input.dt.as_secs_f32() * 1000.0;
            if tick_ms > 0.0 {
                v = self.pending_dx / tick_ms * cfg.drag_velocity_scale;
            }
            self.pending_dx = 0.0;
        }

        let left = self.held.contains(HeldActions::ROTATE_LEFT);
        let right = self.held.contains(HeldActions::ROTATE_RIGHT);
        if left || right {
            active |= ActiveInputs::KEYS;
            if left {
                v -= cfg.key_rotate_step;
            }
            if right {
                v += cfg.key_rotate_step;
            }
        }

        if input.gesture == GestureLabel::Wave {
            active |= ActiveInputs::WAVE;
            if input.hand_velocity.abs() > cfg.wave_deadband {
                v += input.hand_velocity * cfg.wave_velocity_scale;
            }
        }

        if active.is_empty() {
            v *= cfg.decay_factor;
        }

        let max = cfg.max_rotation_velocity;
        v = if v.is_finite() { v.clamp(-max, max) } else { 0.0 };

        if input.focused {
            v = 0.0;
        }
        self.velocity = v;

        let dt = input.dt.as_secs_f32();
        match input.phase {
            InteractionPhase::Expanded => {
                if !input.focused && input.gesture != GestureLabel::PointUp {
                    self.view_angle += (cfg.base_spin + v) * dt;
                }
            }
            InteractionPhase::Compact => {
                self.view_angle -= self.view_angle * cfg.compact_return_rate;
            }
        }

        if active != self.last_active {
            crate::trace!(active = ?active, velocity = v, "rotation sources changed");
        }
        self.last_active = active;
        active
    }

    /// Current rotation velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Current view angle in radians.
    #[inline]
    #[must_use]
    pub fn view_angle(&self) -> f32 {
        self.view_angle
    }

    /// Sources active on the last tick.
    #[inline]
    #[must_use]
    pub fn last_active(&self) -> ActiveInputs {
        self.last_active
    }

    /// Force the velocity to zero immediately.
    pub fn stop(&mut self) {
        self.velocity = 0.0;
    }
}

impl Default for InputArbiter {
    fn default() -> Self {
        Self::new(ArbiterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn input(gesture: GestureLabel) -> TickInput {
        TickInput {
            dt: FRAME,
            gesture,
            hand_velocity: 0.0,
            phase: InteractionPhase::Compact,
            focused: false,
        }
    }

    fn idle() -> TickInput {
        input(GestureLabel::None)
    }

    #[test]
    fn drag_rotates_immediately_and_sets_velocity() {
        let mut a = InputArbiter::default();
        a.pointer_down();
        a.pointer_drag(20.0);
        assert!((a.view_angle() - 0.1).abs() < 1e-6);

        let active = a.tick(TickInput {
            phase: InteractionPhase::Expanded,
            ..idle()
        });
        assert_eq!(active, ActiveInputs::DRAG);
        assert!((a.velocity() - 20.0 / 16.0 * 5.0).abs() < 1e-4);
    }

    #[test]
    fn drag_without_pointer_is_ignored() {
        let mut a = InputArbiter::default();
        a.pointer_drag(50.0);
        assert_eq!(a.view_angle(), 0.0);
        assert!(a.tick(idle()).is_empty());
    }

    #[test]
    fn held_pointer_without_motion_stops_and_blocks_decay() {
        let mut a = InputArbiter::default();
        a.press(KeyAction::RotateRight);
        a.tick(idle());
        a.release(KeyAction::RotateRight);
        assert!(a.velocity() > 0.0);

        a.pointer_down();
        assert_eq!(a.tick(idle()), ActiveInputs::DRAG);
        assert_eq!(a.velocity(), 0.0);
    }

    #[test]
    fn flick_after_release_carries_momentum() {
        let mut a = InputArbiter::default();
        a.pointer_down();
        a.pointer_drag(16.0);
        a.pointer_up();
        assert_eq!(a.tick(idle()), ActiveInputs::DRAG);
        assert!((a.velocity() - 5.0).abs() < 1e-4);
        assert!(a.tick(idle()).is_empty());
        assert!((a.velocity() - 4.8).abs() < 1e-4);
    }

    #[test]
    fn rotate_keys_accumulate_per_tick() {
        let mut a = InputArbiter::default();
        assert!(a.press(KeyAction::RotateLeft));
        assert!(!a.press(KeyAction::RotateLeft), "auto-repeat is a no-op");
        a.tick(idle());
        a.tick(idle());
        assert!((a.velocity() + 4.0).abs() < 1e-6);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut a = InputArbiter::default();
        a.press(KeyAction::RotateLeft);
        a.press(KeyAction::RotateRight);
        assert_eq!(a.tick(idle()), ActiveInputs::KEYS);
        assert_eq!(a.velocity(), 0.0);
    }

    #[test]
    fn wave_adds_scaled_hand_velocity() {
        let mut a = InputArbiter::default();
        let active = a.tick(TickInput {
            hand_velocity: 0.02,
            ..input(GestureLabel::Wave)
        });
        assert_eq!(active, ActiveInputs::WAVE);
        assert!((a.velocity() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn wave_deadband_ignores_jitter_but_blocks_decay() {
        let mut a = InputArbiter::default();
        a.press(KeyAction::RotateRight);
        a.tick(idle());
        a.release(KeyAction::RotateRight);

        a.tick(TickInput {
            hand_velocity: 0.004,
            ..input(GestureLabel::Wave)
        });
        assert_eq!(a.velocity(), 2.0);
    }

    #[test]
    fn decay_is_geometric() {
        let mut a = InputArbiter::default();
        a.press(KeyAction::RotateRight);
        a.tick(idle());
        a.release(KeyAction::RotateRight);

        for _ in 0..10 {
            a.tick(idle());
        }
        let expected = 2.0 * 0.96f32.powi(10);
        assert!((a.velocity() - expected).abs() < 1e-4);
        assert!(a.velocity() > 0.0);
    }

    #[test]
    fn velocity_is_clamped() {
        let mut a = InputArbiter::default();
        a.pointer_down();
        a.pointer_drag(10_000.0);
        a.tick(idle());
        assert_eq!(a.velocity(), 10.0);

        a.pointer_drag(-10_000.0);
        a.tick(idle());
        assert_eq!(a.velocity(), -10.0);
    }

    #[test]
    fn focus_is_a_hard_stop() {
        let mut a = InputArbiter::default();
        a.press(KeyAction::RotateRight);
        a.tick(TickInput {
            focused: true,
            ..idle()
        });
        assert_eq!(a.velocity(), 0.0);
    }

    #[test]
    fn grab_overrides_gesture() {
        let mut a = InputArbiter::default();
        assert_eq!(a.effective_gesture(GestureLabel::Fist), GestureLabel::Fist);
        a.press(KeyAction::Grab);
        assert!(a.keyboard_override());
        assert_eq!(
            a.effective_gesture(GestureLabel::Fist),
            GestureLabel::PointUp
        );
        a.release(KeyAction::Grab);
        assert!(!a.keyboard_override());
    }

    #[test]
    fn expand_and_collapse_are_not_held() {
        let mut a = InputArbiter::default();
        assert!(!a.press(KeyAction::Expand));
        assert!(a.held().is_empty());
    }

    #[test]
    fn expanded_view_spins() {
        let mut a = InputArbiter::default();
        a.tick(TickInput {
            dt: Duration::from_secs(1),
            phase: InteractionPhase::Expanded,
            ..idle()
        });
        assert!((a.view_angle() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn expanded_view_holds_while_pointing() {
        let mut a = InputArbiter::default();
        a.tick(TickInput {
            dt: Duration::from_secs(1),
            phase: InteractionPhase::Expanded,
            ..input(GestureLabel::PointUp)
        });
        assert_eq!(a.view_angle(), 0.0);
    }

    #[test]
    fn compact_view_returns_to_zero() {
        let mut a = InputArbiter::default();
        a.pointer_down();
        a.pointer_drag(200.0);
        a.pointer_up();
        let start = a.view_angle();
        assert!((start - 1.0).abs() < 1e-6);

        a.tick(idle());
        assert!((a.view_angle() - 0.9).abs() < 1e-5);
        for _ in 0..200 {
            a.tick(idle());
        }
        assert!(a.view_angle().abs() < 1e-6);
    }

    #[test]
    fn config_validation() {
        assert!(ArbiterConfig::default().validate().is_ok());
        let bad = ArbiterConfig {
            decay_factor: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::OutOfRange {
                field: "arbiter.decay_factor",
                ..
            })
        ));
        let bad = ArbiterConfig {
            wave_deadband: -0.1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
