#![forbid(unsafe_code)]

//! The orchestrating controller.
//!
//! [`GestureController`] owns every component and has two independent
//! cadences:
//!
//! - **video frames** ([`process_landmark_frame`](GestureController::process_landmark_frame)):
//!   wave tracking, classification and debouncing. Typically 15–30 Hz.
//! - **render ticks** ([`tick`](GestureController::tick)): keyboard
//!   override, phase transitions, focus and rotation. Typically 60 Hz.
//!
//! The two only meet through controller state: a tick reads whatever
//! gesture and hand velocity the latest frame left behind.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bloom_core::{BloomConfig, GestureController, GestureLabel, InteractionPhase};
//! use bloom_core::synthetic;
//!
//! let mut ctl = GestureController::new(BloomConfig::default()).unwrap();
//! for _ in 0..5 {
//!     ctl.process_landmark_frame(Some(&synthetic::open_hand(0.5)));
//! }
//! let state = ctl.tick(Duration::from_millis(16));
//! assert_eq!(state.gesture, GestureLabel::Open);
//! assert!(state.is_transitioning());
//!
//! for _ in 0..130 {
//!     ctl.tick(Duration::from_millis(16));
//! }
//! assert_eq!(ctl.snapshot().phase, InteractionPhase::Expanded);
//! ```

use std::fmt;
use std::time::Duration;

use crate::arbiter::{InputArbiter, TickInput};
use crate::classifier::{Classification, classify};
use crate::config::BloomConfig;
use crate::debounce::GestureDebouncer;
use crate::error::ConfigError;
use crate::event::{InputEvent, KeyAction, KeyCode};
use crate::focus::{FocusQuery, FocusRelease, FocusTracker, NearestToCenter, ProjectedItem};
use crate::gesture::GestureLabel;
use crate::landmark::{LandmarkFrame, Point};
use crate::phase::{InteractionPhase, PhaseMachine, TransitionCause};
use crate::snapshot::{ArbitratedState, ItemId};
use crate::wave::WaveTracker;

/// Gesture pipeline and interaction state for one scene.
pub struct GestureController {
    config: BloomConfig,
    debouncer: GestureDebouncer,
    wave: WaveTracker,
    arbiter: InputArbiter,
    phase: PhaseMachine,
    focus: FocusTracker,
    query: Box<dyn FocusQuery + Send>,
    last_classification: Option<Classification>,
    frames: u64,
    ticks: u64,
}

impl fmt::Debug for GestureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureController")
            .field("asserted", &self.debouncer.asserted())
            .field("phase", &self.phase.phase())
            .field("focused", &self.focus.focused())
            .field("velocity", &self.arbiter.velocity())
            .field("frames", &self.frames)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl GestureController {
    /// Create a controller with the default [`NearestToCenter`] focus query.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration value.
    pub fn new(config: BloomConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: BloomConfig) -> Self {
        Self {
            debouncer: GestureDebouncer::new(config.debounce.clone()),
            wave: WaveTracker::new(&config.wave),
            arbiter: InputArbiter::new(config.arbiter.clone()),
            phase: PhaseMachine::new(config.phase.clone()),
            focus: FocusTracker::new(config.focus.clone()),
            query: Box::new(NearestToCenter::new(config.focus.clone())),
            last_classification: None,
            frames: 0,
            ticks: 0,
            config,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Video-frame path
    // -----------------------------------------------------------------------

    /// Process one video frame. `None` means no hand was detected.
    ///
    /// A frame with a NaN or infinite coordinate is treated as `None`.
    /// Returns the asserted (debounced) gesture after this frame.
    pub fn process_landmark_frame(&mut self, frame: Option<&LandmarkFrame>) -> GestureLabel {
        self.frames += 1;
        let frame = frame.filter(|f| {
            let finite = f.is_finite();
            if !finite {
                crate::warn!("non-finite landmark frame treated as no hand");
            }
            finite
        });
        let raw = match frame {
            Some(frame) => {
                self.wave.push(frame.wrist().x);
                let c = classify(frame, self.wave.range(), &self.config.classifier);
                self.last_classification = Some(c);
                crate::trace!(
                    label = %c.label,
                    extended = c.extended_count,
                    palm = c.palm_size,
                    "frame classified"
                );
                c.label
            }
            None => {
                self.wave.hold();
                self.last_classification = None;
                GestureLabel::None
            }
        };
        let (asserted, _) = self.debouncer.push(raw);
        asserted
    }

    /// Process raw landmark points. A malformed slice counts as no hand.
    pub fn process_landmark_points(&mut self, points: &[Point]) -> GestureLabel {
        match LandmarkFrame::from_slice(points) {
            Ok(frame) => self.process_landmark_frame(Some(&frame)),
            Err(_err) => {
                crate::warn!(error = %_err, "rejected landmark frame");
                self.process_landmark_frame(None)
            }
        }
    }

    /// The landmark source stopped: forget the hand entirely.
    pub fn on_source_stopped(&mut self) {
        crate::info!("landmark source stopped");
        self.debouncer.reset();
        self.wave.reset();
        self.phase.forget_gesture();
        self.last_classification = None;
    }

    /// Asserted hand gesture, before keyboard override.
    #[inline]
    #[must_use]
    pub fn asserted_gesture(&self) -> GestureLabel {
        self.debouncer.asserted()
    }

    /// Classifier output for the latest frame with a hand.
    #[inline]
    #[must_use]
    pub fn last_classification(&self) -> Option<Classification> {
        self.last_classification
    }

    /// Latest wrist velocity.
    #[inline]
    #[must_use]
    pub fn hand_velocity(&self) -> f32 {
        self.wave.velocity()
    }

    /// Number of asserted-gesture changes so far.
    #[inline]
    #[must_use]
    pub fn gesture_switch_count(&self) -> u64 {
        self.debouncer.switch_count()
    }

    /// Video frames processed so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    // -----------------------------------------------------------------------
    // Pointer and keyboard
    // -----------------------------------------------------------------------

    /// Pointer pressed.
    pub fn on_pointer_down(&mut self) {
        self.arbiter.pointer_down();
    }

    /// Pointer released.
    pub fn on_pointer_up(&mut self) {
        self.arbiter.pointer_up();
    }

    /// Pointer moved `dx` pixels horizontally.
    pub fn on_pointer_drag(&mut self, dx: f32) {
        self.arbiter.pointer_drag(dx);
    }

    /// Key pressed. Returns the bound action, if any.
    pub fn on_key_down(&mut self, key: KeyCode) -> Option<KeyAction> {
        let action = self.config.keys.action(key)?;
        match action {
            KeyAction::Expand => {
                self.phase
                    .request(InteractionPhase::Expanded, TransitionCause::Key);
            }
            KeyAction::Collapse => {
                self.phase
                    .request(InteractionPhase::Compact, TransitionCause::Key);
            }
            KeyAction::RotateLeft | KeyAction::RotateRight | KeyAction::Grab => {
                if self.arbiter.press(action) {
                    crate::debug!(action = ?action, "key action held");
                }
            }
        }
        Some(action)
    }

    /// Key released. Returns the bound action, if any.
    pub fn on_key_up(&mut self, key: KeyCode) -> Option<KeyAction> {
        let action = self.config.keys.action(key)?;
        self.arbiter.release(action);
        Some(action)
    }

    // -----------------------------------------------------------------------
    // Items and focus
    // -----------------------------------------------------------------------

    /// Register a photographed item.
    pub fn add_item(&mut self, id: ItemId) -> bool {
        self.focus.register(id)
    }

    /// Unregister an item. If it was focused, focus clears on the next tick.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        self.focus.unregister(id)
    }

    /// Registered items in registration order.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        self.focus.items()
    }

    /// An item was clicked: toggle focus on it.
    pub fn on_item_clicked(&mut self, id: ItemId) {
        self.focus.toggle(id);
        if self.focus.focused().is_some() {
            self.arbiter.stop();
        }
    }

    /// Drop the focus.
    pub fn clear_focus(&mut self) {
        self.focus.clear(FocusRelease::Explicit);
    }

    /// Store the latest screen-space projections for the focus query.
    pub fn update_projections(&mut self, projections: &[ProjectedItem]) {
        self.focus.set_projections(projections);
    }

    /// Replace the focus query.
    pub fn set_focus_query(&mut self, query: Box<dyn FocusQuery + Send>) {
        self.query = query;
    }

    // -----------------------------------------------------------------------
    // Render path
    // -----------------------------------------------------------------------

    /// Advance interaction state by `dt` and return the new snapshot.
    pub fn tick(&mut self, dt: Duration) -> ArbitratedState {
        self.ticks += 1;
        let gesture = self.arbiter.effective_gesture(self.debouncer.asserted());

        self.phase.advance(dt);
        self.phase.observe(gesture);
        let phase = self.phase.phase();

        let focused = self.focus.update(phase, gesture, self.query.as_mut());

        self.arbiter.tick(TickInput {
            dt,
            gesture,
            hand_velocity: self.wave.velocity(),
            phase,
            focused: focused.is_some(),
        });

        self.snapshot()
    }

    /// Current interaction state.
    #[must_use]
    pub fn snapshot(&self) -> ArbitratedState {
        ArbitratedState {
            gesture: self.arbiter.effective_gesture(self.debouncer.asserted()),
            rotation_velocity: self.arbiter.velocity(),
            view_angle: self.arbiter.view_angle(),
            focused_id: self.focus.focused(),
            phase: self.phase.phase(),
            transition: self.phase.transition(),
            keyboard_override: self.arbiter.keyboard_override(),
            active_inputs: self.arbiter.last_active(),
        }
    }

    /// Render ticks processed so far.
    #[inline]
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Route one [`InputEvent`] to the matching entry point.
    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Landmarks { frame } => {
                self.process_landmark_frame(frame.as_ref());
            }
            InputEvent::PointerDown => self.on_pointer_down(),
            InputEvent::PointerUp => self.on_pointer_up(),
            InputEvent::PointerDrag { dx } => self.on_pointer_drag(*dx),
            InputEvent::KeyDown { key } => {
                self.on_key_down(*key);
            }
            InputEvent::KeyUp { key } => {
                self.on_key_up(*key);
            }
            InputEvent::Tick { dt_ms } => {
                let dt = Duration::try_from_secs_f32(dt_ms / 1000.0).unwrap_or(Duration::ZERO);
                self.tick(dt);
            }
            InputEvent::AddItem { id } => {
                self.add_item(*id);
            }
            InputEvent::RemoveItem { id } => {
                self.remove_item(*id);
            }
            InputEvent::ClickItem { id } => self.on_item_clicked(*id),
            InputEvent::UpdateProjections { projections } => {
                self.update_projections(projections);
            }
            InputEvent::SourceStopped => self.on_source_stopped(),
        }
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::from_valid(BloomConfig::default())
    }
}
