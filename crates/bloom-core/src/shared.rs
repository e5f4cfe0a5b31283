#![forbid(unsafe_code)]

//! Thread-safe controller handle.
//!
//! Hosts that run landmark detection on a capture thread and rendering on
//! another share one [`GestureController`] through [`SharedController`].
//! Every call takes the lock for the duration of one O(1) update, so
//! neither side blocks the other for long.
//!
//! A panic while holding the lock poisons it; the controller is plain data
//! that is never left half-updated across an await or callback, so the
//! poison is ignored and the inner value reused.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::BloomConfig;
use crate::controller::GestureController;
use crate::error::ConfigError;
use crate::event::{InputEvent, KeyAction, KeyCode};
use crate::focus::{FocusQuery, ProjectedItem};
use crate::gesture::GestureLabel;
use crate::landmark::{LandmarkFrame, Point};
use crate::snapshot::{ArbitratedState, ItemId};

/// A cloneable, `Send + Sync` handle to one controller.
pub struct SharedController {
    inner: Arc<Mutex<GestureController>>,
}

impl Clone for SharedController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SharedController {
    fn default() -> Self {
        Self::from_controller(GestureController::default())
    }
}

impl std::fmt::Debug for SharedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedController").field(&*self.lock()).finish()
    }
}

impl SharedController {
    /// Create a shared controller.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration value.
    pub fn new(config: BloomConfig) -> Result<Self, ConfigError> {
        GestureController::new(config).map(Self::from_controller)
    }

    /// Wrap an existing controller.
    #[must_use]
    pub fn from_controller(controller: GestureController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GestureController> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut GestureController) -> R) -> R {
        f(&mut self.lock())
    }

    // --- capture thread ---

    /// See [`GestureController::process_landmark_frame`].
    pub fn process_landmark_frame(&self, frame: Option<&LandmarkFrame>) -> GestureLabel {
        self.lock().process_landmark_frame(frame)
    }

    /// See [`GestureController::process_landmark_points`].
    pub fn process_landmark_points(&self, points: &[Point]) -> GestureLabel {
        self.lock().process_landmark_points(points)
    }

    /// See [`GestureController::on_source_stopped`].
    pub fn on_source_stopped(&self) {
        self.lock().on_source_stopped();
    }

    // --- UI thread ---

    /// See [`GestureController::on_pointer_down`].
    pub fn on_pointer_down(&self) {
        self.lock().on_pointer_down();
    }

    /// See [`GestureController::on_pointer_up`].
    pub fn on_pointer_up(&self) {
        self.lock().on_pointer_up();
    }

    /// See [`GestureController::on_pointer_drag`].
    pub fn on_pointer_drag(&self, dx: f32) {
        self.lock().on_pointer_drag(dx);
    }

    /// See [`GestureController::on_key_down`].
    pub fn on_key_down(&self, key: KeyCode) -> Option<KeyAction> {
        self.lock().on_key_down(key)
    }

    /// See [`GestureController::on_key_up`].
    pub fn on_key_up(&self, key: KeyCode) -> Option<KeyAction> {
        self.lock().on_key_up(key)
    }

    /// See [`GestureController::add_item`].
    pub fn add_item(&self, id: ItemId) -> bool {
        self.lock().add_item(id)
    }

    /// See [`GestureController::remove_item`].
    pub fn remove_item(&self, id: ItemId) -> bool {
        self.lock().remove_item(id)
    }

    /// See [`GestureController::on_item_clicked`].
    pub fn on_item_clicked(&self, id: ItemId) {
        self.lock().on_item_clicked(id);
    }

    /// See [`GestureController::clear_focus`].
    pub fn clear_focus(&self) {
        self.lock().clear_focus();
    }

    /// See [`GestureController::set_focus_query`].
    pub fn set_focus_query(&self, query: Box<dyn FocusQuery + Send>) {
        self.lock().set_focus_query(query);
    }

    // --- render thread ---

    /// See [`GestureController::update_projections`].
    pub fn update_projections(&self, projections: &[ProjectedItem]) {
        self.lock().update_projections(projections);
    }

    /// See [`GestureController::tick`].
    pub fn tick(&self, dt: Duration) -> ArbitratedState {
        self.lock().tick(dt)
    }

    /// See [`GestureController::snapshot`].
    #[must_use]
    pub fn snapshot(&self) -> ArbitratedState {
        self.lock().snapshot()
    }

    /// See [`GestureController::handle`].
    pub fn handle(&self, event: &InputEvent) {
        self.lock().handle(event);
    }
}
