#![forbid(unsafe_code)]

//! Focus selection and release.
//!
//! The core does not know where items are drawn. The rendering layer pushes
//! the latest screen-space projection of every item with
//! [`GestureController::update_projections`](crate::GestureController::update_projections)
//! and supplies a [`FocusQuery`] that picks a candidate from them. The
//! default query is [`NearestToCenter`].
//!
//! # Release rules
//!
//! Focus is cleared on a tick when any of these hold:
//!
//! - the focused item is no longer registered,
//! - the effective gesture is `fist`,
//! - the phase is `Expanded` and the gesture is `wave` or `open`,
//! - `release_focus_on_point_end` is set and `point_up` just ended.
//!
//! Otherwise, when the gesture is `point_up` and nothing is focused, the
//! query is asked for a candidate.

use crate::error::{ConfigError, ensure_non_negative};
use crate::gesture::GestureLabel;
use crate::phase::InteractionPhase;
use crate::snapshot::ItemId;

/// Tuning for focus selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FocusConfig {
    /// Items at or beyond this NDC depth are never candidates.
    /// Default: 0.8
    pub front_depth_limit: f32,

    /// Weight of depth in the candidate score.
    /// Default: 0.1
    pub depth_penalty: f32,

    /// Clear focus as soon as `point_up` ends.
    /// Default: false
    pub release_focus_on_point_end: bool,
}

impl FocusConfig {
    /// Check the scoring values.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-finite depth limit or a negative penalty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.front_depth_limit.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "focus.front_depth_limit",
                value: self.front_depth_limit,
                min: f32::MIN,
                max: f32::MAX,
            });
        }
        ensure_non_negative("focus.depth_penalty", self.depth_penalty)
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            front_depth_limit: 0.8,
            depth_penalty: 0.1,
            release_focus_on_point_end: false,
        }
    }
}

/// An item's position in normalized device coordinates.
///
/// `x` and `y` are in [-1, 1] with the origin at screen center; `z` is
/// depth, smaller is nearer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectedItem {
    pub id: ItemId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ProjectedItem {
    /// Create a projection record.
    #[must_use]
    pub const fn new(id: ItemId, x: f32, y: f32, z: f32) -> Self {
        Self { id, x, y, z }
    }

    /// Whether all three coordinates are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Everything a [`FocusQuery`] may look at.
#[derive(Debug, Clone, Copy)]
pub struct FocusContext<'a> {
    /// Current phase.
    pub phase: InteractionPhase,
    /// Registered items, in registration order.
    pub items: &'a [ItemId],
    /// Latest projections pushed by rendering. May be stale or partial.
    pub projections: &'a [ProjectedItem],
}

/// Picks which item to focus when the user points.
///
/// Implementations belong to the rendering layer, which knows where items
/// are drawn. A candidate that is not registered is discarded.
pub trait FocusQuery {
    /// Return the item to focus, or `None` when nothing qualifies.
    fn find_focus_candidate(&mut self, ctx: &FocusContext<'_>) -> Option<ItemId>;
}

/// Default query: the item closest to screen center, lightly preferring
/// nearer items.
#[derive(Debug, Clone, Default)]
pub struct NearestToCenter {
    config: FocusConfig,
}

impl NearestToCenter {
    /// Create the query with the given scoring.
    #[must_use]
    pub fn new(config: FocusConfig) -> Self {
        Self { config }
    }
}

impl FocusQuery for NearestToCenter {
    fn find_focus_candidate(&mut self, ctx: &FocusContext<'_>) -> Option<ItemId> {
        select_focus_candidate(
            ctx.projections
                .iter()
                .filter(|p| ctx.items.contains(&p.id)),
            &self.config,
        )
    }
}

/// Score projected items and return the best one.
///
/// Items with `z >= front_depth_limit` or non-finite coordinates are
/// skipped. Score is `hypot(x, y) + (z + 1) × depth_penalty`, lowest wins;
/// ties go to the first item seen.
pub fn select_focus_candidate<'a>(
    items: impl IntoIterator<Item = &'a ProjectedItem>,
    config: &FocusConfig,
) -> Option<ItemId> {
    let mut best: Option<(f32, ItemId)> = None;
    for p in items {
        if !p.is_finite() {
            continue;
        }
        if p.z >= config.front_depth_limit {
            continue;
        }
        let score = p.x.hypot(p.y) + (p.z + 1.0) * config.depth_penalty;
        if best.is_none_or(|(s, _)| score < s) {
            best = Some((score, p.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Why focus was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRelease {
    /// The focused item was removed.
    ItemRemoved,
    /// An unfocus gesture was asserted.
    Gesture(GestureLabel),
    /// `point_up` ended and release-on-end is enabled.
    PointEnded,
    /// Cleared through the API or by a click on the focused item.
    Explicit,
}

/// Registered items and the current focus.
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    config: FocusConfig,
    items: Vec<ItemId>,
    projections: Vec<ProjectedItem>,
    focused: Option<ItemId>,
    last_gesture: GestureLabel,
}

impl FocusTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register an item. Returns `false` if it was already registered.
    pub fn register(&mut self, id: ItemId) -> bool {
        if self.items.contains(&id) {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Unregister an item. Focus on it is released on the next
    /// [`update`](Self::update).
    pub fn unregister(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|&i| i != id);
        self.projections.retain(|p| p.id != id);
        self.items.len() != before
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains(&id)
    }

    /// Registered items in registration order.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Replace the stored projections.
    pub fn set_projections(&mut self, projections: &[ProjectedItem]) {
        self.projections.clear();
        self.projections.extend_from_slice(projections);
    }

    /// Currently focused item.
    #[inline]
    #[must_use]
    pub fn focused(&self) -> Option<ItemId> {
        self.focused
    }

    /// Drop the focus. Returns the item that was focused.
    pub fn clear(&mut self, why: FocusRelease) -> Option<ItemId> {
        let prev = self.focused.take();
        if let Some(id) = prev {
            crate::debug!(item = %id, reason = ?why, "focus cleared");
        }
        prev
    }

    /// Toggle focus on a registered item.
    ///
    /// Clicking the focused item clears focus; clicking another registered
    /// item moves focus to it. Unregistered ids are ignored.
    pub fn toggle(&mut self, id: ItemId) {
        if self.focused == Some(id) {
            self.clear(FocusRelease::Explicit);
        } else if self.contains(id) {
            self.focused = Some(id);
            crate::debug!(item = %id, "focus set by click");
        }
    }

    /// Apply the release rules, then ask `query` for a candidate if the user
    /// is pointing and nothing is focused.
    pub fn update(
        &mut self,
        phase: InteractionPhase,
        gesture: GestureLabel,
        query: &mut dyn FocusQuery,
    ) -> Option<ItemId> {
        let prev_gesture = std::mem::replace(&mut self.last_gesture, gesture);

        if let Some(id) = self.focused {
            let release = if !self.contains(id) {
                Some(FocusRelease::ItemRemoved)
            } else if gesture == GestureLabel::Fist
                || (phase == InteractionPhase::Expanded
                    && matches!(gesture, GestureLabel::Wave | GestureLabel::Open))
            {
                Some(FocusRelease::Gesture(gesture))
            } else if self.config.release_focus_on_point_end
                && prev_gesture == GestureLabel::PointUp
                && gesture != GestureLabel::PointUp
            {
                Some(FocusRelease::PointEnded)
            } else {
                None
            };
            if let Some(why) = release {
                self.clear(why);
            }
        }

        if gesture == GestureLabel::PointUp && self.focused.is_none() {
            let ctx = FocusContext {
                phase,
                items: &self.items,
                projections: &self.projections,
            };
            if let Some(id) = query.find_focus_candidate(&ctx)
                && self.contains(id)
            {
                self.focused = Some(id);
                crate::debug!(item = %id, phase = %phase, "focus set");
            }
        }
        self.focused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u64, x: f32, y: f32, z: f32) -> ProjectedItem {
        ProjectedItem::new(ItemId(id), x, y, z)
    }

    struct Fixed(Option<ItemId>);

    impl FocusQuery for Fixed {
        fn find_focus_candidate(&mut self, _ctx: &FocusContext<'_>) -> Option<ItemId> {
            self.0
        }
    }

    fn tracker_with(ids: &[u64]) -> FocusTracker {
        let mut t = FocusTracker::default();
        for &id in ids {
            t.register(ItemId(id));
        }
        t
    }

    #[test]
    fn nearest_to_center_wins() {
        let items = [p(1, 0.5, 0.5, 0.0), p(2, 0.1, 0.0, 0.0), p(3, -0.3, 0.2, 0.0)];
        assert_eq!(
            select_focus_candidate(&items, &FocusConfig::default()),
            Some(ItemId(2))
        );
    }

    #[test]
    fn items_behind_depth_limit_are_skipped() {
        let items = [p(1, 0.0, 0.0, 0.9), p(2, 0.4, 0.0, 0.0)];
        assert_eq!(
            select_focus_candidate(&items, &FocusConfig::default()),
            Some(ItemId(2))
        );
        let items = [p(1, 0.0, 0.0, 0.8)];
        assert_eq!(select_focus_candidate(&items, &FocusConfig::default()), None);
    }

    #[test]
    fn depth_breaks_near_ties() {
        // Same screen distance; the nearer one scores lower.
        let items = [p(1, 0.2, 0.0, 0.5), p(2, 0.0, 0.2, -0.5)];
        assert_eq!(
            select_focus_candidate(&items, &FocusConfig::default()),
            Some(ItemId(2))
        );
    }

    #[test]
    fn first_minimum_wins() {
        let items = [p(7, 0.1, 0.0, 0.0), p(8, 0.1, 0.0, 0.0)];
        assert_eq!(
            select_focus_candidate(&items, &FocusConfig::default()),
            Some(ItemId(7))
        );
    }

    #[test]
    fn non_finite_projections_are_skipped() {
        let items = [p(1, f32::NAN, 0.0, 0.0)];
        assert_eq!(select_focus_candidate(&items, &FocusConfig::default()), None);
    }

    #[test]
    fn default_query_ignores_unregistered_projections() {
        let mut t = tracker_with(&[2]);
        t.set_projections(&[p(1, 0.0, 0.0, 0.0), p(2, 0.5, 0.0, 0.0)]);
        let mut q = NearestToCenter::default();
        let got = t.update(InteractionPhase::Expanded, GestureLabel::PointUp, &mut q);
        assert_eq!(got, Some(ItemId(2)));
    }

    #[test]
    fn point_up_selects_once() {
        let mut t = tracker_with(&[1, 2]);
        let mut q = Fixed(Some(ItemId(1)));
        t.update(InteractionPhase::Compact, GestureLabel::PointUp, &mut q);
        assert_eq!(t.focused(), Some(ItemId(1)));

        // Still pointing: the query would now pick 2, but focus is sticky.
        let mut q = Fixed(Some(ItemId(2)));
        t.update(InteractionPhase::Compact, GestureLabel::PointUp, &mut q);
        assert_eq!(t.focused(), Some(ItemId(1)));
    }

    #[test]
    fn no_candidate_leaves_focus_unset() {
        let mut t = tracker_with(&[1]);
        t.update(InteractionPhase::Expanded, GestureLabel::PointUp, &mut Fixed(None));
        assert_eq!(t.focused(), None);
    }

    #[test]
    fn unregistered_candidate_is_discarded() {
        let mut t = tracker_with(&[1]);
        t.update(
            InteractionPhase::Expanded,
            GestureLabel::PointUp,
            &mut Fixed(Some(ItemId(9))),
        );
        assert_eq!(t.focused(), None);
    }

    #[test]
    fn fist_releases_in_any_phase() {
        for phase in [InteractionPhase::Compact, InteractionPhase::Expanded] {
            let mut t = tracker_with(&[1]);
            t.toggle(ItemId(1));
            t.update(phase, GestureLabel::Fist, &mut Fixed(None));
            assert_eq!(t.focused(), None, "phase {phase}");
        }
    }

    #[test]
    fn wave_and_open_release_only_when_expanded() {
        for g in [GestureLabel::Wave, GestureLabel::Open] {
            let mut t = tracker_with(&[1]);
            t.toggle(ItemId(1));
            t.update(InteractionPhase::Compact, g, &mut Fixed(None));
            assert_eq!(t.focused(), Some(ItemId(1)));
            t.update(InteractionPhase::Expanded, g, &mut Fixed(None));
            assert_eq!(t.focused(), None);
        }
    }

    #[test]
    fn removed_item_releases_on_update() {
        let mut t = tracker_with(&[1]);
        t.toggle(ItemId(1));
        assert!(t.unregister(ItemId(1)));
        assert_eq!(t.focused(), Some(ItemId(1)));
        t.update(InteractionPhase::Expanded, GestureLabel::None, &mut Fixed(None));
        assert_eq!(t.focused(), None);
    }

    #[test]
    fn point_end_release_is_opt_in() {
        let mut t = tracker_with(&[1]);
        let mut q = Fixed(Some(ItemId(1)));
        t.update(InteractionPhase::Expanded, GestureLabel::PointUp, &mut q);
        t.update(InteractionPhase::Expanded, GestureLabel::None, &mut q);
        assert_eq!(t.focused(), Some(ItemId(1)));

        let mut t = FocusTracker::new(FocusConfig {
            release_focus_on_point_end: true,
            ..Default::default()
        });
        t.register(ItemId(1));
        t.update(InteractionPhase::Expanded, GestureLabel::PointUp, &mut q);
        t.update(InteractionPhase::Expanded, GestureLabel::None, &mut q);
        assert_eq!(t.focused(), None);
    }

    #[test]
    fn click_toggles() {
        let mut t = tracker_with(&[1, 2]);
        t.toggle(ItemId(1));
        assert_eq!(t.focused(), Some(ItemId(1)));
        t.toggle(ItemId(2));
        assert_eq!(t.focused(), Some(ItemId(2)));
        t.toggle(ItemId(2));
        assert_eq!(t.focused(), None);
        t.toggle(ItemId(5));
        assert_eq!(t.focused(), None);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut t = FocusTracker::default();
        assert!(t.register(ItemId(3)));
        assert!(!t.register(ItemId(3)));
        assert_eq!(t.items(), &[ItemId(3)]);
        assert!(!t.unregister(ItemId(4)));
    }
}
