#![forbid(unsafe_code)]

//! Scripted demo session.
//!
//! Plays a short greeting-card visit: photos arrive, the hand opens to
//! bloom the tree, waves to spin it, points to pick a photo, opens to let
//! go, and closes to a fist. Landmarks get small seeded jitter so the
//! debouncer has flicker to absorb.

use bloom_core::event::{InputEvent, KeyCode};
use bloom_core::focus::ProjectedItem;
use bloom_core::landmark::{LandmarkFrame, Point};
use bloom_core::{ItemId, synthetic};

/// Video frames are delivered every other render tick (30 Hz vs 60 Hz).
const TICK_MS: f32 = 1000.0 / 60.0;

/// Number of photos placed on the tree.
pub const DEMO_ITEMS: u64 = 6;

/// Deterministic xorshift64 PRNG.
#[derive(Debug, Clone)]
struct Jitter {
    state: u64,
}

impl Jitter {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[-amp, amp]`.
    fn offset(&mut self, amp: f32) -> f32 {
        let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
        (unit * 2.0 - 1.0) * amp
    }

    fn apply(&mut self, frame: &LandmarkFrame, amp: f32) -> LandmarkFrame {
        let mut points = *frame.points();
        for p in &mut points {
            *p = Point::new(p.x + self.offset(amp), p.y + self.offset(amp));
        }
        LandmarkFrame::new(points)
    }
}

struct Script {
    events: Vec<InputEvent>,
    jitter: Jitter,
}

impl Script {
    fn tick(&mut self) {
        self.events.push(InputEvent::Tick { dt_ms: TICK_MS });
    }

    /// Hold a pose for `frames` video frames, two ticks per frame.
    fn hold(&mut self, frames: usize, mut pose: impl FnMut(usize) -> Option<LandmarkFrame>) {
        for i in 0..frames {
            let frame = pose(i).map(|f| self.jitter.apply(&f, 0.002));
            self.events.push(InputEvent::Landmarks { frame });
            self.tick();
            self.tick();
        }
    }

    fn key(&mut self, key: KeyCode, ticks: usize) {
        self.events.push(InputEvent::KeyDown { key });
        for _ in 0..ticks {
            self.tick();
        }
        self.events.push(InputEvent::KeyUp { key });
    }
}

fn projections() -> Vec<ProjectedItem> {
    (0..DEMO_ITEMS)
        .map(|i| {
            let a = i as f32 / DEMO_ITEMS as f32 * std::f32::consts::TAU;
            ProjectedItem::new(ItemId(i + 1), 0.6 * a.cos(), 0.4 * a.sin(), 0.2 * a.cos())
        })
        .collect()
}

/// Build the demo input sequence for `seed`.
#[must_use]
pub fn demo_session(seed: u64) -> Vec<InputEvent> {
    let mut s = Script {
        events: Vec::new(),
        jitter: Jitter::new(seed),
    };

    for id in 1..=DEMO_ITEMS {
        s.events.push(InputEvent::AddItem { id: ItemId(id) });
    }
    s.events.push(InputEvent::UpdateProjections {
        projections: projections(),
    });

    // No hand yet, then an open palm blooms the tree.
    s.hold(10, |_| None);
    s.hold(75, |_| Some(synthetic::open_hand(0.5)));

    // Wave to spin it.
    s.hold(40, |i| {
        let x = 0.5 + 0.12 * ((i as f32) * 0.6).sin();
        Some(synthetic::open_hand(x))
    });

    // Drag with the mouse, then let it coast.
    s.events.push(InputEvent::PointerDown);
    for _ in 0..10 {
        s.events.push(InputEvent::PointerDrag { dx: 12.0 });
        s.tick();
    }
    s.events.push(InputEvent::PointerUp);
    s.hold(10, |_| None);

    // Point to pick a photo, then let go with an open hand.
    s.hold(15, |_| Some(synthetic::point_up(0.5)));
    s.hold(10, |_| Some(synthetic::open_hand(0.5)));

    // Keyboard: spin right, grab, click a photo to toggle it.
    s.key(KeyCode::Char('d'), 20);
    s.key(KeyCode::Char('p'), 10);
    s.events.push(InputEvent::ClickItem { id: ItemId(3) });
    s.tick();
    s.events.push(InputEvent::ClickItem { id: ItemId(3) });
    s.tick();

    // The focused photo is deleted while still pointing: focus moves on.
    s.hold(10, |_| Some(synthetic::point_up(0.5)));
    s.events.push(InputEvent::RemoveItem { id: ItemId(3) });
    s.tick();

    // Fist closes the tree; the camera stops.
    s.hold(60, |_| Some(synthetic::fist(0.5)));
    s.events.push(InputEvent::SourceStopped);
    for _ in 0..30 {
        s.tick();
    }

    s.events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_session() {
        assert_eq!(demo_session(42), demo_session(42));
        assert_ne!(demo_session(42), demo_session(43));
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let mut j = Jitter::new(9);
        for _ in 0..1000 {
            let o = j.offset(0.01);
            assert!((-0.01..=0.01).contains(&o));
        }
    }

    #[test]
    fn zero_seed_is_usable() {
        let mut j = Jitter::new(0);
        assert_ne!(j.next_u64(), 0);
    }
}
