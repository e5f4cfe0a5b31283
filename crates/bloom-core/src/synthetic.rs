#![forbid(unsafe_code)]

//! Synthetic hand poses.
//!
//! Deterministic landmark frames for tests, benchmarks, and the replay
//! harness's demo session. Geometry is chosen so each pose sits well clear
//! of the default classifier thresholds:
//!
//! - palm size (wrist → index MCP) is `0.15`
//! - an extended finger's tip is `1.2×` as far from the wrist as its middle joint
//! - a curled finger's tip is `0.6×` as far
//! - an extended thumb's tip is `0.9 × palm` from the thumb MCP

use crate::landmark::{LANDMARK_COUNT, LandmarkFrame, Point, joints};

/// Vertical wrist position used by every pose.
pub const WRIST_Y: f32 = 0.8;

const PALM: f32 = 0.15;
const MID_RISE: f32 = 0.25;
const EXTENDED: f32 = 1.2;
const CURLED: f32 = 0.6;

/// Horizontal offsets of the index, middle, ring and pinky columns.
const COLUMNS: [f32; 4] = [-0.06, -0.02, 0.02, 0.06];

/// (mcp, pip, dip, tip) for the four non-thumb fingers.
const FINGERS: [[usize; 4]; 4] = [
    [
        joints::INDEX_MCP,
        joints::INDEX_PIP,
        joints::INDEX_DIP,
        joints::INDEX_TIP,
    ],
    [
        joints::MIDDLE_MCP,
        joints::MIDDLE_PIP,
        joints::MIDDLE_DIP,
        joints::MIDDLE_TIP,
    ],
    [
        joints::RING_MCP,
        joints::RING_PIP,
        joints::RING_DIP,
        joints::RING_TIP,
    ],
    [
        joints::PINKY_MCP,
        joints::PINKY_PIP,
        joints::PINKY_DIP,
        joints::PINKY_TIP,
    ],
];

fn lerp_from(origin: Point, target: Point, t: f32) -> Point {
    Point::new(
        origin.x + (target.x - origin.x) * t,
        origin.y + (target.y - origin.y) * t,
    )
}

/// Build a hand with the given fingers extended.
///
/// `fingers` is `[index, middle, ring, pinky]`.
#[must_use]
pub fn hand(wrist_x: f32, fingers: [bool; 4], thumb: bool) -> LandmarkFrame {
    let wrist = Point::new(wrist_x, WRIST_Y);
    let mut pts = [wrist; LANDMARK_COUNT];

    for (col, (&[mcp, pip, dip, tip], &extended)) in FINGERS.iter().zip(&fingers).enumerate() {
        let dx = COLUMNS[col];
        // Index MCP defines palm size: keep it directly above the wrist.
        let mcp_dx = if col == 0 { 0.0 } else { dx };
        pts[mcp] = Point::new(wrist.x + mcp_dx, wrist.y - PALM);
        let mid = Point::new(wrist.x + dx, wrist.y - MID_RISE);
        pts[pip] = mid;
        let reach = if extended { EXTENDED } else { CURLED };
        pts[tip] = lerp_from(wrist, mid, reach);
        pts[dip] = lerp_from(mid, pts[tip], 0.5);
    }

    let thumb_mcp = Point::new(wrist.x - 0.1, wrist.y - 0.08);
    pts[joints::THUMB_CMC] = Point::new(wrist.x - 0.05, wrist.y - 0.03);
    pts[joints::THUMB_MCP] = thumb_mcp;
    pts[joints::THUMB_TIP] = if thumb {
        Point::new(thumb_mcp.x - 0.9 * PALM, thumb_mcp.y)
    } else {
        Point::new(thumb_mcp.x + 0.03, thumb_mcp.y - 0.02)
    };
    pts[joints::THUMB_IP] = lerp_from(thumb_mcp, pts[joints::THUMB_TIP], 0.5);

    LandmarkFrame::new(pts)
}

/// All five fingers extended.
#[must_use]
pub fn open_hand(wrist_x: f32) -> LandmarkFrame {
    hand(wrist_x, [true; 4], true)
}

/// All fingers curled.
#[must_use]
pub fn fist(wrist_x: f32) -> LandmarkFrame {
    hand(wrist_x, [false; 4], false)
}

/// Only the index finger extended, pointing up.
#[must_use]
pub fn point_up(wrist_x: f32) -> LandmarkFrame {
    hand(wrist_x, [true, false, false, false], false)
}

/// Index held sideways with the thumb tip resting on it.
#[must_use]
pub fn pinch(wrist_x: f32) -> LandmarkFrame {
    let wrist = Point::new(wrist_x, WRIST_Y);
    let mut frame = *hand(wrist_x, [false; 4], false).points();
    let mid = Point::new(wrist.x - 0.2, wrist.y - 0.1);
    frame[joints::INDEX_PIP] = mid;
    frame[joints::INDEX_TIP] = lerp_from(wrist, mid, EXTENDED);
    frame[joints::INDEX_DIP] = lerp_from(mid, frame[joints::INDEX_TIP], 0.5);
    frame[joints::THUMB_TIP] = frame[joints::INDEX_TIP];
    frame[joints::THUMB_IP] = lerp_from(frame[joints::THUMB_MCP], frame[joints::THUMB_TIP], 0.5);
    LandmarkFrame::new(frame)
}

/// Every joint collapsed onto the wrist (degenerate geometry).
#[must_use]
pub fn collapsed(wrist_x: f32) -> LandmarkFrame {
    LandmarkFrame::new([Point::new(wrist_x, WRIST_Y); LANDMARK_COUNT])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palm_size_matches_constant() {
        let f = open_hand(0.5);
        assert!((f.distance(joints::WRIST, joints::INDEX_MCP) - PALM).abs() < 1e-6);
    }

    #[test]
    fn extended_tip_is_1_2x_mid() {
        let f = open_hand(0.5);
        for [_, pip, _, tip] in FINGERS {
            let ratio = f.distance(tip, joints::WRIST) / f.distance(pip, joints::WRIST);
            assert!((ratio - 1.2).abs() < 1e-4, "ratio {ratio}");
        }
    }

    #[test]
    fn extended_thumb_is_0_9x_palm() {
        let f = open_hand(0.5);
        let d = f.distance(joints::THUMB_TIP, joints::THUMB_MCP);
        assert!((d - 0.9 * PALM).abs() < 1e-6);
    }

    #[test]
    fn point_up_index_is_highest() {
        let f = point_up(0.5);
        let index = f.point(joints::INDEX_TIP).y;
        for tip in [joints::MIDDLE_TIP, joints::RING_TIP, joints::PINKY_TIP] {
            assert!(index < f.point(tip).y - 0.08);
        }
    }
}
