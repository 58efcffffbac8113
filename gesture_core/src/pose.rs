//! Synthetic hands.
//!
//! Builds a plausible 21-point landmark set that classifies back to a given
//! finger vector.  The keyboard simulator uses it to feed the real
//! extractor, and tests use it to drive whole frames without a camera.

use crate::finger::{Finger, FingerState};
use crate::landmark::{index, Handedness, Landmark, LandmarkSet, LANDMARK_COUNT};

// Vertical layout (normalized, y grows downward)
const WRIST_Y: f32 = 0.85;
const MCP_Y:   f32 = 0.62;
const PIP_Y:   f32 = 0.52;
const OPEN_DIP_Y:   f32 = 0.45;
const OPEN_TIP_Y:   f32 = 0.38;
const CURLED_DIP_Y: f32 = 0.57;
const CURLED_TIP_Y: f32 = 0.60;

/// Horizontal offset of each finger column, measured toward the thumb side.
const COLUMN: [(Finger, f32); 4] = [
    (Finger::Index,   0.045),
    (Finger::Middle,  0.015),
    (Finger::Ring,   -0.015),
    (Finger::Pinky,  -0.045),
];

/// Landmarks for a hand centred at `center_x` showing `state`.
pub fn synthesize(state: FingerState, handedness: Handedness, center_x: f32) -> LandmarkSet {
    // The thumb sits on the side that makes "open" read correctly after the
    // mirror flip: smaller x for a Right hand, larger x for a Left hand.
    let side = match handedness {
        Handedness::Right => -1.0,
        Handedness::Left  =>  1.0,
    };
    let at = |dx: f32, y: f32| Landmark::new(center_x + side * dx, y);

    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[index::WRIST] = at(0.0, WRIST_Y);

    pts[index::THUMB_CMC] = at(0.05, 0.78);
    pts[index::THUMB_MCP] = at(0.09, 0.72);
    pts[index::THUMB_IP]  = at(0.12, 0.66);
    pts[index::THUMB_TIP] = if state.is_open(Finger::Thumb) {
        at(0.16, 0.62)
    } else {
        at(0.07, 0.66)
    };

    for &(finger, dx) in COLUMN.iter() {
        let (tip, _) = finger.joints();
        let mcp = tip - 3;
        let (dip_y, tip_y) = if state.is_open(finger) {
            (OPEN_DIP_Y, OPEN_TIP_Y)
        } else {
            (CURLED_DIP_Y, CURLED_TIP_Y)
        };
        pts[mcp]     = at(dx, MCP_Y);
        pts[mcp + 1] = at(dx, PIP_Y);
        pts[mcp + 2] = at(dx, dip_y);
        pts[tip]     = at(dx, tip_y);
    }

    LandmarkSet::new(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finger::finger_state;

    #[test]
    fn every_vector_classifies_back() {
        for bits in 0u8..32 {
            let state = FingerState(std::array::from_fn(|i| bits & (1 << i) != 0));
            for hand in [Handedness::Left, Handedness::Right] {
                let set = synthesize(state, hand, 0.5);
                assert_eq!(finger_state(&set, hand), state, "{} {}", hand, state);
            }
        }
    }

    #[test]
    fn points_stay_on_canvas() {
        let set = synthesize(FingerState::OPEN_PALM, Handedness::Right, 0.3);
        for p in set.points() {
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
    }
}
