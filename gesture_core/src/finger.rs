//! Finger-state extraction: one hand's landmarks → five open/closed bits.
//!
//! * **Thumb**: compared on the x-axis against its IP joint.  The camera
//!   image is mirrored before inference, so "open" points away from the
//!   palm: Right hand open iff `tip.x < ref.x`, Left hand iff `tip.x > ref.x`.
//! * **Other fingers**: open iff the tip sits above (smaller `y` than) the
//!   PIP joint two positions earlier.

use std::fmt;
use std::str::FromStr;

use crate::error::GestureError;
use crate::landmark::{index, Handedness, Landmark, LandmarkSet};

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers in vector order.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    /// Position of this finger in a [`FingerState`].
    pub fn slot(self) -> usize {
        self as usize
    }

    /// `(tip, reference)` landmark indices compared for this finger.
    pub fn joints(self) -> (usize, usize) {
        let (_, tip, reference) = FINGER_JOINTS[self.slot()];
        (tip, reference)
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

/// Finger → (tip index, reference index).
pub const FINGER_JOINTS: [(Finger, usize, usize); 5] = [
    (Finger::Thumb,  index::THUMB_TIP,  index::THUMB_IP),
    (Finger::Index,  index::INDEX_TIP,  index::INDEX_PIP),
    (Finger::Middle, index::MIDDLE_TIP, index::MIDDLE_PIP),
    (Finger::Ring,   index::RING_TIP,   index::RING_PIP),
    (Finger::Pinky,  index::PINKY_TIP,  index::PINKY_PIP),
];

// ════════════════════════════════════════════════════════════════════════════
// FingerState
// ════════════════════════════════════════════════════════════════════════════

/// Open (`true`) / closed (`false`) per finger, thumb first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub const FIST:      FingerState = FingerState([false; 5]);
    pub const OPEN_PALM: FingerState = FingerState([true; 5]);

    /// Build from 0/1 bits, thumb first.  Any non-zero bit counts as open.
    pub const fn from_bits(bits: [u8; 5]) -> Self {
        FingerState([bits[0] != 0, bits[1] != 0, bits[2] != 0, bits[3] != 0, bits[4] != 0])
    }

    pub fn is_open(&self, finger: Finger) -> bool {
        self.0[finger.slot()]
    }

    pub fn set(&mut self, finger: Finger, open: bool) {
        self.0[finger.slot()] = open;
    }

    pub fn toggle(&mut self, finger: Finger) {
        self.0[finger.slot()] ^= true;
    }

    pub fn open_count(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for FingerState {
    type Err = GestureError;

    /// Parses `"01100"`; spaces and commas between bits are ignored, so
    /// `"0,1,1,0,0"` works too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits: Vec<char> = s.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
        if bits.len() != 5 {
            return Err(GestureError::InvalidPattern(s.to_string()));
        }
        let mut state = FingerState::default();
        for (slot, c) in bits.into_iter().enumerate() {
            state.0[slot] = match c {
                '1' => true,
                '0' => false,
                _   => return Err(GestureError::InvalidPattern(s.to_string())),
            };
        }
        Ok(state)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Extraction
// ════════════════════════════════════════════════════════════════════════════

/// Classify each finger of one hand as open or closed.
pub fn finger_state(hand: &LandmarkSet, handedness: Handedness) -> FingerState {
    let mut state = FingerState::default();
    for &(finger, tip, reference) in FINGER_JOINTS.iter() {
        let (t, r) = (hand[tip], hand[reference]);
        let open = match finger {
            Finger::Thumb => match handedness {
                Handedness::Right => t.x < r.x,
                Handedness::Left  => t.x > r.x,
            },
            _ => t.y < r.y,
        };
        state.set(finger, open);
    }
    state
}

/// [`finger_state`] over an unchecked slice; anything but 21 points is
/// rejected with [`GestureError::InvalidInput`].
pub fn finger_state_from_points(
    points: &[Landmark],
    handedness: Handedness,
) -> Result<FingerState, GestureError> {
    let hand = LandmarkSet::from_slice(points)?;
    Ok(finger_state(&hand, handedness))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
