//! Hand landmarks in the 21-point topology used by common hand-pose
//! estimators (wrist, then four joints per finger from thumb to pinky).
//!
//! Coordinates are normalized to the image: `x` grows to the right, `y`
//! grows *downward*, so a smaller `y` means higher on screen.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GestureError;

/// Number of points in one hand's landmark set.
pub const LANDMARK_COUNT: usize = 21;

/// Named landmark indices.
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Bone segments between landmarks, for drawing a hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // palm
    (0, 1), (0, 5), (5, 9), (9, 13), (13, 17), (0, 17),
    // thumb
    (1, 2), (2, 3), (3, 4),
    // index
    (5, 6), (6, 7), (7, 8),
    // middle
    (9, 10), (10, 11), (11, 12),
    // ring
    (13, 14), (14, 15), (15, 16),
    // pinky
    (17, 18), (18, 19), (19, 20),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point on a hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist; unused by classification.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// Exactly [`LANDMARK_COUNT`] landmarks for one hand in one frame.
///
/// The only way to build one from untrusted data is [`LandmarkSet::from_slice`],
/// so every `LandmarkSet` in the program is known to be complete.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet([Landmark; LANDMARK_COUNT]);

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        LandmarkSet(points)
    }

    /// Build from a slice, rejecting anything that isn't a full hand.
    pub fn from_slice(points: &[Landmark]) -> Result<Self, GestureError> {
        let arr: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| GestureError::InvalidInput {
                expected: LANDMARK_COUNT,
                found:    points.len(),
            })?;
        Ok(LandmarkSet(arr))
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.0
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Landmark;
    fn index(&self, i: usize) -> &Landmark {
        &self.0[i]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// Left/Right label reported by the estimator for a hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left"  => Ok(Handedness::Left),
            "right" => Ok(Handedness::Right),
            _       => Err(GestureError::UnknownHandedness(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectedHand
// ════════════════════════════════════════════════════════════════════════════

/// One hand as reported by the pose estimator for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedHand {
    pub handedness: Handedness,
    pub landmarks:  LandmarkSet,
    /// Handedness classification confidence, 0.0–1.0.
    pub score:      f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
