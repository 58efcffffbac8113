//! Gesture-command resolution for one frame.
//!
//! Each detected hand contributes a `(Handedness, FingerState)` pair.  The
//! pairs are looked up in exact-match tables; table lookups return
//! `Option<Command>` so "no match" never hides behind a default string.
//!
//! In [`ResolverMode::TwoHand`] every Left hand is evaluated before any
//! Right hand, which is what gives actions priority over movement.  When
//! several hands share a label, the last matching one in estimator order
//! wins.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::finger::FingerState;
use crate::landmark::Handedness;

// ════════════════════════════════════════════════════════════════════════════
// Tables
// ════════════════════════════════════════════════════════════════════════════

/// Left hand → action.
pub const LEFT_ACTIONS: [(FingerState, Command); 4] = [
    (FingerState::from_bits([1, 1, 1, 1, 1]), Command::Handshake),
    (FingerState::from_bits([0, 1, 1, 0, 0]), Command::Jump),
    (FingerState::from_bits([0, 0, 0, 0, 0]), Command::StayLow),
    (FingerState::from_bits([0, 1, 1, 1, 1]), Command::Steady),
];

/// Right hand → movement.
pub const RIGHT_MOVEMENTS: [(FingerState, Command); 5] = [
    (FingerState::from_bits([0, 1, 1, 0, 0]), Command::Left),
    (FingerState::from_bits([0, 1, 0, 0, 0]), Command::Right),
    (FingerState::from_bits([1, 1, 1, 1, 1]), Command::Forward),
    (FingerState::from_bits([0, 0, 0, 0, 0]), Command::Reverse),
    (FingerState::from_bits([0, 1, 1, 1, 1]), Command::Stop),
];

fn lookup(table: &[(FingerState, Command)], state: FingerState) -> Option<Command> {
    table.iter().find(|(p, _)| *p == state).map(|&(_, c)| c)
}

pub fn match_action(state: FingerState) -> Option<Command> {
    lookup(&LEFT_ACTIONS, state)
}

pub fn match_movement(state: FingerState) -> Option<Command> {
    lookup(&RIGHT_MOVEMENTS, state)
}

// ════════════════════════════════════════════════════════════════════════════
// ResolverMode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverMode {
    /// Left-hand actions plus right-hand movement; no match → `STOP`.
    #[default]
    TwoHand,
    /// Right-hand movement only; Left hands are ignored and no match →
    /// `STEADY`.
    RightHandOnly,
}

impl ResolverMode {
    /// Command used when no hand matches any pattern.
    pub fn fallback(self) -> Command {
        match self {
            ResolverMode::TwoHand       => Command::Stop,
            ResolverMode::RightHandOnly => Command::Steady,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Resolution
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of resolving one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Command to (possibly) publish for this frame.
    pub command: Command,
    /// Gesture to show on screen; `None` keeps the overlay empty.
    pub label:   Option<Command>,
    /// Which hand produced `command`, if any matched.
    pub source:  Option<Handedness>,
}

impl Resolution {
    fn fallback(mode: ResolverMode) -> Self {
        Resolution { command: mode.fallback(), label: None, source: None }
    }
}

/// Resolve the frame's command from every detected hand.
pub fn resolve(mode: ResolverMode, hands: &[(Handedness, FingerState)]) -> Resolution {
    let last_match = |wanted: Handedness, table: fn(FingerState) -> Option<Command>| {
        hands
            .iter()
            .filter(|(h, _)| *h == wanted)
            .filter_map(|&(_, s)| table(s))
            .last()
    };

    match mode {
        ResolverMode::TwoHand => {
            if let Some(action) = last_match(Handedness::Left, match_action) {
                return Resolution {
                    command: action,
                    label:   Some(action),
                    source:  Some(Handedness::Left),
                };
            }
            // STOP is never shown, and it does not clear a label set by an
            // earlier right hand in the same frame.
            let shown = |s: FingerState| match_movement(s).filter(|&c| c != Command::Stop);
            match last_match(Handedness::Right, match_movement) {
                Some(movement) => Resolution {
                    command: movement,
                    label:   last_match(Handedness::Right, shown),
                    source:  Some(Handedness::Right),
                },
                None => Resolution::fallback(mode),
            }
        }
        ResolverMode::RightHandOnly => match last_match(Handedness::Right, match_movement) {
            Some(movement) => Resolution {
                command: movement,
                label:   Some(movement),
                source:  Some(Handedness::Right),
            },
            None => Resolution::fallback(mode),
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
