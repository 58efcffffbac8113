//! Error type shared by the checked constructors in this crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GestureError {
    /// A landmark slice did not hold exactly one full hand.
    #[error("invalid landmark set: expected {expected} points, found {found}")]
    InvalidInput { expected: usize, found: usize },

    #[error("unknown handedness label {0:?} (expected \"Left\" or \"Right\")")]
    UnknownHandedness(String),

    #[error("unknown command label {0:?}")]
    UnknownCommand(String),

    /// A finger pattern string was not five `0`/`1` characters.
    #[error("invalid finger pattern {0:?} (expected five of '0'/'1', e.g. \"01100\")")]
    InvalidPattern(String),
}
