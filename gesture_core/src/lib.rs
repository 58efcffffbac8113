//! # gesture_core
//!
//! Static hand-pose classification for a gesture-driven actuator.
//!
//! A detected hand (21 landmarks plus a Left/Right label) is reduced to a
//! five-bit finger vector, the vector is looked up in a per-hand gesture
//! table, and the resulting [`Command`] is passed through a
//! [`CommandLatch`] so that only *changes* ever leave the process.
//!
//! ## Gesture tables
//!
//! | Fingers (T I M R P) | Left hand (actions) | Right hand (movement) |
//! |---|---|---|
//! | `1 1 1 1 1` | `HANDSHAKE` | `FORWARD` |
//! | `0 1 1 0 0` | `JUMP`      | `LEFT`    |
//! | `0 0 0 0 0` | `STAYLOW`   | `REVERSE` |
//! | `0 1 1 1 1` | `STEADY`    | `STOP`    |
//! | `0 1 0 0 0` | -           | `RIGHT`   |
//!
//! Left-hand actions always beat right-hand movement in the same frame.
//! With no match the frame resolves to `STOP` ([`ResolverMode::TwoHand`])
//! or `STEADY` ([`ResolverMode::RightHandOnly`]).
//!
//! ## Quick start
//!
//! ```rust
//! use gesture_core::{resolve, CommandLatch, FingerState, Handedness, ResolverMode, Command};
//!
//! let hands = [
//!     (Handedness::Right, "01100".parse::<FingerState>().unwrap()),
//!     (Handedness::Left,  "00000".parse::<FingerState>().unwrap()),
//! ];
//! let res = resolve(ResolverMode::TwoHand, &hands);
//! assert_eq!(res.command, Command::StayLow);
//!
//! let mut latch = CommandLatch::new();
//! assert!(latch.should_publish(res.command));
//! latch.mark_sent(res.command);
//! assert!(!latch.should_publish(res.command));
//! ```

pub mod command;
pub mod error;
pub mod finger;
pub mod landmark;
pub mod latch;
pub mod pose;
pub mod resolver;

pub use command::Command;
pub use error::GestureError;
pub use finger::{finger_state, finger_state_from_points, Finger, FingerState, FINGER_JOINTS};
pub use landmark::{DetectedHand, Handedness, Landmark, LandmarkSet, LANDMARK_COUNT};
pub use latch::CommandLatch;
pub use pose::synthesize;
pub use resolver::{resolve, Resolution, ResolverMode, LEFT_ACTIONS, RIGHT_MOVEMENTS};
