//! # hand_control
//!
//! Camera hand-gesture controller: reads hand landmarks, classifies each hand
//! into a five-finger open/closed vector, resolves the pair into a single
//! command and publishes it over MQTT whenever it changes.
//!
//! ## Gesture → Command mapping (thumb, index, middle, ring, pinky)
//!
//! | Pattern | Left hand (action) | Right hand (movement) |
//! |---|---|---|
//! | `11111` | `HANDSHAKE` | `FORWARD` |
//! | `01100` | `JUMP` | `LEFT` |
//! | `00000` | `STAYLOW` | `REVERSE` |
//! | `01111` | `STEADY` | `STOP` |
//! | `01000` | - | `RIGHT` |
//!
//! A recognised left-hand action always beats right-hand movement.  With
//! nothing recognised the command is `STOP` (two-hand mode) or `STEADY`
//! (right-hand-only mode).
//!
//! ## Sources
//!
//! * **Simulation** (default): keyboard toggles fingers of synthetic hands.
//! * **Camera** (`--source bridge`): an external landmark estimator process
//!   prints one JSON frame per line.
//! * **Replay** (`--replay FILE`): the same JSON lines from a recording.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Gesture |
//! |---|---|
//! | `1`–`5` | Toggle right thumb … pinky |
//! | `6`–`0` | Toggle left thumb … pinky |
//! | `R` / `L` | Show / hide right or left hand |
//! | `Q` / `Escape` | Quit |

pub mod config;
pub mod source;
pub mod stream;
pub mod visualizer;
pub mod app;
