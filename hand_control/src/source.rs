//! Where hands come from.
//!
//! The public interface is [`HandSource::next_frame`], polled once per loop
//! iteration.  The frame loop doesn't need to know whether hands came from
//! the keyboard simulator, a live estimator process, or a recording.

use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;
use gesture_core::{synthesize, DetectedHand, Finger, FingerState, Handedness};

// ════════════════════════════════════════════════════════════════════════════
// HandFrame / HandSource
// ════════════════════════════════════════════════════════════════════════════

/// Every hand detected in one camera frame, in estimator order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<DetectedHand>,
}

pub trait HandSource {
    /// The next frame; `Ok(None)` at end of stream.  An `Err` is a failed
    /// read and ends the run.
    fn next_frame(&mut self) -> Result<Option<HandFrame>>;

    /// Short description for logs and the status bar.
    fn describe(&self) -> String;
}

impl<S: HandSource + ?Sized> HandSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        (**self).next_frame()
    }
    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: keyboard simulation
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    ToggleFinger(Handedness, Finger),
    /// Show or hide a hand entirely.
    ToggleHand(Handedness),
    /// Jump straight to a pose.
    SetPose(Handedness, FingerState),
    Quit,
}

#[derive(Clone, Copy, Debug)]
struct SimHand {
    present: bool,
    state:   FingerState,
    center:  f32,
}

/// Synthesizes hands from [`SimInput`] events sent by the visualizer.
///
/// Each present hand is turned into a full landmark set with
/// [`synthesize`], so classification goes through the same extractor as
/// camera input.  Both hands start hidden.
pub struct SimHandSource {
    rx:    Receiver<SimInput>,
    right: SimHand,
    left:  SimHand,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource {
            rx,
            // Mirror view: the user's right hand shows on the right.
            right: SimHand { present: false, state: FingerState::OPEN_PALM, center: 0.68 },
            left:  SimHand { present: false, state: FingerState::OPEN_PALM, center: 0.32 },
        }
    }

    fn hand_mut(&mut self, h: Handedness) -> &mut SimHand {
        match h {
            Handedness::Left  => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    /// Apply one input.  Returns `false` on quit.
    fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::ToggleFinger(h, f) => {
                let hand = self.hand_mut(h);
                hand.present = true;
                hand.state.toggle(f);
            }
            SimInput::ToggleHand(h) => {
                let hand = self.hand_mut(h);
                hand.present = !hand.present;
            }
            SimInput::SetPose(h, state) => {
                let hand = self.hand_mut(h);
                hand.present = true;
                hand.state = state;
            }
            SimInput::Quit => return false,
        }
        true
    }

    fn snapshot(&self) -> HandFrame {
        let hands = [(Handedness::Right, self.right), (Handedness::Left, self.left)]
            .into_iter()
            .filter(|(_, h)| h.present)
            .map(|(handedness, h)| DetectedHand {
                handedness,
                landmarks: synthesize(h.state, handedness, h.center),
                score:     1.0,
            })
            .collect();
        HandFrame { hands }
    }
}

impl HandSource for SimHandSource {
    fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        loop {
            match self.rx.try_recv() {
                Ok(input) => {
                    if !self.apply(input) {
                        return Ok(None);
                    }
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(None),
            }
        }
        Ok(Some(self.snapshot()))
    }

    fn describe(&self) -> String {
        "keyboard simulation".to_string()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::finger_state;
    use std::sync::mpsc;

    fn sim() -> (SimHandSource, mpsc::Sender<SimInput>) {
        let (tx, rx) = mpsc::channel();
        (SimHandSource::new(rx), tx)
    }

    fn states(frame: &HandFrame) -> Vec<(Handedness, FingerState)> {
        frame
            .hands
            .iter()
            .map(|h| (h.handedness, finger_state(&h.landmarks, h.handedness)))
            .collect()
    }

    #[test]
    fn starts_with_no_hands() {
        let (mut src, _tx) = sim();
        assert!(src.next_frame().unwrap().unwrap().hands.is_empty());
    }

    #[test]
    fn toggling_a_finger_shows_the_hand() {
        let (mut src, tx) = sim();
        tx.send(SimInput::ToggleFinger(Handedness::Right, Finger::Thumb)).unwrap();
        let frame = src.next_frame().unwrap().unwrap();
        assert_eq!(
            states(&frame),
            vec![(Handedness::Right, FingerState::from_bits([0, 1, 1, 1, 1]))]
        );
    }

    #[test]
    fn set_pose_round_trips_through_landmarks() {
        let (mut src, tx) = sim();
        let peace: FingerState = "01100".parse().unwrap();
        tx.send(SimInput::SetPose(Handedness::Left, FingerState::FIST)).unwrap();
        tx.send(SimInput::SetPose(Handedness::Right, peace)).unwrap();
        let frame = src.next_frame().unwrap().unwrap();
        assert_eq!(
            states(&frame),
            vec![(Handedness::Right, peace), (Handedness::Left, FingerState::FIST)]
        );
    }

    #[test]
    fn toggle_hand_hides_it_again() {
        let (mut src, tx) = sim();
        tx.send(SimInput::ToggleHand(Handedness::Left)).unwrap();
        assert_eq!(src.next_frame().unwrap().unwrap().hands.len(), 1);
        tx.send(SimInput::ToggleHand(Handedness::Left)).unwrap();
        assert!(src.next_frame().unwrap().unwrap().hands.is_empty());
    }

    #[test]
    fn quit_ends_the_stream() {
        let (mut src, tx) = sim();
        tx.send(SimInput::Quit).unwrap();
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn closed_window_ends_the_stream() {
        let (mut src, tx) = sim();
        drop(tx);
        assert!(src.next_frame().unwrap().is_none());
    }
}
