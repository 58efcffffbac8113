//! Edge detection over the command stream.
//!
//! The latch holds the last command that actually went out.  A frame's
//! command is only worth sending when it differs from that value; before
//! anything has been sent every command differs.

use crate::command::Command;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandLatch {
    last_sent: Option<Command>,
}

impl CommandLatch {
    pub fn new() -> Self {
        CommandLatch::default()
    }

    pub fn last_sent(&self) -> Option<Command> {
        self.last_sent
    }

    /// True when `command` is a change from what was last sent.
    pub fn should_publish(&self, command: Command) -> bool {
        self.last_sent != Some(command)
    }

    /// Record `command` as sent.  Call only after the transport accepted it.
    pub fn mark_sent(&mut self, command: Command) {
        self.last_sent = Some(command);
    }

    /// Check-and-mark in one step, for callers whose send cannot fail.
    /// Returns the command when it is a change.
    pub fn observe(&mut self, command: Command) -> Option<Command> {
        if self.should_publish(command) {
            self.mark_sent(command);
            Some(command)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_command_always_publishes() {
        let latch = CommandLatch::new();
        assert_eq!(latch.last_sent(), None);
        for c in Command::ALL {
            assert!(latch.should_publish(c));
        }
    }

    #[test]
    fn held_stop_publishes_once() {
        let mut latch = CommandLatch::new();
        let sent: Vec<_> = (0..10).filter_map(|_| latch.observe(Command::Stop)).collect();
        assert_eq!(sent, vec![Command::Stop]);
    }

    #[test]
    fn published_sequence_is_the_change_points() {
        use Command::*;
        let frames = [Stop, Stop, Forward, Forward, Forward, Stop, Left, Left, Stop, Stop];
        let mut latch = CommandLatch::new();
        let sent: Vec<_> = frames.iter().filter_map(|&c| latch.observe(c)).collect();

        let mut expected = Vec::new();
        let mut prev = None;
        for &c in &frames {
            if prev != Some(c) { expected.push(c); }
            prev = Some(c);
        }
        assert_eq!(sent, expected);
        assert_eq!(sent, vec![Stop, Forward, Stop, Left, Stop]);
        assert!(sent.len() <= frames.len());
    }

    #[test]
    fn unmarked_command_is_retried() {
        let mut latch = CommandLatch::new();
        latch.mark_sent(Command::Stop);
        // Forward was due but never marked (send failed) → still due.
        assert!(latch.should_publish(Command::Forward));
        assert!(latch.should_publish(Command::Forward));
        assert_eq!(latch.last_sent(), Some(Command::Stop));
    }
}
