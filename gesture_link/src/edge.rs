//! Edge-triggered publishing.
//!
//! [`EdgePublisher::submit`] is called once per frame with that frame's
//! command.  It only touches the transport when the command differs from
//! the last one that was *accepted*; a failed publish leaves the latch
//! alone so the very next frame tries again.

use gesture_core::{Command, CommandLatch};
use tracing::{info, warn};

use crate::error::LinkError;
use crate::publisher::Publisher;

/// Counters for the status bar and the end-of-run summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub submitted: u64,
    pub published: u64,
    pub failed:    u64,
}

pub struct EdgePublisher<P: Publisher> {
    publisher: P,
    topic:     String,
    latch:     CommandLatch,
    stats:     PublishStats,
}

impl<P: Publisher> EdgePublisher<P> {
    pub fn new(publisher: P, topic: impl Into<String>) -> Self {
        EdgePublisher {
            publisher,
            topic: topic.into(),
            latch: CommandLatch::new(),
            stats: PublishStats::default(),
        }
    }

    /// Publish `command` if it is a change.  `Ok(true)` when it went out,
    /// `Ok(false)` when it was suppressed as a repeat.
    pub fn submit(&mut self, command: Command) -> Result<bool, LinkError> {
        self.stats.submitted += 1;
        if !self.latch.should_publish(command) {
            return Ok(false);
        }

        match self.publisher.publish(&self.topic, command.as_str()) {
            Ok(()) => {
                let previous = self.latch.last_sent();
                self.latch.mark_sent(command);
                self.stats.published += 1;
                info!(
                    topic = %self.topic,
                    from = previous.map(Command::as_str).unwrap_or("None"),
                    to = %command,
                    "command changed, published"
                );
                Ok(true)
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!(error = %e, %command, "publish failed; will retry next frame");
                Err(e)
            }
        }
    }

    pub fn last_sent(&self) -> Option<Command> {
        self.latch.last_sent()
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Disconnect the transport.  The publisher stays owned so the caller
    /// can still read stats afterwards.
    pub fn shutdown(&mut self) -> Result<(), LinkError> {
        self.publisher.disconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::RecordingPublisher;
    use Command::*;

    fn edge() -> (EdgePublisher<RecordingPublisher>, crate::RecordingHandle) {
        let rec = RecordingPublisher::new();
        let h = rec.handle();
        (EdgePublisher::new(rec, "gesture/control"), h)
    }

    #[test]
    fn first_frame_publishes_stop() {
        let (mut e, h) = edge();
        assert!(e.submit(Stop).unwrap());
        assert_eq!(h.messages(), vec![("gesture/control".to_string(), "STOP".to_string())]);
        assert_eq!(e.last_sent(), Some(Stop));
    }

    #[test]
    fn ten_stops_publish_once() {
        let (mut e, h) = edge();
        for _ in 0..10 { e.submit(Stop).unwrap(); }
        assert_eq!(h.payloads(), vec!["STOP"]);
        assert_eq!(e.stats(), PublishStats { submitted: 10, published: 1, failed: 0 });
    }

    #[test]
    fn publishes_exactly_the_transitions() {
        let (mut e, h) = edge();
        let seq = [Stop, Forward, Forward, Forward, StayLow, StayLow, Forward, Stop];
        for c in seq { e.submit(c).unwrap(); }
        assert_eq!(h.payloads(), vec!["STOP", "FORWARD", "STAYLOW", "FORWARD", "STOP"]);
    }

    #[test]
    fn failed_publish_is_retried_next_frame() {
        let rec = RecordingPublisher::failing_first(1);
        let h = rec.handle();
        let mut e = EdgePublisher::new(rec, "t");

        assert!(e.submit(Forward).is_err());
        assert_eq!(e.last_sent(), None);
        assert!(e.submit(Forward).unwrap());
        assert_eq!(h.payloads(), vec!["FORWARD"]);
        assert_eq!(e.stats().failed, 1);
        assert_eq!(e.stats().published, 1);
    }

    #[test]
    fn shutdown_disconnects_transport() {
        let (mut e, h) = edge();
        e.shutdown().unwrap();
        assert!(h.is_disconnected());
    }
}
