//! The transport seam and the two in-process transports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::error::LinkError;

// ════════════════════════════════════════════════════════════════════════════
// Publisher trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can carry a command string to the actuator.
///
/// `publish` must not block on the network; delivery is best effort.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError>;
    fn disconnect(&mut self) -> Result<(), LinkError>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError> {
        (**self).publish(topic, payload)
    }
    fn disconnect(&mut self) -> Result<(), LinkError> {
        (**self).disconnect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LogPublisher: dry run
// ════════════════════════════════════════════════════════════════════════════

/// Publishes nowhere; each message is logged at `info`.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError> {
        info!(topic, payload, "dry-run publish");
        Ok(())
    }
    fn disconnect(&mut self) -> Result<(), LinkError> {
        info!("dry-run transport closed");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RecordingPublisher: in-memory, inspectable
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct Recording {
    messages:     Mutex<Vec<(String, String)>>,
    disconnected: AtomicBool,
}

/// Keeps every `(topic, payload)` it accepts.  Inspect through a
/// [`RecordingHandle`], which stays valid after the publisher has been
/// moved into an [`EdgePublisher`](crate::EdgePublisher).
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    shared:         Arc<Recording>,
    fail_remaining: usize,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        RecordingPublisher::default()
    }

    /// A recorder whose first `n` publishes fail.
    pub fn failing_first(n: usize) -> Self {
        RecordingPublisher { fail_remaining: n, ..RecordingPublisher::default() }
    }

    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle { shared: Arc::clone(&self.shared) }
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError> {
        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            return Err(LinkError::Publish {
                topic:  topic.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        lock(&self.shared.messages).push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        self.shared.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Read side of a [`RecordingPublisher`].
#[derive(Clone, Debug)]
pub struct RecordingHandle {
    shared: Arc<Recording>,
}

impl RecordingHandle {
    pub fn messages(&self) -> Vec<(String, String)> {
        lock(&self.shared.messages).clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        lock(&self.shared.messages).iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn is_disconnected(&self) -> bool {
        self.shared.disconnected.load(Ordering::SeqCst)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
