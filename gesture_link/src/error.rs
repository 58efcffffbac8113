use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// The broker refused us or the network failed before CONNACK.
    #[error("could not connect to MQTT broker {broker}: {reason}")]
    Connect { broker: String, reason: String },

    #[error("no CONNACK from MQTT broker {broker} within {after_ms} ms")]
    ConnectTimeout { broker: String, after_ms: u64 },

    /// The message could not be queued for sending.
    #[error("publish to {topic:?} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("disconnect failed: {0}")]
    Disconnect(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
