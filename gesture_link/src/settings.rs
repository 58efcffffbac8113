use serde::{Deserialize, Serialize};

/// Broker address, session and topic for the command channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub host:               String,
    pub port:               u16,
    pub keep_alive_secs:    u64,
    pub client_id:          String,
    pub topic:              String,
    /// How long [`MqttPublisher::connect`](crate::MqttPublisher::connect)
    /// waits for CONNACK.
    pub connect_timeout_ms: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        MqttSettings {
            host:               "localhost".to_string(),
            port:               1883,
            keep_alive_secs:    60,
            client_id:          "hand-control".to_string(),
            topic:              "gesture/control".to_string(),
            connect_timeout_ms: 5_000,
        }
    }
}

impl MqttSettings {
    /// `host:port`, for log lines and errors.
    pub fn broker(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
