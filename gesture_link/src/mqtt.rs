//! MQTT transport built on `rumqttc`'s synchronous client.
//!
//! The client only enqueues requests; a dedicated thread iterates the
//! [`Connection`] to do the actual network I/O and keep-alive.  That thread
//! reports the outcome of the initial handshake over a channel, which is
//! how [`MqttPublisher::connect`] turns an unreachable broker into an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rumqttc::{Client, Connection, ConnectionError, Event, MqttOptions, Outgoing, Packet, QoS};
use tracing::{debug, info, warn};

use crate::error::LinkError;
use crate::publisher::Publisher;
use crate::settings::MqttSettings;

/// Capacity of the client → event-loop request queue.
const REQUEST_QUEUE: usize = 16;

/// Pause between reconnect attempts after an established link drops.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

pub struct MqttPublisher {
    client:    Client,
    broker:    String,
    connected: Arc<AtomicBool>,
    closing:   Arc<AtomicBool>,
    network:   Option<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Connect and wait for the broker's CONNACK.
    pub fn connect(settings: &MqttSettings) -> Result<Self, LinkError> {
        let broker = settings.broker();
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));
        options.set_clean_session(true);

        let (client, connection) = Client::new(options, REQUEST_QUEUE);
        let connected = Arc::new(AtomicBool::new(false));
        let closing   = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        info!(%broker, client_id = %settings.client_id, "connecting to MQTT broker");
        let network = {
            let connected = Arc::clone(&connected);
            let closing   = Arc::clone(&closing);
            thread::Builder::new()
                .name("mqtt-network".to_string())
                .spawn(move || network_loop(connection, ready_tx, connected, closing))?
        };

        let timeout = Duration::from_millis(settings.connect_timeout_ms);
        match ready_rx.recv_timeout(timeout) {
            Ok(Ok(())) => {
                info!(%broker, "MQTT connected");
                Ok(MqttPublisher { client, broker, connected, closing, network: Some(network) })
            }
            Ok(Err(reason)) => {
                let _ = network.join();
                Err(LinkError::Connect { broker, reason })
            }
            Err(RecvTimeoutError::Timeout) => {
                // The network thread exits on its own once its handshake
                // fails and it finds nobody listening.
                closing.store(true, Ordering::SeqCst);
                Err(LinkError::ConnectTimeout { broker, after_ms: settings.connect_timeout_ms })
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = network.join();
                Err(LinkError::Connect { broker, reason: "network thread exited".to_string() })
            }
        }
    }

    /// Whether the link is currently up (it may drop and recover later).
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn broker(&self) -> &str {
        &self.broker
    }
}

impl Publisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), LinkError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| LinkError::Publish { topic: topic.to_string(), reason: e.to_string() })
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        let Some(network) = self.network.take() else {
            return Ok(());
        };
        self.closing.store(true, Ordering::SeqCst);
        let request = self.client.disconnect().map_err(|e| e.to_string());
        let result = close_network(&self.closing, network, request);
        info!(broker = %self.broker, "MQTT disconnected");
        result
    }
}

/// Stop the network thread and wait for it.  A failed DISCONNECT request
/// means the event loop is already gone, so the join still returns.
fn close_network(
    closing: &AtomicBool,
    network: JoinHandle<()>,
    request: Result<(), String>,
) -> Result<(), LinkError> {
    closing.store(true, Ordering::SeqCst);
    if let Err(reason) = &request {
        warn!(%reason, "DISCONNECT not queued; waiting for the network thread");
    }
    if network.join().is_err() {
        warn!("mqtt-network thread panicked");
    }
    request.map_err(LinkError::Disconnect)
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            warn!(error = %e, "MQTT disconnect on drop failed");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// network_loop: runs on the "mqtt-network" thread
// ════════════════════════════════════════════════════════════════════════════

fn network_loop(
    mut connection: Connection,
    ready_tx:       Sender<Result<(), String>>,
    connected:      Arc<AtomicBool>,
    closing:        Arc<AtomicBool>,
) {
    let mut ready_tx = Some(ready_tx);

    for notification in connection.iter() {
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!(code = ?ack.code, "CONNACK");
                connected.store(true, Ordering::SeqCst);
                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(Ok(()));
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                connected.store(false, Ordering::SeqCst);
                break;
            }
            Ok(event) => debug!(?event, "mqtt"),
            Err(ConnectionError::RequestsDone) => break,
            Err(e) => {
                connected.store(false, Ordering::SeqCst);
                // Before the first CONNACK any error is a failed startup.
                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(Err(e.to_string()));
                    break;
                }
                if closing.load(Ordering::SeqCst) {
                    break;
                }
                warn!(error = %e, "MQTT link lost; reconnecting");
                thread::sleep(RECONNECT_PAUSE);
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_thread_is_joined_when_disconnect_fails() {
        let closing = Arc::new(AtomicBool::new(false));
        let exited  = Arc::new(AtomicBool::new(false));
        let network = {
            let (closing, exited) = (Arc::clone(&closing), Arc::clone(&exited));
            thread::spawn(move || {
                while !closing.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(5));
                }
                exited.store(true, Ordering::SeqCst);
            })
        };

        let err = close_network(&closing, network, Err("channel closed".to_string())).unwrap_err();
        assert!(matches!(err, LinkError::Disconnect(ref r) if r == "channel closed"));
        assert!(exited.load(Ordering::SeqCst));
    }

    #[test]
    fn unreachable_broker_is_a_startup_error() {
        // Port 1 on loopback: nothing listens, the connect is refused fast.
        let settings = MqttSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout_ms: 3_000,
            ..MqttSettings::default()
        };
        match MqttPublisher::connect(&settings) {
            Err(LinkError::Connect { broker, .. }) => assert_eq!(broker, "127.0.0.1:1"),
            Err(LinkError::ConnectTimeout { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connected to a port nobody listens on"),
        }
    }
}
