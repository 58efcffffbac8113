//! # gesture_link
//!
//! The messaging side of the gesture controller.
//!
//! * [`Publisher`]: the transport seam, `publish(topic, payload)` and
//!   `disconnect()`.
//! * [`MqttPublisher`]: QoS 0, fire-and-forget MQTT with the network loop
//!   on a background thread.  Connecting waits for the broker's CONNACK so a
//!   dead broker is a startup error.
//! * [`LogPublisher`]: dry run; every publish becomes a log line.
//! * [`RecordingPublisher`]: keeps everything it is given, for tests.
//! * [`EdgePublisher`]: wraps any publisher with a
//!   [`CommandLatch`](gesture_core::CommandLatch) so only command *changes*
//!   reach the wire.
//!
//! ```rust
//! use gesture_core::Command;
//! use gesture_link::{EdgePublisher, RecordingPublisher};
//!
//! let recorder = RecordingPublisher::new();
//! let log = recorder.handle();
//! let mut edge = EdgePublisher::new(recorder, "gesture/control");
//! for _ in 0..10 {
//!     edge.submit(Command::Stop).unwrap();
//! }
//! assert_eq!(log.payloads(), vec!["STOP"]);
//! ```

pub mod edge;
pub mod error;
pub mod mqtt;
pub mod publisher;
pub mod settings;

pub use edge::{EdgePublisher, PublishStats};
pub use error::LinkError;
pub use mqtt::MqttPublisher;
pub use publisher::{LogPublisher, Publisher, RecordingHandle, RecordingPublisher};
pub use settings::MqttSettings;
