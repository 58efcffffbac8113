//! Application configuration, loaded from YAML.
//!
//! Every field has a default, so a partial file (or no file at all) is
//! fine.  Command-line flags are applied on top in `main.rs`.
//!
//! ```yaml
//! mqtt:
//!   host: 192.168.1.40
//!   topic: gesture/control
//! tracker:
//!   min_detection_confidence: 0.7
//! resolver: two_hand          # or right_hand_only
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gesture_core::ResolverMode;
use gesture_link::MqttSettings;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mqtt:     MqttSettings,
    pub tracker:  TrackerConfig,
    pub bridge:   BridgeConfig,
    pub resolver: ResolverMode,
    /// Minimum time between frames; 0 runs as fast as the source delivers.
    pub frame_interval_ms: u64,
}

/// Knobs handed to the pose estimator, and applied again on its output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub max_hands:                usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence:  f32,
    pub camera_index:             u32,
    /// Flip frames horizontally before inference (mirror view).
    pub mirror:                   bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            max_hands:                2,
            min_detection_confidence: 0.7,
            min_tracking_confidence:  0.5,
            camera_index:             0,
            mirror:                   true,
        }
    }
}

/// External landmark-estimator process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub command: String,
    pub args:    Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            command: "hand-landmark-bridge".to_string(),
            args:    Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("in config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.tracker;
        if t.max_hands == 0 {
            bail!("tracker.max_hands must be at least 1");
        }
        for (name, v) in [
            ("min_detection_confidence", t.min_detection_confidence),
            ("min_tracking_confidence",  t.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&v) {
                bail!("tracker.{} must be within 0.0–1.0 (got {})", name, v);
            }
        }
        if self.mqtt.topic.is_empty() {
            bail!("mqtt.topic must not be empty");
        }
        Ok(())
    }
}
