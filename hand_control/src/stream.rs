//! Landmarks from an external estimator, one JSON object per line.
//!
//! The estimator (the "bridge") owns the camera: it grabs BGR frames,
//! mirrors them, runs hand-landmark inference and prints one line per
//! frame to stdout:
//!
//! ```json
//! {"hands":[{"handedness":"Right","score":0.93,"landmarks":[{"x":0.51,"y":0.62,"z":0.0}, ...]}]}
//! ```
//!
//! A line may instead carry `"error": "..."`, meaning no usable detection
//! for that frame.  When the camera fails the bridge exits, which shows up
//! here as end of stream.
//!
//! The same format read from a file gives offline replay.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{bail, Context, Result};
use gesture_core::{DetectedHand, Handedness, Landmark, LandmarkSet};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{BridgeConfig, TrackerConfig};
use crate::source::{HandFrame, HandSource};

// ════════════════════════════════════════════════════════════════════════════
// Wire format
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct FrameJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    #[serde(default = "full_score")]
    score:      f32,
    landmarks:  Vec<Landmark>,
}

fn full_score() -> f32 {
    1.0
}

/// Which hands from a frame are kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionLimits {
    pub max_hands:      usize,
    pub min_confidence: f32,
}

impl From<&TrackerConfig> for DetectionLimits {
    fn from(t: &TrackerConfig) -> Self {
        DetectionLimits { max_hands: t.max_hands, min_confidence: t.min_detection_confidence }
    }
}

/// Parse one line into a frame.  Never fails: anything unusable becomes
/// "no hand" for that frame or that hand.
pub fn parse_frame(line: &str, limits: DetectionLimits) -> HandFrame {
    let line = line.trim();
    if line.is_empty() {
        return HandFrame::default();
    }

    let parsed: FrameJson = match serde_json::from_str(line) {
        Ok(f)  => f,
        Err(e) => {
            warn!(error = %e, "unparseable landmark line; treating as no hands");
            return HandFrame::default();
        }
    };
    if let Some(err) = parsed.error {
        warn!(error = %err, "estimator reported an error for this frame");
        return HandFrame::default();
    }

    let hands = parsed
        .hands
        .into_iter()
        .filter(|h| {
            let keep = h.score >= limits.min_confidence;
            if !keep {
                debug!(score = h.score, "hand below detection confidence");
            }
            keep
        })
        .filter_map(|h| match to_detected(&h) {
            Ok(d)  => Some(d),
            Err(e) => {
                warn!(error = %e, "dropping malformed hand");
                None
            }
        })
        .take(limits.max_hands)
        .collect();

    HandFrame { hands }
}

fn to_detected(h: &HandJson) -> Result<DetectedHand, gesture_core::GestureError> {
    Ok(DetectedHand {
        handedness: h.handedness.parse::<Handedness>()?,
        landmarks:  LandmarkSet::from_slice(&h.landmarks)?,
        score:      h.score,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// StreamHandSource: any BufRead
// ════════════════════════════════════════════════════════════════════════════

pub struct StreamHandSource<R: BufRead> {
    reader: R,
    limits: DetectionLimits,
    label:  String,
    line:   String,
    lines:  u64,
}

impl<R: BufRead> StreamHandSource<R> {
    pub fn new(reader: R, limits: DetectionLimits, label: impl Into<String>) -> Self {
        StreamHandSource { reader, limits, label: label.into(), line: String::new(), lines: 0 }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines
    }
}

impl StreamHandSource<BufReader<File>> {
    /// Replay a recorded landmark file.
    pub fn open(path: &Path, limits: DetectionLimits) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening landmark recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), limits, format!("replay {}", path.display())))
    }
}

impl<R: BufRead> HandSource for StreamHandSource<R> {
    fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        self.line.clear();
        let n = self
            .reader
            .read_line(&mut self.line)
            .with_context(|| format!("reading landmarks from {}", self.label))?;
        if n == 0 {
            return Ok(None);
        }
        self.lines += 1;
        Ok(Some(parse_frame(&self.line, self.limits)))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BridgeSource: live estimator process
// ════════════════════════════════════════════════════════════════════════════

/// Runs the bridge as a child process and reads its stdout.
///
/// The child is killed and reaped when this is dropped, so the camera is
/// released on every exit path.
pub struct BridgeSource {
    child:  Child,
    stream: StreamHandSource<BufReader<ChildStdout>>,
}

impl BridgeSource {
    pub fn spawn(bridge: &BridgeConfig, tracker: &TrackerConfig) -> Result<Self> {
        let mut cmd = Command::new(&bridge.command);
        cmd.args(&bridge.args)
            .args(bridge_args(tracker))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        info!(command = %bridge.command, camera = tracker.camera_index, "starting landmark bridge");
        let mut child = cmd
            .spawn()
            .with_context(|| format!("starting landmark bridge `{}`", bridge.command))?;
        let stdout = child.stdout.take().context("landmark bridge has no stdout")?;

        let label = format!("bridge `{}` (camera {})", bridge.command, tracker.camera_index);
        Ok(BridgeSource {
            child,
            stream: StreamHandSource::new(BufReader::new(stdout), tracker.into(), label),
        })
    }
}

/// Estimator settings passed on the bridge's command line.
pub fn bridge_args(tracker: &TrackerConfig) -> Vec<String> {
    let mut args = vec![
        "--camera".to_string(),
        tracker.camera_index.to_string(),
        "--max-hands".to_string(),
        tracker.max_hands.to_string(),
        "--min-detection-confidence".to_string(),
        tracker.min_detection_confidence.to_string(),
        "--min-tracking-confidence".to_string(),
        tracker.min_tracking_confidence.to_string(),
    ];
    if tracker.mirror {
        args.push("--mirror".to_string());
    }
    args
}

impl HandSource for BridgeSource {
    fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        match self.stream.next_frame()? {
            Some(frame) => Ok(Some(frame)),
            None => {
                let status = self.child.wait().context("waiting for landmark bridge")?;
                if status.success() {
                    info!("landmark bridge finished");
                    Ok(None)
                } else {
                    bail!("landmark bridge exited with {} (camera read failure?)", status)
                }
            }
        }
    }

    fn describe(&self) -> String {
        self.stream.describe()
    }
}

impl Drop for BridgeSource {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
            debug!("landmark bridge stopped");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::{finger_state, synthesize, FingerState};
    use std::io::Cursor;

    const LIMITS: DetectionLimits = DetectionLimits { max_hands: 2, min_confidence: 0.7 };

    /// One JSON hand object built from a synthetic pose.
    fn hand_json(h: Handedness, pattern: &str, score: f32) -> String {
        let set = synthesize(pattern.parse().unwrap(), h, 0.5);
        let pts = serde_json::to_string(&set.points().to_vec()).unwrap();
        format!(r#"{{"handedness":"{}","score":{},"landmarks":{}}}"#, h, score, pts)
    }

    fn line(hands: &[String]) -> String {
        format!(r#"{{"hands":[{}]}}"#, hands.join(","))
    }

    fn states(frame: &HandFrame) -> Vec<(Handedness, FingerState)> {
        frame.hands.iter().map(|d| (d.handedness, finger_state(&d.landmarks, d.handedness))).collect()
    }

    #[test]
    fn parses_two_hands_in_order() {
        let l = line(&[
            hand_json(Handedness::Left, "00000", 0.95),
            hand_json(Handedness::Right, "01100", 0.90),
        ]);
        let f = parse_frame(&l, LIMITS);
        assert_eq!(
            states(&f),
            vec![
                (Handedness::Left,  FingerState::FIST),
                (Handedness::Right, "01100".parse().unwrap()),
            ]
        );
    }

    #[test]
    fn low_confidence_hand_is_dropped() {
        let l = line(&[hand_json(Handedness::Right, "11111", 0.4)]);
        assert!(parse_frame(&l, LIMITS).hands.is_empty());
    }

    #[test]
    fn extra_hands_are_capped() {
        let l = line(&[
            hand_json(Handedness::Right, "11111", 0.9),
            hand_json(Handedness::Left, "11111", 0.9),
            hand_json(Handedness::Right, "00000", 0.9),
        ]);
        assert_eq!(parse_frame(&l, LIMITS).hands.len(), 2);
    }

    #[test]
    fn short_landmark_list_drops_only_that_hand() {
        let bad = r#"{"handedness":"Left","score":0.9,"landmarks":[{"x":0.1,"y":0.2}]}"#.to_string();
        let l = line(&[bad, hand_json(Handedness::Right, "01000", 0.9)]);
        let f = parse_frame(&l, LIMITS);
        assert_eq!(f.hands.len(), 1);
        assert_eq!(f.hands[0].handedness, Handedness::Right);
    }

    #[test]
    fn unknown_label_is_dropped() {
        let l = line(&[hand_json(Handedness::Right, "01000", 0.9).replace("Right", "Both")]);
        assert!(parse_frame(&l, LIMITS).hands.is_empty());
    }

    #[test]
    fn garbage_and_error_lines_are_empty_frames() {
        assert!(parse_frame("not json", LIMITS).hands.is_empty());
        assert!(parse_frame(r#"{"error":"no frame"}"#, LIMITS).hands.is_empty());
        assert!(parse_frame("   ", LIMITS).hands.is_empty());
    }

    #[test]
    fn stream_source_yields_frames_until_eof() {
        let text = format!(
            "{}\n{}\n\n",
            line(&[hand_json(Handedness::Right, "11111", 0.9)]),
            line(&[]),
        );
        let mut src = StreamHandSource::new(Cursor::new(text), LIMITS, "test");
        assert_eq!(src.next_frame().unwrap().unwrap().hands.len(), 1);
        assert_eq!(src.next_frame().unwrap().unwrap().hands.len(), 0);
        assert_eq!(src.next_frame().unwrap().unwrap().hands.len(), 0); // blank line
        assert!(src.next_frame().unwrap().is_none());
        assert_eq!(src.lines_read(), 3);
    }

    #[test]
    fn bridge_args_carry_tracker_knobs() {
        let args = bridge_args(&TrackerConfig::default());
        assert_eq!(
            args,
            vec![
                "--camera", "0", "--max-hands", "2",
                "--min-detection-confidence", "0.7",
                "--min-tracking-confidence", "0.5",
                "--mirror",
            ]
        );
    }

    /// A bridge that runs `script` under `sh`; the tracker flags land in
    /// `$0..$n` and are ignored.
    #[cfg(unix)]
    fn sh_bridge(script: &str) -> BridgeSource {
        let bridge = BridgeConfig {
            command: "sh".to_string(),
            args:    vec!["-c".to_string(), script.to_string()],
        };
        BridgeSource::spawn(&bridge, &TrackerConfig::default()).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn bridge_clean_exit_is_end_of_stream() {
        let mut src = sh_bridge(r#"echo '{"hands":[]}'; exit 0"#);
        assert_eq!(src.next_frame().unwrap().map(|f| f.hands.len()), Some(0));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn bridge_failure_exit_is_an_error() {
        let mut src = sh_bridge(r#"echo '{"hands":[]}'; exit 3"#);
        assert_eq!(src.next_frame().unwrap().map(|f| f.hands.len()), Some(0));
        let err = src.next_frame().unwrap_err();
        assert!(format!("{:#}", err).contains("landmark bridge exited"), "{:#}", err);
    }

    #[cfg(unix)]
    #[test]
    fn dropping_the_bridge_kills_the_child() {
        let mut src = sh_bridge(r#"echo '{"hands":[]}'; exec sleep 30"#);
        assert!(src.next_frame().unwrap().is_some());
        let pid = src.child.id().to_string();
        drop(src);

        // Killed and reaped, so the pid no longer names a process.
        let alive = std::process::Command::new("kill")
            .args(["-0", &pid])
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!alive.success());
    }

    #[test]
    fn missing_bridge_is_a_startup_error() {
        let bridge = BridgeConfig {
            command: "definitely-not-a-real-landmark-bridge".to_string(),
            args:    Vec::new(),
        };
        assert!(BridgeSource::spawn(&bridge, &TrackerConfig::default()).is_err());
    }
}
