//! Top-level frame loop.
//!
//! `Controller` owns the resolver mode and the edge-triggered publisher.
//! It turns each `HandFrame` into a command, publishes on change, and keeps
//! what the visualizer needs to draw.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use gesture_core::{finger_state, resolve, Command, FingerState, Handedness, Resolution, ResolverMode};
use gesture_link::{EdgePublisher, LogPublisher, MqttPublisher, PublishStats, Publisher};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::source::{HandFrame, HandSource, SimHandSource};
use crate::stream::{BridgeSource, StreamHandSource};
use crate::visualizer::{View, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Run options
// ════════════════════════════════════════════════════════════════════════════

/// Where hands come from for this run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceChoice {
    /// Keyboard-driven synthetic hands (needs the window).
    Simulated,
    /// Live camera through the external estimator process.
    Bridge,
    /// A recorded JSON-lines file.
    Replay(PathBuf),
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub source:   SourceChoice,
    pub headless: bool,
    /// Log publishes instead of talking to a broker.
    pub dry_run:  bool,
}

/// End-of-run numbers for the caller to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames:    u64,
    pub stats:     PublishStats,
    pub last_sent: Option<Command>,
}

// ════════════════════════════════════════════════════════════════════════════
// Controller
// ════════════════════════════════════════════════════════════════════════════

pub struct Controller {
    mode:       ResolverMode,
    edge:       EdgePublisher<Box<dyn Publisher>>,
    // ── last frame, for drawing ──────────────────────────────────────────
    fingers:    Vec<(Handedness, FingerState)>,
    frames:     u64,
    pub status: String,
}

impl Controller {
    pub fn new(mode: ResolverMode, publisher: Box<dyn Publisher>, topic: &str) -> Self {
        Controller {
            mode,
            edge:    EdgePublisher::new(publisher, topic),
            fingers: Vec::new(),
            frames:  0,
            status:  format!("Ready. Publishing on {}", topic),
        }
    }

    /// Classify, resolve and (on change) publish one frame.
    pub fn handle_frame(&mut self, frame: &HandFrame) -> Resolution {
        self.frames += 1;
        self.fingers = frame
            .hands
            .iter()
            .map(|h| (h.handedness, finger_state(&h.landmarks, h.handedness)))
            .collect();

        let res = resolve(self.mode, &self.fingers);
        debug!(
            frame = self.frames,
            hands = self.fingers.len(),
            command = %res.command,
            "frame resolved"
        );

        match self.edge.submit(res.command) {
            Ok(true)  => self.status = format!("Published {}", res.command),
            Ok(false) => {}
            // Logged by the edge publisher; the next frame retries.
            Err(e)    => self.status = format!("Publish of {} failed: {}", res.command, e),
        }

        res
    }

    pub fn mode(&self)      -> ResolverMode                 { self.mode }
    pub fn fingers(&self)   -> &[(Handedness, FingerState)] { &self.fingers }
    pub fn last_sent(&self) -> Option<Command>              { self.edge.last_sent() }
    pub fn stats(&self)     -> PublishStats                 { self.edge.stats() }

    pub fn summary(&self) -> RunSummary {
        RunSummary { frames: self.frames, stats: self.edge.stats(), last_sent: self.edge.last_sent() }
    }

    /// Release the transport.
    pub fn shutdown(&mut self) -> Result<()> {
        self.edge.shutdown().context("closing the command channel")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the controller until the source ends or the user quits.
///
/// The transport is connected first; failing to reach the broker is a
/// startup error.  Whatever happens afterwards, the transport is
/// disconnected and the source (camera bridge) released before returning.
pub fn run(cfg: AppConfig, opts: RunOptions) -> Result<RunSummary> {
    let publisher: Box<dyn Publisher> = if opts.dry_run {
        info!("dry run: publishes are only logged");
        Box::new(LogPublisher)
    } else {
        Box::new(
            MqttPublisher::connect(&cfg.mqtt)
                .context("MQTT connection failed at startup")?,
        )
    };

    run_with(&cfg, &opts, publisher)
}

/// Run over an already-connected publisher.  The publisher is disconnected
/// before returning, whether the loop ended cleanly or with an error.
pub fn run_with(cfg: &AppConfig, opts: &RunOptions, publisher: Box<dyn Publisher>) -> Result<RunSummary> {
    let mut controller = Controller::new(cfg.resolver, publisher, &cfg.mqtt.topic);
    let outcome = drive(cfg, opts, &mut controller);
    let closed = controller.shutdown();

    outcome?;
    closed?;
    Ok(controller.summary())
}

/// Open the source (and window), then pump frames.  Both are dropped on
/// return, which stops the bridge process and closes the window.
fn drive(cfg: &AppConfig, opts: &RunOptions, controller: &mut Controller) -> Result<()> {
    if opts.headless && opts.source == SourceChoice::Simulated {
        bail!("keyboard simulation needs the window; use --source bridge or --replay with --headless");
    }

    let (source, mut vis): (Box<dyn HandSource>, Option<Visualizer>) = match &opts.source {
        SourceChoice::Simulated => {
            let (sim_tx, sim_rx) = mpsc::channel();
            let vis = Visualizer::new(Some(sim_tx))?;
            (Box::new(SimHandSource::new(sim_rx)) as Box<dyn HandSource>, Some(vis))
        }
        SourceChoice::Bridge => {
            let src = BridgeSource::spawn(&cfg.bridge, &cfg.tracker)?;
            (Box::new(src) as Box<dyn HandSource>, window(opts)?)
        }
        SourceChoice::Replay(path) => {
            let src = StreamHandSource::open(path, (&cfg.tracker).into())?;
            (Box::new(src) as Box<dyn HandSource>, window(opts)?)
        }
    };

    info!(source = %source.describe(), mode = ?controller.mode(), "frame loop starting");
    let interval = Duration::from_millis(cfg.frame_interval_ms);
    pump(controller, source, vis.as_mut(), interval)
}

fn window(opts: &RunOptions) -> Result<Option<Visualizer>> {
    if opts.headless { Ok(None) } else { Visualizer::new(None).map(Some) }
}

/// Poll → resolve → publish → draw until the source ends or the user quits.
pub fn pump<S: HandSource>(
    controller: &mut Controller,
    mut source: S,
    mut vis:    Option<&mut Visualizer>,
    interval:   Duration,
) -> Result<()> {
    let label = source.describe();

    loop {
        let started = Instant::now();

        // 1. Window input (quit key, simulated fingers)
        if let Some(v) = vis.as_deref_mut() {
            if !v.poll_input() {
                info!("quit requested");
                break;
            }
        }

        // 2. Next frame from the source
        let Some(frame) = source.next_frame()? else {
            info!(source = %label, "end of stream");
            break;
        };

        // 3. Classify + edge-triggered publish
        let res = controller.handle_frame(&frame);

        // 4. Render
        if let Some(v) = vis.as_deref_mut() {
            v.render(&View {
                hands:     &frame.hands,
                fingers:   controller.fingers(),
                label:     res.label,
                command:   res.command,
                last_sent: controller.last_sent(),
                stats:     controller.stats(),
                mode:      controller.mode(),
                source:    &label,
                status:    &controller.status,
            });
        }

        // 5. Pace
        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::DetectionLimits;
    use gesture_core::{synthesize, DetectedHand};
    use gesture_link::{RecordingHandle, RecordingPublisher};
    use std::io::Cursor;

    fn controller(mode: ResolverMode) -> (Controller, RecordingHandle) {
        let rec = RecordingPublisher::new();
        let h = rec.handle();
        (Controller::new(mode, Box::new(rec), "gesture/control"), h)
    }

    fn frame(hands: &[(Handedness, &str)]) -> HandFrame {
        HandFrame {
            hands: hands
                .iter()
                .map(|&(h, p)| DetectedHand {
                    handedness: h,
                    landmarks:  synthesize(p.parse().unwrap(), h, 0.5),
                    score:      0.9,
                })
                .collect(),
        }
    }

    /// A source that plays back a fixed list of frames.
    struct Scripted(std::vec::IntoIter<HandFrame>);

    impl HandSource for Scripted {
        fn next_frame(&mut self) -> Result<Option<HandFrame>> { Ok(self.0.next()) }
        fn describe(&self) -> String { "scripted".to_string() }
    }

    /// A source whose camera dies after `ok` frames.
    struct Failing { ok: usize }

    impl HandSource for Failing {
        fn next_frame(&mut self) -> Result<Option<HandFrame>> {
            if self.ok == 0 { bail!("camera read failed"); }
            self.ok -= 1;
            Ok(Some(HandFrame::default()))
        }
        fn describe(&self) -> String { "failing".to_string() }
    }

    #[test]
    fn empty_first_frame_publishes_stop() {
        let (mut c, h) = controller(ResolverMode::TwoHand);
        let res = c.handle_frame(&HandFrame::default());
        assert_eq!(res.command, Command::Stop);
        assert_eq!(res.label, None);
        assert_eq!(h.payloads(), vec!["STOP"]);
    }

    #[test]
    fn forward_publishes_once_per_transition() {
        let (mut c, h) = controller(ResolverMode::TwoHand);
        let fwd = frame(&[(Handedness::Right, "11111")]);
        for _ in 0..5 {
            let res = c.handle_frame(&fwd);
            assert_eq!(res.command, Command::Forward);
            assert_eq!(res.label, Some(Command::Forward));
        }
        c.handle_frame(&HandFrame::default());
        c.handle_frame(&fwd);
        assert_eq!(h.payloads(), vec!["FORWARD", "STOP", "FORWARD"]);
    }

    #[test]
    fn left_fist_beats_right_peace() {
        let (mut c, h) = controller(ResolverMode::TwoHand);
        let res = c.handle_frame(&frame(&[(Handedness::Left, "00000"), (Handedness::Right, "01100")]));
        assert_eq!(res.command, Command::StayLow);
        assert_eq!(res.label, Some(Command::StayLow));
        assert_eq!(h.payloads(), vec!["STAYLOW"]);
    }

    #[test]
    fn ten_stop_frames_publish_once() {
        let (mut c, h) = controller(ResolverMode::TwoHand);
        let frames: Vec<_> = (0..10).map(|_| HandFrame::default()).collect();
        pump(&mut c, Scripted(frames.into_iter()), None, Duration::ZERO).unwrap();
        assert_eq!(h.payloads(), vec!["STOP"]);
        assert_eq!(c.summary().frames, 10);
        assert_eq!(c.summary().stats.published, 1);
    }

    #[test]
    fn identical_runs_give_identical_output() {
        let script = || {
            vec![
                frame(&[(Handedness::Right, "01000")]),
                frame(&[(Handedness::Right, "01000")]),
                frame(&[(Handedness::Left, "01100")]),
                frame(&[]),
            ]
        };
        let (mut a, ha) = controller(ResolverMode::TwoHand);
        let (mut b, hb) = controller(ResolverMode::TwoHand);
        pump(&mut a, Scripted(script().into_iter()), None, Duration::ZERO).unwrap();
        pump(&mut b, Scripted(script().into_iter()), None, Duration::ZERO).unwrap();
        assert_eq!(ha.payloads(), hb.payloads());
        assert_eq!(ha.payloads(), vec!["RIGHT", "JUMP", "STOP"]);
    }

    #[test]
    fn right_only_mode_defaults_to_steady() {
        let (mut c, h) = controller(ResolverMode::RightHandOnly);
        c.handle_frame(&frame(&[(Handedness::Left, "11111")]));
        c.handle_frame(&frame(&[(Handedness::Right, "00000")]));
        assert_eq!(h.payloads(), vec!["STEADY", "REVERSE"]);
    }

    #[test]
    fn replayed_stream_drives_the_controller() {
        let hand = |h: Handedness, p: &str| {
            let pts = synthesize(p.parse().unwrap(), h, 0.5).points().to_vec();
            serde_json::json!({ "handedness": h.as_str(), "score": 0.9, "landmarks": pts })
        };
        let lines = [
            serde_json::json!({ "hands": [hand(Handedness::Right, "11111")] }),
            serde_json::json!({ "hands": [hand(Handedness::Right, "11111")] }),
            serde_json::json!({ "hands": [hand(Handedness::Right, "01100"), hand(Handedness::Left, "11111")] }),
            serde_json::json!({ "error": "camera frame dropped" }),
        ];
        let text: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let limits = DetectionLimits { max_hands: 2, min_confidence: 0.7 };
        let src = StreamHandSource::new(Cursor::new(text), limits, "replay");

        let (mut c, h) = controller(ResolverMode::TwoHand);
        pump(&mut c, src, None, Duration::ZERO).unwrap();
        assert_eq!(h.payloads(), vec!["FORWARD", "HANDSHAKE", "STOP"]);
        assert_eq!(c.last_sent(), Some(Command::Stop));
    }

    #[test]
    fn source_failure_ends_the_run_with_an_error() {
        let (mut c, h) = controller(ResolverMode::TwoHand);
        let err = pump(&mut c, Failing { ok: 3 }, None, Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("camera read failed"));
        assert_eq!(c.summary().frames, 3);
        assert_eq!(h.payloads(), vec!["STOP"]);
    }

    #[test]
    fn shutdown_releases_transport() {
        let (mut c, h) = controller(ResolverMode::TwoHand);
        c.handle_frame(&HandFrame::default());
        c.shutdown().unwrap();
        assert!(h.is_disconnected());
    }

    #[test]
    fn failed_publish_shows_in_status_and_retries() {
        let rec = RecordingPublisher::failing_first(1);
        let h = rec.handle();
        let mut c = Controller::new(ResolverMode::TwoHand, Box::new(rec), "t");
        c.handle_frame(&HandFrame::default());
        assert!(c.status.contains("failed"));
        assert_eq!(c.last_sent(), None);
        c.handle_frame(&HandFrame::default());
        assert_eq!(h.payloads(), vec!["STOP"]);
        assert_eq!(c.stats().failed, 1);
    }

    fn headless(source: SourceChoice) -> RunOptions {
        RunOptions { source, headless: true, dry_run: false }
    }

    #[cfg(unix)]
    #[test]
    fn failing_bridge_still_disconnects_the_publisher() {
        let mut cfg = AppConfig::default();
        cfg.bridge.command = "sh".to_string();
        cfg.bridge.args = vec!["-c".to_string(), r#"echo '{"hands":[]}'; exit 3"#.to_string()];

        let rec = RecordingPublisher::new();
        let h = rec.handle();
        let err = run_with(&cfg, &headless(SourceChoice::Bridge), Box::new(rec)).unwrap_err();

        assert!(format!("{:#}", err).contains("landmark bridge exited"), "{:#}", err);
        assert_eq!(h.payloads(), vec!["STOP"]);
        assert!(h.is_disconnected());
    }

    #[test]
    fn unstartable_source_still_disconnects_the_publisher() {
        let mut cfg = AppConfig::default();
        cfg.bridge.command = "definitely-not-a-real-landmark-bridge".to_string();

        let rec = RecordingPublisher::new();
        let h = rec.handle();
        assert!(run_with(&cfg, &headless(SourceChoice::Bridge), Box::new(rec)).is_err());
        assert!(h.payloads().is_empty());
        assert!(h.is_disconnected());
    }

    #[test]
    fn clean_replay_disconnects_the_publisher() {
        let path = std::env::temp_dir().join(format!("hand_control_teardown_{}.jsonl", std::process::id()));
        std::fs::write(&path, "{\"hands\":[]}\n").unwrap();

        let rec = RecordingPublisher::new();
        let h = rec.handle();
        let summary = run_with(&AppConfig::default(), &headless(SourceChoice::Replay(path.clone())), Box::new(rec));
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.unwrap().frames, 1);
        assert!(h.is_disconnected());
    }

    #[test]
    fn headless_simulation_is_refused() {
        let opts = RunOptions { source: SourceChoice::Simulated, headless: true, dry_run: true };
        let err = run(AppConfig::default(), opts).unwrap_err();
        assert!(err.to_string().contains("needs the window"));
    }

    #[test]
    fn dry_run_replay_headless_completes() {
        let path = std::env::temp_dir().join(format!("hand_control_replay_{}.jsonl", std::process::id()));
        std::fs::write(&path, "{\"hands\":[]}\n{\"hands\":[]}\n").unwrap();
        let opts = RunOptions { source: SourceChoice::Replay(path.clone()), headless: true, dry_run: true };
        let summary = run(AppConfig::default(), opts).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.stats.published, 1);
        assert_eq!(summary.last_sent, Some(Command::Stop));
    }
}
