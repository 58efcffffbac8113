//! hand_control: gesture → MQTT command entry point.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use gesture_core::ResolverMode;
use hand_control::app::{run, RunOptions, SourceChoice};
use hand_control::config::AppConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(version, about = "Hand gestures in, edge-triggered MQTT commands out")]
struct Args {
    /// YAML config file (default: ./config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(short, long)]
    broker: Option<String>,

    /// MQTT broker port
    #[arg(short, long)]
    port: Option<u16>,

    /// Topic commands are published on
    #[arg(short, long)]
    topic: Option<String>,

    /// Which hands are read
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Where hands come from
    #[arg(short, long, value_enum, default_value_t = SourceArg::Sim)]
    source: SourceArg,

    /// Replay a recorded JSON-lines landmark file instead of a live source
    #[arg(long, conflicts_with = "source")]
    replay: Option<PathBuf>,

    /// Log commands instead of connecting to the broker
    #[arg(long)]
    dry_run: bool,

    /// Run without the window (bridge or replay only)
    #[arg(long)]
    headless: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    TwoHand,
    RightOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Sim,
    Bridge,
}

impl From<ModeArg> for ResolverMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::TwoHand   => ResolverMode::TwoHand,
            ModeArg::RightOnly => ResolverMode::RightHandOnly,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║       Hand Control — Gesture-Based Direction over MQTT       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    if let Err(e) = start(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "hand_control={lvl},gesture_link={lvl},gesture_core={lvl}",
            lvl = level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn start(args: Args) -> Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    apply_overrides(&mut cfg, &args)?;

    let source = match (&args.replay, args.source) {
        (Some(path), _)           => SourceChoice::Replay(path.clone()),
        (None, SourceArg::Sim)    => SourceChoice::Simulated,
        (None, SourceArg::Bridge) => SourceChoice::Bridge,
    };

    match &source {
        SourceChoice::Simulated => println!("  Source: keyboard simulation"),
        SourceChoice::Bridge    => println!("  Source: camera via `{}`", cfg.bridge.command),
        SourceChoice::Replay(p) => println!("  Source: replay of {}", p.display()),
    }
    println!("  Mode:   {:?}", cfg.resolver);
    if args.dry_run {
        println!("  Broker: (dry run, commands are only logged)");
    } else {
        println!("  Broker: {}  topic `{}`", cfg.mqtt.broker(), cfg.mqtt.topic);
    }
    println!();

    let summary = run(cfg, RunOptions { source, headless: args.headless, dry_run: args.dry_run })?;

    info!(
        frames    = summary.frames,
        published = summary.stats.published,
        failed    = summary.stats.failed,
        last_sent = summary.last_sent.map(|c| c.as_str()).unwrap_or("None"),
        "session finished"
    );
    println!("\n  Goodbye!\n");
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} not found", path.display());
            }
            AppConfig::load(path)
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if path.exists() {
                AppConfig::load(path)
            } else {
                info!("no {} found, using defaults", DEFAULT_CONFIG);
                Ok(AppConfig::default())
            }
        }
    }
}

fn apply_overrides(cfg: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(host)  = &args.broker { cfg.mqtt.host  = host.clone(); }
    if let Some(port)  = args.port    { cfg.mqtt.port  = port; }
    if let Some(topic) = &args.topic  { cfg.mqtt.topic = topic.clone(); }
    if let Some(mode)  = args.mode    { cfg.resolver   = mode.into(); }
    cfg.validate()
}
