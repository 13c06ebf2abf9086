// Demo runner for the monitor. Wires a synthetic scene or a directory of
// still frames into the monitoring runtime, with a console status line and
// log-backed notifications. A real deployment would swap in a camera source
// and a desktop notification sink behind the same traits.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vigil_vision::config::{MonitorConfig, TickSettings};
use vigil_vision::core_modules::notifier::{ClickAction, LogNotifier};
use vigil_vision::core_modules::status::{MonitorStatus, StatusSink};
use vigil_vision::monitor::VideoSource;
use vigil_vision::runtime::MonitorRuntime;
use vigil_vision::sources::{ImageSequenceSource, SyntheticSource, paint_flat};

/// Top of the console meter's display scale. Scores above this are common
/// during real motion; the meter just pegs.
const METER_MAX: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Deterministic gray scene with a bright flash every three seconds.
    Synthetic,
    /// Still images from --frames-dir, played in file-name order.
    Frames,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClickActionArg {
    Tab,
    Window,
}

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "Watches a video feed and alerts when the scene changes"
)]
struct Cli {
    /// Video source to monitor
    #[arg(long, value_enum, default_value = "synthetic")]
    source: SourceKind,

    /// Directory of still frames (with --source frames)
    #[arg(long, value_name = "DIR")]
    frames_dir: Option<PathBuf>,

    /// Loop the frame directory instead of stopping at its end
    #[arg(long)]
    loop_frames: bool,

    /// TOML settings profile; flags below override its values
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Capture raster width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Capture raster height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Tick period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Alert threshold on the 0-765 magnitude scale
    #[arg(long)]
    threshold: Option<f64>,

    /// Cooldown between alerts in seconds
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Re-arm after each cooldown window instead of latching the first alert
    #[arg(long)]
    re_arm: bool,

    /// Notification title
    #[arg(long)]
    title: Option<String>,

    /// Notification body
    #[arg(long)]
    body: Option<String>,

    /// URL a clicked notification opens
    #[arg(long)]
    url: Option<String>,

    /// What clicking the notification opens
    #[arg(long, value_enum)]
    click_action: Option<ClickActionArg>,

    /// Directory to store the frame that triggered each alert
    #[arg(long, value_name = "DIR")]
    alert_frames: Option<PathBuf>,

    /// How long to run before stopping, in seconds; omit to run until Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,
}

/// On-disk settings profile: a `[monitor]` table for session config and a
/// `[settings]` table for the per-tick values.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Profile {
    monitor: MonitorConfig,
    settings: TickSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Cli::parse();
    let (config, settings) = resolve_profile(&args)?;

    let source: Box<dyn VideoSource> = match args.source {
        SourceKind::Synthetic => Box::new(synthetic_demo_source()),
        SourceKind::Frames => {
            let dir = args
                .frames_dir
                .clone()
                .context("--frames-dir is required with --source frames")?;
            Box::new(ImageSequenceSource::new(dir, args.loop_frames))
        }
    };

    let mut runtime = MonitorRuntime::new(config, settings);
    runtime.start(
        source,
        Box::new(LogNotifier),
        Box::new(ConsoleStatus::default()),
    )?;

    match args.duration_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("waiting for ctrl-c")?;
        }
    }

    if let Some(task) = runtime.stop() {
        let _ = task.await;
    }
    println!();
    info!("monitor stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads the profile (or defaults) and layers the command-line flags on top.
fn resolve_profile(args: &Cli) -> Result<(MonitorConfig, TickSettings)> {
    let mut profile = match &args.profile {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading profile {}", path.display()))?;
            toml::from_str::<Profile>(&raw)
                .with_context(|| format!("parsing profile {}", path.display()))?
        }
        None => Profile::default(),
    };

    if let Some(width) = args.width {
        profile.monitor.raster_width = width;
    }
    if let Some(height) = args.height {
        profile.monitor.raster_height = height;
    }
    if let Some(interval) = args.interval_ms {
        profile.monitor.tick_interval_ms = interval;
    }
    if args.re_arm {
        profile.monitor.alert_once = false;
    }
    if let Some(dir) = &args.alert_frames {
        profile.monitor.alert_frame_dir = Some(dir.clone());
    }

    if let Some(threshold) = args.threshold {
        profile.settings.threshold = threshold;
    }
    if let Some(cooldown) = args.cooldown_secs {
        profile.settings.cooldown_secs = Some(cooldown);
    }
    if let Some(title) = &args.title {
        profile.settings.notification_title = title.clone();
    }
    if let Some(body) = &args.body {
        profile.settings.notification_body = body.clone();
    }
    if let Some(url) = &args.url {
        profile.settings.notification_url = url.clone();
    }
    if let Some(action) = args.click_action {
        profile.settings.click_action = match action {
            ClickActionArg::Tab => ClickAction::Tab,
            ClickActionArg::Window => ClickAction::sized_window(),
        };
    }

    Ok((profile.monitor, profile.settings))
}

/// Quiet gray scene with a small flicker so the meter moves, and a bright
/// flash every thirty ticks that clears the default threshold by a wide
/// margin.
fn synthetic_demo_source() -> impl VideoSource {
    SyntheticSource::new(|index, _size, raster| {
        let level = if index % 30 < 2 {
            230
        } else {
            64 + (index % 3) as u8
        };
        paint_flat(raster, level);
        true
    })
}

/// Console status line: a magnitude meter plus the status text, redrawn in
/// place, with a line break whenever the text changes.
#[derive(Default)]
struct ConsoleStatus {
    last_text: String,
}

impl StatusSink for ConsoleStatus {
    fn render(&mut self, status: &MonitorStatus) {
        let text = status.text();
        let meter = meter(status.magnitude, 24);
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{meter} {text:<48}");
        let _ = out.flush();
        if text != self.last_text {
            let _ = writeln!(out);
            self.last_text = text;
        }
    }
}

fn meter(magnitude: Option<f64>, width: usize) -> String {
    let value = magnitude.unwrap_or(0.0).clamp(0.0, METER_MAX);
    let filled = ((value / METER_MAX) * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    for i in 0..width {
        bar.push(if i < filled { '#' } else { '.' });
    }
    bar.push(']');
    bar
}
