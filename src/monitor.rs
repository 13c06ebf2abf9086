// THEORY:
// The `monitor` module is the top-level API for one monitoring session. It
// owns the full stack for a single tick: sample a snapshot, score it against
// the previous one, feed the rolling chart, gate the alert, publish a status
// value. That order is fixed and there are no other entry points into the
// session.
//
// A session exists only while monitoring runs. `start` builds every piece of
// per-session state and acquires the video source, and acquisition failure
// aborts the whole attempt. Stopping is simply dropping the session, which
// releases the source and takes the scorer's prior frame, the chart and the
// alert latch with it. Restart-from-scratch is the reset mechanism.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::config::{MonitorConfig, TickSettings};
use crate::core_modules::alert::AlertGate;
use crate::core_modules::chart::RollingChart;
use crate::core_modules::notifier::{self, DispatchResult, NotificationSink};
use crate::core_modules::sampler::FrameSampler;
use crate::core_modules::scorer::{ChangeScorer, Observation};
use crate::core_modules::status::{MonitorStatus, StatusSink};
use crate::error::MonitorError;

// Re-export key data structures for the public API.
pub use crate::core_modules::chart::{ChartPoint, MAX_CHART_POINTS};
pub use crate::core_modules::notifier::{AlertNotification, Permission};
pub use crate::core_modules::sampler::{SourceFrame, VideoSource};
pub use crate::core_modules::scorer::{ChangeMagnitude, MAX_MAGNITUDE, change_magnitude};
pub use crate::core_modules::snapshot::{RasterSize, Snapshot};
pub use crate::core_modules::status::MonitorState;

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// The source had no frame, or capture failed; nothing changed.
    SourceNotReady,
    /// The first frame of the session was stored as the comparison base.
    Primed,
    /// A scored tick.
    Scored(ScoredTick),
}

/// The scored half of a tick: the magnitude, the fresh threshold it was
/// compared against, and the gate's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTick {
    pub magnitude: ChangeMagnitude,
    pub threshold: f64,
    pub state: MonitorState,
    /// The alert fired on this tick: the gate advanced and the cooldown
    /// window restarted.
    pub fired: bool,
    /// The sink actually delivered a notification. `fired` without `sent`
    /// means permission suppressed the delivery.
    pub sent: bool,
    pub cooldown_remaining: Option<Duration>,
}

/// One running monitoring session.
pub struct MonitorSession {
    sampler: FrameSampler,
    scorer: ChangeScorer,
    chart: RollingChart,
    gate: AlertGate,
    notifier: Box<dyn NotificationSink>,
    alert_frame_dir: Option<PathBuf>,
    status: MonitorStatus,
    ticks: u64,
}

impl MonitorSession {
    /// Builds the session and acquires the video source. An acquisition
    /// failure aborts the start entirely; no session exists afterwards.
    pub fn start(
        config: &MonitorConfig,
        source: Box<dyn VideoSource>,
        notifier: Box<dyn NotificationSink>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let mut sampler = FrameSampler::new(source, config.raster_size());
        sampler.open()?;

        let mut alert_frame_dir = config.alert_frame_dir.clone();
        if let Some(dir) = &alert_frame_dir {
            if let Err(err) = std::fs::create_dir_all(dir) {
                warn!(error = %err, dir = %dir.display(), "cannot create alert frame dir; frames disabled");
                alert_frame_dir = None;
            }
        }

        info!(
            raster = ?config.raster_size(),
            alert_once = config.alert_once,
            "monitoring started"
        );
        Ok(Self {
            sampler,
            scorer: ChangeScorer::new(),
            chart: RollingChart::new(),
            gate: AlertGate::new(config.alert_once),
            notifier,
            alert_frame_dir,
            status: MonitorStatus::watching(),
            ticks: 0,
        })
    }

    /// Runs one tick of the monitor at `now` with fresh settings.
    pub fn tick(&mut self, now: Instant, settings: &TickSettings) -> TickReport {
        // Stage 1: Capture
        let snapshot = match self.sampler.sample() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("video source not ready; tick skipped");
                return TickReport::SourceNotReady;
            }
            Err(err) => {
                warn!(error = %err, "frame capture failed; tick skipped");
                return TickReport::SourceNotReady;
            }
        };
        self.ticks += 1;

        // Stage 2: Score against the previous snapshot
        let magnitude = match self.scorer.observe(snapshot) {
            Observation::Primed => {
                self.status = MonitorStatus::watching();
                return TickReport::Primed;
            }
            Observation::Scored(magnitude) => magnitude,
        };

        // Stage 3: Chart, with the threshold as read on this tick
        let threshold = settings.effective_threshold();
        let cooldown = settings.effective_cooldown();
        self.chart.append(magnitude, threshold);

        // Stage 4: Gate and, if it fires, dispatch
        let outcome = self.gate.evaluate(now, magnitude, threshold, cooldown);
        let mut sent = false;
        if outcome.fire {
            let alert = settings.notification();
            info!(magnitude, threshold, title = %alert.title, "change threshold exceeded; alerting");
            sent = matches!(
                notifier::dispatch(self.notifier.as_mut(), &alert),
                DispatchResult::Sent
            );
            if !sent {
                info!("notification suppressed by permission; the alert still counts");
            }
            self.store_alert_frame();
        } else {
            debug!(magnitude, threshold, state = ?outcome.state, "tick scored");
        }

        // Stage 5: Publish the per-tick status
        self.status = MonitorStatus {
            state: outcome.state,
            magnitude: Some(magnitude),
            cooldown_remaining: outcome.cooldown_remaining,
            alerted_this_session: self.gate.has_fired(),
        };

        TickReport::Scored(ScoredTick {
            magnitude,
            threshold,
            state: outcome.state,
            fired: outcome.fire,
            sent,
            cooldown_remaining: outcome.cooldown_remaining,
        })
    }

    /// The status after the most recent tick.
    pub fn status(&self) -> &MonitorStatus {
        &self.status
    }

    pub fn state(&self) -> MonitorState {
        self.status.state
    }

    /// The rolling chart of recent scored ticks.
    pub fn chart(&self) -> &RollingChart {
        &self.chart
    }

    /// Number of frames sampled so far, including the priming frame.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Renders the current status into a sink.
    pub fn render_status(&self, sink: &mut dyn StatusSink) {
        sink.render(&self.status);
    }

    fn store_alert_frame(&mut self) {
        let Some(dir) = &self.alert_frame_dir else {
            return;
        };
        let Some(snapshot) = self.scorer.latest() else {
            return;
        };
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let path = dir.join(format!("alert_{stamp}_{:05}.png", self.ticks));
        match snapshot.write_png(&path) {
            Ok(()) => info!(path = %path.display(), "alert frame stored"),
            Err(err) => warn!(error = %err, "could not store alert frame"),
        }
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.sampler.close();
    }
}
