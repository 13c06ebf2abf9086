// THEORY:
// The `runtime` module puts a clock behind a `MonitorSession`. One spawned
// task owns the session outright and ticks it on a fixed-period interval;
// everything else talks to that task through watch channels only. Settings
// flow in (the task reads the latest value at each tick, never caching),
// status flows out (displays read the latest value whenever they like), and
// a running flag flows in to stop the loop. There is no locking around the
// session itself because nothing else can reach it.
//
// Stopping is deliberately asymmetric: the published status flips to idle
// immediately on the caller's thread, while the task notices the flag at its
// next tick boundary, discards any in-flight tick result, and releases the
// video source by dropping the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::config::{MonitorConfig, TickSettings};
use crate::core_modules::notifier::NotificationSink;
use crate::core_modules::sampler::VideoSource;
use crate::core_modules::status::{MonitorStatus, StatusSink};
use crate::error::MonitorError;
use crate::monitor::{MonitorSession, TickReport};

struct ActiveSession {
    running_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the monitoring lifecycle: start spawns the tick task, stop tears it
/// down, and settings/status watches connect it to the outside.
pub struct MonitorRuntime {
    config: MonitorConfig,
    settings_tx: watch::Sender<TickSettings>,
    status_tx: Arc<watch::Sender<MonitorStatus>>,
    status_rx: watch::Receiver<MonitorStatus>,
    active: Option<ActiveSession>,
}

impl MonitorRuntime {
    pub fn new(config: MonitorConfig, settings: TickSettings) -> Self {
        let (settings_tx, _) = watch::channel(settings.sanitized());
        let (status_tx, status_rx) = watch::channel(MonitorStatus::idle());
        Self {
            config,
            settings_tx,
            status_tx: Arc::new(status_tx),
            status_rx,
            active: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The settings the next tick will read.
    pub fn settings(&self) -> TickSettings {
        self.settings_tx.borrow().clone()
    }

    /// Applies new tick settings. A running session reads them on its next
    /// tick; a stopped runtime keeps them for the next start.
    pub fn update_settings(&self, settings: TickSettings) {
        self.settings_tx.send_replace(settings.sanitized());
    }

    /// The latest published status; idle while stopped.
    pub fn status(&self) -> MonitorStatus {
        self.status_rx.borrow().clone()
    }

    /// A watch subscription for displays that want push-style updates.
    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status_rx.clone()
    }

    pub fn is_monitoring(&self) -> bool {
        self.active.is_some()
    }

    /// Starts monitoring: acquires the source, then spawns the periodic
    /// tick task. Fails without side effects when a session is already
    /// running or the source cannot be acquired.
    pub fn start(
        &mut self,
        source: Box<dyn VideoSource>,
        notifier: Box<dyn NotificationSink>,
        status_sink: Box<dyn StatusSink>,
    ) -> Result<(), MonitorError> {
        if self.active.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }
        let session = MonitorSession::start(&self.config, source, notifier)?;
        self.status_tx.send_replace(session.status().clone());

        let (running_tx, running_rx) = watch::channel(true);
        let task = spawn_tick_loop(
            session,
            self.config.tick_interval(),
            running_rx,
            self.settings_tx.subscribe(),
            Arc::clone(&self.status_tx),
            status_sink,
        );
        self.active = Some(ActiveSession { running_tx, task });
        Ok(())
    }

    /// Stops monitoring. The published status flips to idle immediately;
    /// the task observes the flag at its next tick boundary and releases
    /// the source. Returns the task handle for callers that want to await
    /// the drain; dropping it is fine too.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let handle = self.active.take()?;
        let _ = handle.running_tx.send(false);
        self.status_tx.send_replace(MonitorStatus::idle());
        debug!("monitoring stop requested");
        Some(handle.task)
    }
}

fn spawn_tick_loop(
    mut session: MonitorSession,
    period: Duration,
    mut running_rx: watch::Receiver<bool>,
    settings_rx: watch::Receiver<TickSettings>,
    status_tx: Arc<watch::Sender<MonitorStatus>>,
    mut status_sink: Box<dyn StatusSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        session.render_status(status_sink.as_mut());
        // The first tick lands one full period after start, so the session
        // primes on tick one and scores from tick two onward.
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        // Late ticks queue up behind one another instead of overlapping.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                changed = running_rx.changed() => {
                    if changed.is_err() || !*running_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    let now = time::Instant::now().into_std();
                    let settings = settings_rx.borrow().clone();
                    let report = session.tick(now, &settings);
                    if !*running_rx.borrow() {
                        // Stopped mid-tick; the result is discarded.
                        break;
                    }
                    if !matches!(report, TickReport::SourceNotReady) {
                        status_tx.send_replace(session.status().clone());
                        session.render_status(status_sink.as_mut());
                    }
                }
            }
        }
        status_sink.render(&MonitorStatus::idle());
        debug!("tick loop stopped; releasing video source");
        // Dropping the session closes the source.
    })
}
