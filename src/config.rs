// THEORY:
// Configuration splits along one line: what is fixed for the lifetime of a
// session (`MonitorConfig`) versus what the tick loop re-reads on every
// single tick (`TickSettings`). The split is behavioral, not cosmetic.
// Threshold and cooldown belong to the second group so that a settings
// change applies on the very next tick of a running session, and degenerate
// values are repaired at read time rather than rejected up front.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core_modules::notifier::{AlertNotification, ClickAction};
use crate::core_modules::snapshot::RasterSize;
use crate::error::MonitorError;

/// Default capture cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Default minimum spacing between alert firings.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);
/// Threshold used when the configured value is not a finite number.
pub const DEFAULT_THRESHOLD: f64 = 30.0;
/// Default capture raster (width, height).
pub const DEFAULT_RASTER: (u32, u32) = (160, 120);

/// Settings fixed at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub raster_width: u32,
    pub raster_height: u32,
    /// Tick period in milliseconds; zero falls back to the default.
    pub tick_interval_ms: u64,
    /// One alert per session, reset by stopping. With `false` the gate
    /// re-arms after each cooldown window and alerts repeat.
    pub alert_once: bool,
    /// Directory to store the frame that triggered each alert, as PNG.
    pub alert_frame_dir: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            raster_width: DEFAULT_RASTER.0,
            raster_height: DEFAULT_RASTER.1,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            alert_once: true,
            alert_frame_dir: None,
        }
    }
}

impl MonitorConfig {
    pub fn raster_size(&self) -> RasterSize {
        RasterSize::new(self.raster_width, self.raster_height)
    }

    pub fn tick_interval(&self) -> Duration {
        if self.tick_interval_ms == 0 {
            warn!("tick interval of 0ms replaced with the default");
            DEFAULT_TICK_INTERVAL
        } else {
            Duration::from_millis(self.tick_interval_ms)
        }
    }

    /// Rejects configurations no session could run with.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.raster_width == 0 || self.raster_height == 0 {
            return Err(MonitorError::InvalidRaster {
                width: self.raster_width,
                height: self.raster_height,
            });
        }
        Ok(())
    }
}

/// Values the tick loop reads fresh on every tick. Mutated from outside the
/// session (a settings panel, a slider); the core never caches them across
/// ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickSettings {
    /// Alert threshold on the 0-765 magnitude scale. Strictly exceeded to
    /// alert.
    pub threshold: f64,
    /// Cooldown in whole seconds. Absent falls back to five; an explicit
    /// zero disables the window.
    pub cooldown_secs: Option<u64>,
    pub notification_title: String,
    pub notification_body: String,
    pub notification_url: String,
    pub click_action: ClickAction,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cooldown_secs: None,
            notification_title: String::new(),
            notification_body: String::new(),
            notification_url: String::new(),
            click_action: ClickAction::default(),
        }
    }
}

impl TickSettings {
    /// Repairs degenerate values, logging each repair once. Applied when
    /// settings enter the system; the `effective_*` readers apply the same
    /// rules silently as a backstop.
    pub fn sanitized(mut self) -> Self {
        if !self.threshold.is_finite() {
            warn!(threshold = ?self.threshold, "non-finite threshold replaced with the default");
            self.threshold = DEFAULT_THRESHOLD;
        } else if self.threshold < 0.0 {
            warn!(threshold = self.threshold, "negative threshold clamped to zero");
            self.threshold = 0.0;
        }
        self
    }

    /// Threshold with the defaulting rules applied: non-finite values fall
    /// back to the default, negatives clamp to zero.
    pub fn effective_threshold(&self) -> f64 {
        if !self.threshold.is_finite() {
            DEFAULT_THRESHOLD
        } else if self.threshold < 0.0 {
            0.0
        } else {
            self.threshold
        }
    }

    /// Cooldown window; absent falls back to five seconds.
    pub fn effective_cooldown(&self) -> Duration {
        match self.cooldown_secs {
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_COOLDOWN,
        }
    }

    /// Builds the notification content, substituting placeholders for empty
    /// fields.
    pub fn notification(&self) -> AlertNotification {
        AlertNotification {
            title: non_empty_or(&self.notification_title, "(untitled alert)"),
            body: non_empty_or(&self.notification_body, "Change detected."),
            click_url: non_empty_or(&self.notification_url, "https://www.google.com/"),
            click_action: self.click_action,
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
