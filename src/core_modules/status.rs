// THEORY:
// The `status` module is the reporting layer: a compact, display-agnostic
// view of what the monitor is doing right now. Every scored tick produces a
// fresh `MonitorStatus`; sinks render it however they like (a console line,
// a log record, a UI label). The status is a value, not a channel: the core
// never waits on a display.

use std::time::Duration;

use crate::core_modules::scorer::ChangeMagnitude;

/// Lifecycle state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No monitoring session exists.
    Idle,
    /// Watching; the last scored tick stayed at or below the threshold.
    Normal,
    /// Watching; inside the cooldown window that follows an alert.
    Cooldown,
    /// An alert has fired. With the session latch engaged this state holds
    /// until monitoring is stopped.
    Alerted,
}

/// Per-tick view of the monitor for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStatus {
    pub state: MonitorState,
    /// Magnitude of the last scored tick; absent until two frames exist.
    pub magnitude: Option<ChangeMagnitude>,
    /// Time left in the cooldown window when `state` is `Cooldown`.
    pub cooldown_remaining: Option<Duration>,
    /// True once an alert has fired in the current session.
    pub alerted_this_session: bool,
}

impl MonitorStatus {
    /// Status of a stopped monitor.
    pub fn idle() -> Self {
        Self {
            state: MonitorState::Idle,
            magnitude: None,
            cooldown_remaining: None,
            alerted_this_session: false,
        }
    }

    /// Status right after a session starts, before any tick has scored.
    pub fn watching() -> Self {
        Self {
            state: MonitorState::Normal,
            ..Self::idle()
        }
    }

    /// Human-readable status line.
    pub fn text(&self) -> String {
        match self.state {
            MonitorState::Idle => "monitoring stopped".to_string(),
            MonitorState::Normal => "watching - no anomalies".to_string(),
            MonitorState::Cooldown => {
                let remaining = self.cooldown_remaining.unwrap_or(Duration::ZERO);
                format!(
                    "notification cooldown ({:.1}s remaining)",
                    remaining.as_secs_f64()
                )
            }
            MonitorState::Alerted => {
                "!!! change detected - stop monitoring to reset !!!".to_string()
            }
        }
    }
}

/// Renders the status line somewhere a human can see it.
pub trait StatusSink: Send {
    fn render(&mut self, status: &MonitorStatus);
}

/// Status sink that writes state changes to the log and nothing else.
/// Repeated identical lines are dropped so a quiet scene stays quiet.
#[derive(Debug, Default)]
pub struct LogStatus {
    last_text: Option<String>,
}

impl StatusSink for LogStatus {
    fn render(&mut self, status: &MonitorStatus) {
        let text = status.text();
        if self.last_text.as_deref() != Some(text.as_str()) {
            tracing::info!(state = ?status.state, "{text}");
            self.last_text = Some(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_watching_carry_no_score() {
        assert_eq!(MonitorStatus::idle().magnitude, None);
        assert_eq!(MonitorStatus::watching().state, MonitorState::Normal);
        assert!(!MonitorStatus::watching().alerted_this_session);
    }

    #[test]
    fn cooldown_text_reports_remaining_seconds() {
        let status = MonitorStatus {
            state: MonitorState::Cooldown,
            magnitude: Some(12.0),
            cooldown_remaining: Some(Duration::from_millis(3200)),
            alerted_this_session: true,
        };
        assert_eq!(status.text(), "notification cooldown (3.2s remaining)");
    }

    #[test]
    fn alerted_text_demands_a_stop() {
        let status = MonitorStatus {
            state: MonitorState::Alerted,
            magnitude: Some(400.0),
            cooldown_remaining: None,
            alerted_this_session: true,
        };
        assert!(status.text().contains("stop monitoring"));
    }
}
