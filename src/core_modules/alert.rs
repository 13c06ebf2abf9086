// THEORY:
// The `alert` module is the decision core of the monitor: given one scored
// tick it decides whether the alert fires, whether the session is cooling
// down, or whether nothing happens. Two mechanisms interact:
//
// 1.  **Cooldown window**: a minimum spacing between alert firings, measured
//     from the instant of the last firing. While the window runs, further
//     exceedances are reported as `Cooldown` instead of firing.
// 2.  **Session latch**: with `alert_once` set (the default), the first
//     firing locks the session into `Alerted` until monitoring is stopped
//     and restarted. No further firing happens even after the cooldown
//     lapses. With `alert_once` off, the gate re-arms after every window
//     and alerts repeat at cooldown pace.
//
// The gate holds no clock of its own: the caller passes the tick instant and
// the fresh threshold/cooldown values, which keeps every decision
// reproducible in tests with synthetic instants.

use std::time::{Duration, Instant};

use crate::core_modules::scorer::ChangeMagnitude;
use crate::core_modules::status::MonitorState;

/// Outcome of gating one scored tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateOutcome {
    /// State the session is in after this tick.
    pub state: MonitorState,
    /// Whether the notification side effect fires on this tick.
    pub fire: bool,
    /// Time left in the cooldown window, when `state` is `Cooldown`.
    pub cooldown_remaining: Option<Duration>,
}

impl GateOutcome {
    fn quiet(state: MonitorState) -> Self {
        Self {
            state,
            fire: false,
            cooldown_remaining: None,
        }
    }

    fn cooling(remaining: Duration) -> Self {
        Self {
            state: MonitorState::Cooldown,
            fire: false,
            cooldown_remaining: Some(remaining),
        }
    }
}

/// Cooldown and latch bookkeeping for one monitoring session. Built fresh
/// at session start and dropped at stop, which is what resets the latch.
#[derive(Debug)]
pub struct AlertGate {
    alert_once: bool,
    last_alert: Option<Instant>,
    has_fired: bool,
}

impl AlertGate {
    pub fn new(alert_once: bool) -> Self {
        Self {
            alert_once,
            last_alert: None,
            has_fired: false,
        }
    }

    /// True once an alert has fired in this session.
    pub fn has_fired(&self) -> bool {
        self.has_fired
    }

    fn latched(&self) -> bool {
        self.alert_once && self.has_fired
    }

    /// Time left in the cooldown window at `now`, or `None` when no window
    /// is running. Floored at zero: an instant at or past the window edge
    /// reports no remaining time.
    pub fn cooldown_remaining(&self, now: Instant, cooldown: Duration) -> Option<Duration> {
        let started = self.last_alert?;
        // duration_since saturates to zero for instants before the firing.
        let elapsed = now.duration_since(started);
        if elapsed < cooldown {
            Some(cooldown - elapsed)
        } else {
            None
        }
    }

    /// Gates one scored tick. A magnitude exactly equal to the threshold is
    /// not an exceedance.
    pub fn evaluate(
        &mut self,
        now: Instant,
        magnitude: ChangeMagnitude,
        threshold: f64,
        cooldown: Duration,
    ) -> GateOutcome {
        if self.latched() {
            return GateOutcome::quiet(MonitorState::Alerted);
        }

        let remaining = self.cooldown_remaining(now, cooldown);
        if magnitude > threshold {
            match remaining {
                Some(rem) => GateOutcome::cooling(rem),
                None => {
                    self.last_alert = Some(now);
                    self.has_fired = true;
                    GateOutcome {
                        state: MonitorState::Alerted,
                        fire: true,
                        cooldown_remaining: None,
                    }
                }
            }
        } else {
            match remaining {
                Some(rem) => GateOutcome::cooling(rem),
                None => GateOutcome::quiet(MonitorState::Normal),
            }
        }
    }
}
