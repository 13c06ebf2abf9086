// THEORY:
// The `notifier` module is the seam between the monitor and whatever can
// show an alert to a human. The permission model mirrors platform
// notification APIs: a sink starts unasked, is prompted at most once per
// session (on the first firing), and a denial is final until the session
// restarts. Crucially, the dispatcher's callers advance their alert state
// whether or not anything was shown, so a denied permission cannot be used
// to farm repeated firing attempts out of the cooldown machinery.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Default window size for `ClickAction::Window` when none is configured.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (800, 600);

/// Permission state of a notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Never asked; the dispatcher will prompt once before sending.
    Unasked,
    Granted,
    Denied,
}

/// What clicking a delivered notification should do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClickAction {
    /// Open the configured URL in a new browser tab.
    #[default]
    Tab,
    /// Open the configured URL in a window of the given size.
    Window { width: u32, height: u32 },
}

impl ClickAction {
    /// A window using [`DEFAULT_WINDOW_SIZE`].
    pub fn sized_window() -> Self {
        ClickAction::Window {
            width: DEFAULT_WINDOW_SIZE.0,
            height: DEFAULT_WINDOW_SIZE.1,
        }
    }
}

/// One alert's rendered content.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotification {
    pub title: String,
    pub body: String,
    pub click_url: String,
    pub click_action: ClickAction,
}

/// Anything that can deliver one alert notification to the user.
pub trait NotificationSink: Send {
    /// Current permission, without prompting.
    fn permission(&self) -> Permission;

    /// Prompts the user for permission; returns the resulting state.
    fn request_permission(&mut self) -> Permission;

    /// Delivers one notification. Only called while permission is granted.
    fn notify(&mut self, alert: &AlertNotification);
}

/// Whether a dispatch attempt actually delivered anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Sent,
    /// Permission was missing and nothing was shown. The alert still counts
    /// as fired.
    Suppressed(Permission),
}

/// Runs the permission flow and delivers the alert if allowed.
pub fn dispatch(sink: &mut dyn NotificationSink, alert: &AlertNotification) -> DispatchResult {
    let permission = match sink.permission() {
        Permission::Unasked => sink.request_permission(),
        known => known,
    };
    match permission {
        Permission::Granted => {
            sink.notify(alert);
            DispatchResult::Sent
        }
        other => DispatchResult::Suppressed(other),
    }
}

/// Notification sink that writes alerts to the log instead of a desktop
/// surface. Permission is always granted.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn notify(&mut self, alert: &AlertNotification) {
        info!(title = %alert.title, url = %alert.click_url, "ALERT: {}", alert.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedSink {
        permission: Permission,
        prompt_answer: Permission,
        prompts: usize,
        delivered: Vec<AlertNotification>,
    }

    impl ScriptedSink {
        fn new(permission: Permission, prompt_answer: Permission) -> Self {
            Self {
                permission,
                prompt_answer,
                prompts: 0,
                delivered: Vec::new(),
            }
        }
    }

    impl NotificationSink for ScriptedSink {
        fn permission(&self) -> Permission {
            self.permission
        }

        fn request_permission(&mut self) -> Permission {
            self.prompts += 1;
            self.permission = self.prompt_answer;
            self.permission
        }

        fn notify(&mut self, alert: &AlertNotification) {
            self.delivered.push(alert.clone());
        }
    }

    fn alert() -> AlertNotification {
        AlertNotification {
            title: "Motion".into(),
            body: "Something moved".into(),
            click_url: "https://example.com/".into(),
            click_action: ClickAction::Tab,
        }
    }

    #[test]
    fn unasked_sink_is_prompted_then_delivered() {
        let mut sink = ScriptedSink::new(Permission::Unasked, Permission::Granted);
        assert_eq!(dispatch(&mut sink, &alert()), DispatchResult::Sent);
        assert_eq!(sink.prompts, 1);
        assert_eq!(sink.delivered.len(), 1);
    }

    #[test]
    fn refused_prompt_suppresses_delivery() {
        let mut sink = ScriptedSink::new(Permission::Unasked, Permission::Denied);
        assert_eq!(
            dispatch(&mut sink, &alert()),
            DispatchResult::Suppressed(Permission::Denied)
        );
        assert!(sink.delivered.is_empty());
    }

    #[test]
    fn denied_sink_is_never_prompted_again() {
        let mut sink = ScriptedSink::new(Permission::Denied, Permission::Granted);
        assert_eq!(
            dispatch(&mut sink, &alert()),
            DispatchResult::Suppressed(Permission::Denied)
        );
        assert_eq!(sink.prompts, 0);
    }

    #[test]
    fn granted_sink_skips_the_prompt() {
        let mut sink = ScriptedSink::new(Permission::Granted, Permission::Denied);
        assert_eq!(dispatch(&mut sink, &alert()), DispatchResult::Sent);
        assert_eq!(sink.prompts, 0);
    }
}
