// Desktop notifier
// macOS: osascript, other unix: notify-send (libnotify)
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use dailyrun_core::port::notifier::{Notification, NotificationKind, Notifier, NotifyError};

/// Native desktop notification, best effort
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

/// Program and arguments that display `notification` on this platform
pub fn notification_command(
    notification: &Notification,
    app_name: &str,
) -> Option<(&'static str, Vec<String>)> {
    if cfg!(target_os = "macos") {
        let sound = match notification.kind {
            NotificationKind::Success => "Glass",
            NotificationKind::Failure => "Basso",
        };
        let script = format!(
            "display notification \"{}\" with title \"{}\" sound name \"{}\"",
            applescript_escape(&notification.message),
            applescript_escape(&notification.title),
            sound
        );
        Some(("osascript", vec!["-e".to_string(), script]))
    } else if cfg!(unix) {
        let urgency = match notification.kind {
            NotificationKind::Success => "normal",
            NotificationKind::Failure => "critical",
        };
        Some((
            "notify-send",
            vec![
                "--urgency".to_string(),
                urgency.to_string(),
                "--app-name".to_string(),
                app_name.to_string(),
                notification.title.clone(),
                notification.message.clone(),
            ],
        ))
    } else {
        None
    }
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (program, args) = notification_command(notification, &self.app_name)
            .ok_or_else(|| NotifyError::Unavailable("unsupported platform".to_string()))?;

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| NotifyError::Unavailable(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            return Err(NotifyError::CommandFailed(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(program, "Desktop notification sent");
        Ok(())
    }
}
