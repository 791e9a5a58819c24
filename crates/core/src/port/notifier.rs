// Notifier Port
// Best-effort end-of-run alerts; delivery failures never change the run's exit code

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failure,
}

/// A single end-of-run alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification facility unavailable: {0}")]
    Unavailable(String),

    #[error("Notification command failed: {0}")]
    CommandFailed(String),
}

/// Notifier trait
///
/// Implementations:
/// - DesktopNotifier: native desktop alert (osascript / notify-send)
/// - NoopNotifier: headless servers
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that drops every notification
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::debug!(title = %notification.title, "Notifications disabled, skipping");
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every notification; optionally reports delivery failure
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Notification>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn new_failing() -> Self {
            Self {
                sent: Arc::default(),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                return Err(NotifyError::Unavailable("mock failure".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::RecordingNotifier;
    use super::*;

    fn success() -> Notification {
        Notification {
            kind: NotificationKind::Success,
            title: "Daily job".to_string(),
            message: "Run 20240305 completed successfully".to_string(),
        }
    }

    #[test]
    fn test_noop_notifier_always_succeeds() {
        assert!(tokio_test::block_on(NoopNotifier.notify(&success())).is_ok());
    }

    #[test]
    fn test_recording_notifier_records_even_when_failing() {
        let notifier = RecordingNotifier::new_failing();

        let result = tokio_test::block_on(notifier.notify(&success()));

        assert!(matches!(result, Err(NotifyError::Unavailable(_))));
        assert_eq!(notifier.sent(), vec![success()]);
    }
}
