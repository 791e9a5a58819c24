// Time Provider Port (for testability)

use chrono::{DateTime, Local};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Current wall-clock time in the system's local timezone.
    /// Run dates and log file names are derived from this.
    fn now_local(&self) -> DateTime<Local>;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Clock frozen at a given instant; `advance` moves it forward
    pub struct FixedTimeProvider {
        now: Mutex<DateTime<Local>>,
    }

    impl FixedTimeProvider {
        pub fn new(now: DateTime<Local>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn advance(&self, duration: chrono::Duration) {
            let mut now = self.now.lock().unwrap();
            *now += duration;
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.lock().unwrap().timestamp_millis()
        }

        fn now_local(&self) -> DateTime<Local> {
            *self.now.lock().unwrap()
        }
    }
}
