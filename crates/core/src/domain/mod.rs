// Domain Layer - Pure run model, no I/O

pub mod error;
pub mod run;
pub mod schedule;

// Re-exports
pub use error::DomainError;
pub use run::{log_file_name, JobOutcome, RunDate, RunId, RunMode, RunRequest};
pub use schedule::{CronSchedule, DEFAULT_SCHEDULE};
