// Port Layer - Interfaces for external dependencies

pub mod activator;
pub mod entry_point;
pub mod id_provider; // For deterministic testing
pub mod log_store;
pub mod notifier;
pub mod time_provider;

// Re-exports
pub use activator::{ActivatedEnvironment, ActivationError, EnvironmentActivator, EnvironmentSpec};
pub use entry_point::{EntryPointExecutor, ExecutionError, ExitReport, Invocation};
pub use id_provider::IdProvider;
pub use log_store::{LogStore, LogWriter};
pub use notifier::{NoopNotifier, Notification, NotificationKind, Notifier, NotifyError};
pub use time_provider::TimeProvider;
