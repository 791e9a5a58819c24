// dailyrun Infrastructure - System Adapters
// Implements: EntryPointExecutor, EnvironmentActivator, Notifier, LogStore

pub mod desktop_notifier;
pub mod fs_log_store;
pub mod subprocess_executor;
pub mod venv_activator;

pub use desktop_notifier::DesktopNotifier;
pub use fs_log_store::FsLogStore;
pub use subprocess_executor::SubprocessExecutor;
pub use venv_activator::VenvActivator;
