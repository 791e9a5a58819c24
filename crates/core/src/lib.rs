// dailyrun Core - Domain Logic & Ports
// NO infrastructure dependencies (hexagonal layout)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::{NotifierKind, RunnerConfig};
pub use error::{AppError, Result, SetupError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
