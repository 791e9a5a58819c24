// Central Error Type for the Application

use std::path::PathBuf;
use thiserror::Error;

use crate::application::constants::SETUP_FAILURE_EXIT_CODE;

/// Fatal problems before the entry point can be invoked
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Cannot create log directory {}: {source}", path.display())]
    LogDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot create log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project directory not found: {}", .0.display())]
    ProjectDirMissing(PathBuf),

    #[error("Environment activation failed: {0}")]
    Activation(#[from] crate::port::ActivationError),
}

/// Errors a run can end with before the entry point reports an exit code
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Job output unusable before the entry point was started
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit status for an error raised before the entry point reported one
    pub fn exit_code(&self) -> i32 {
        SETUP_FAILURE_EXIT_CODE
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
