// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid run date '{0}' (expected YYYYMMDD)")]
    InvalidRunDate(String),

    #[error("Invalid run mode '{0}' (expected batch, single or retry)")]
    InvalidRunMode(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
