// Run Domain Model

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::error::DomainError;

/// Run ID (UUID v4)
pub type RunId = String;

/// Date format accepted by the entry point (`--date YYYYMMDD`)
pub const RUN_DATE_FORMAT: &str = "%Y%m%d";

/// Timestamp format embedded in log file names (second resolution)
pub const LOG_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Calendar date passed to the entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunDate(NaiveDate);

impl RunDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Local calendar date of the given instant
    pub fn from_local<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self(now.with_timezone(&Local).date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for RunDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts shorter digit runs for %Y%m%d, so pin the width first
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidRunDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, RUN_DATE_FORMAT)
            .map(Self)
            .map_err(|_| DomainError::InvalidRunDate(s.to_string()))
    }
}

impl TryFrom<String> for RunDate {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RunDate> for String {
    fn from(date: RunDate) -> Self {
        date.to_string()
    }
}

impl std::fmt::Display for RunDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(RUN_DATE_FORMAT))
    }
}

/// Processing mode understood by the batch entry point.
///
/// The runner only forwards it; `retry` reprocesses the failures recorded by a
/// previous batch run of the same date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Batch,
    Single,
    Retry,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Batch => "batch",
            RunMode::Single => "single",
            RunMode::Retry => "retry",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(RunMode::Batch),
            "single" => Ok(RunMode::Single),
            "retry" => Ok(RunMode::Retry),
            other => Err(DomainError::InvalidRunMode(other.to_string())),
        }
    }
}

/// Name of the per-invocation log file: `daily_job_{YYYYMMDD_HHMMSS}.log`
pub fn log_file_name<Tz: TimeZone>(started_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("daily_job_{}.log", started_at.format(LOG_STAMP_FORMAT))
}

/// What one invocation of the runner asks the entry point to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Overrides today's local date
    pub date: Option<RunDate>,
    pub mode: Option<RunMode>,
    pub workers: Option<u32>,
    pub limit: Option<u32>,
    /// Forwarded verbatim after the generated arguments
    pub extra_args: Vec<String>,
}

impl RunRequest {
    /// Arguments following the entry point path
    pub fn entry_point_args(&self, date: RunDate) -> Vec<String> {
        let mut args = vec!["--date".to_string(), date.to_string()];
        if let Some(mode) = self.mode {
            args.push("--mode".to_string());
            args.push(mode.to_string());
        }
        if let Some(workers) = self.workers {
            args.push("--workers".to_string());
            args.push(workers.to_string());
        }
        if let Some(limit) = self.limit {
            args.push("--limit".to_string());
            args.push(limit.to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Result of one completed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub run_id: RunId,
    pub run_date: RunDate,
    pub log_path: PathBuf,
    pub exit_code: i32,
    pub duration_ms: i64,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_run_date_round_trip_format() {
        let date: RunDate = "20241231".parse().unwrap();
        assert_eq!(date.as_naive(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(date.to_string(), "20241231");
    }

    #[test]
    fn test_run_date_rejects_malformed_input() {
        for raw in ["2024123", "2024-12-31", "20241332", "20240230", "abcdefgh", ""] {
            assert!(
                matches!(raw.parse::<RunDate>(), Err(DomainError::InvalidRunDate(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("batch".parse::<RunMode>().unwrap(), RunMode::Batch);
        assert_eq!(" RETRY ".parse::<RunMode>().unwrap(), RunMode::Retry);
        assert!("parallel".parse::<RunMode>().is_err());
        assert_eq!(RunMode::default(), RunMode::Batch);
    }

    #[test]
    fn test_log_file_name_has_second_resolution() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let a = tz.with_ymd_and_hms(2024, 3, 5, 18, 30, 7).unwrap();
        let b = tz.with_ymd_and_hms(2024, 3, 5, 18, 30, 8).unwrap();

        assert_eq!(log_file_name(&a), "daily_job_20240305_183007.log");
        assert_ne!(log_file_name(&a), log_file_name(&b));
    }

    #[test]
    fn test_entry_point_args_order() {
        let request = RunRequest {
            date: None,
            mode: Some(RunMode::Retry),
            workers: Some(8),
            limit: None,
            extra_args: vec!["--stock".to_string(), "000001.XSHE".to_string()],
        };
        let date: RunDate = "20240305".parse().unwrap();

        assert_eq!(
            request.entry_point_args(date),
            vec![
                "--date", "20240305", "--mode", "retry", "--workers", "8", "--stock",
                "000001.XSHE"
            ]
        );
    }

    #[test]
    fn test_entry_point_args_minimal() {
        let date: RunDate = "20240305".parse().unwrap();
        assert_eq!(
            RunRequest::default().entry_point_args(date),
            vec!["--date", "20240305"]
        );
    }
}
