// Start/end banners written around the entry point's output

use chrono::{DateTime, Local};

use super::constants::{BANNER_TIME_FORMAT, BANNER_WIDTH};
use crate::domain::{RunDate, RunId};

/// First line of the start banner; its absence means the entry point never ran
pub const START_MARKER: &str = "Start processing daily job";

pub fn start_banner(
    run_id: &RunId,
    run_date: RunDate,
    started_at: &DateTime<Local>,
    command_line: &str,
) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!(
        "{rule}\n{START_MARKER}\nRun ID:     {run_id}\nRun date:   {run_date}\nStarted at: {}\nCommand:    {command_line}\n{rule}\n",
        started_at.format(BANNER_TIME_FORMAT)
    )
}

pub fn end_banner(finished_at: &DateTime<Local>, exit_code: i32, duration_ms: i64) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!(
        "{rule}\nFinished at: {}\nDuration:    {:.1}s\nExit code: {exit_code}\n{rule}\n",
        finished_at.format(BANNER_TIME_FORMAT),
        duration_ms as f64 / 1000.0
    )
}
