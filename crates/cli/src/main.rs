//! dailyrun - Daily batch job runner
//!
//! Prepares the log location, activates the execution environment, runs the
//! batch entry point for today's date and reports the result through the exit
//! code and a desktop notification. Meant to be started by cron.

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::{error, info};

use dailyrun_core::application::constants::SETUP_FAILURE_EXIT_CODE;
use dailyrun_core::application::JobRunner;
use dailyrun_core::domain::{CronSchedule, RunDate, RunMode, RunRequest, DEFAULT_SCHEDULE};
use dailyrun_core::port::id_provider::UuidProvider;
use dailyrun_core::port::time_provider::SystemTimeProvider;
use dailyrun_core::port::{NoopNotifier, Notifier};
use dailyrun_core::{NotifierKind, RunnerConfig};
use dailyrun_infra_system::{DesktopNotifier, FsLogStore, SubprocessExecutor, VenvActivator};

const APP_NAME: &str = "dailyrun";

#[derive(Parser)]
#[command(name = "dailyrun")]
#[command(about = "Run the daily batch job with logging and notifications", long_about = None)]
#[command(version)]
struct Cli {
    /// Defaults to `run` with no extra arguments
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "DAILYRUN_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Project directory the entry point runs in
    #[arg(long, global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Execution environment name (directory next to the project)
    #[arg(long, global = true)]
    env_name: Option<String>,

    /// Directory for daily_job_*.log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Entry point script, relative to the project directory
    #[arg(long, global = true, value_name = "PATH")]
    entry_point: Option<PathBuf>,

    /// Disable desktop notifications
    #[arg(long, global = true)]
    no_notify: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the entry point once (default)
    Run(RunArgs),

    /// Print a crontab line that schedules this runner
    Crontab {
        /// Five-field cron expression
        #[arg(long, default_value = DEFAULT_SCHEDULE)]
        schedule: String,
    },

    /// Show the resolved configuration
    ShowConfig {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Data date (YYYYMMDD), defaults to today
    #[arg(long)]
    date: Option<RunDate>,

    /// Processing mode forwarded to the entry point (batch, single, retry)
    #[arg(long)]
    mode: Option<RunMode>,

    /// Worker threads forwarded to the entry point
    #[arg(long)]
    workers: Option<u32>,

    /// Limit on the number of stocks, forwarded to the entry point
    #[arg(long)]
    limit: Option<u32>,

    /// Extra arguments passed through verbatim (after `--`)
    #[arg(last = true)]
    extra: Vec<String>,
}

impl From<RunArgs> for RunRequest {
    fn from(args: RunArgs) -> Self {
        RunRequest {
            date: args.date,
            mode: args.mode,
            workers: args.workers,
            limit: args.limit,
            extra_args: args.extra,
        }
    }
}

#[derive(Tabled)]
struct ConfigRow {
    key: &'static str,
    value: String,
}

#[derive(Serialize)]
struct ResolvedConfig<'a> {
    #[serde(flatten)]
    runner: &'a RunnerConfig,
    resolved_env_dir: PathBuf,
    resolved_log_dir: PathBuf,
    resolved_entry_point: PathBuf,
    config_file: Option<&'a PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = telemetry::init_logging();

    match dispatch(cli).await {
        Ok(code) => to_exit_code(code),
        Err(e) => {
            error!(error = %format!("{:#}", e), "dailyrun failed");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            to_exit_code(SETUP_FAILURE_EXIT_CODE)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<i32> {
    let overrides = settings::Overrides {
        project_dir: cli.project_dir,
        env_name: cli.env_name,
        log_dir: cli.log_dir,
        entry_point: cli.entry_point,
        no_notify: cli.no_notify,
    };
    let settings = settings::load(cli.config.as_deref(), &overrides)?;

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(settings.runner, args.into()).await,
        Commands::Crontab { schedule } => {
            crontab(&schedule, settings.source_file.as_ref())?;
            Ok(0)
        }
        Commands::ShowConfig { json } => {
            show_config(&settings, json)?;
            Ok(0)
        }
    }
}

async fn run(config: RunnerConfig, request: RunRequest) -> Result<i32> {
    info!(
        version = dailyrun_core::VERSION,
        project_dir = %config.project_dir.display(),
        "dailyrun starting"
    );

    // DI wiring
    let time_provider = Arc::new(SystemTimeProvider);
    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new(APP_NAME)),
        NotifierKind::None => Arc::new(NoopNotifier),
    };
    let runner = JobRunner::new(
        config,
        Arc::new(FsLogStore),
        Arc::new(VenvActivator::new()),
        Arc::new(SubprocessExecutor::new(time_provider.clone())),
        notifier,
        time_provider,
        Arc::new(UuidProvider),
    );

    match runner.run(&request, Box::new(std::io::stdout())).await {
        Ok(outcome) => {
            if outcome.is_success() {
                eprintln!(
                    "{} run {} finished (log: {})",
                    "OK".green().bold(),
                    outcome.run_date,
                    outcome.log_path.display()
                );
            } else {
                eprintln!(
                    "{} run {} exited with code {} (log: {})",
                    "FAILED".red().bold(),
                    outcome.run_date,
                    outcome.exit_code,
                    outcome.log_path.display()
                );
            }
            Ok(outcome.exit_code)
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            Ok(e.exit_code())
        }
    }
}

fn crontab(schedule: &str, config_file: Option<&PathBuf>) -> Result<()> {
    let schedule = CronSchedule::parse(schedule)?;
    let exe = std::env::current_exe().context("Cannot locate the dailyrun executable")?;

    let mut command = format!("{} {}", schedule, shell_quote(&exe.display().to_string()));
    if let Some(file) = config_file {
        command.push_str(&format!(
            " --config {}",
            shell_quote(&file.display().to_string())
        ));
    }
    command.push_str(" run");

    println!("# dailyrun: daily batch job");
    println!("{}", command);
    Ok(())
}

fn shell_quote(raw: &str) -> String {
    if raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-+:".contains(c))
    {
        raw.to_string()
    } else {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
}

fn show_config(settings: &settings::Settings, json: bool) -> Result<()> {
    let runner = &settings.runner;

    if json {
        let resolved = ResolvedConfig {
            runner,
            resolved_env_dir: runner.env_dir(),
            resolved_log_dir: runner.log_dir(),
            resolved_entry_point: runner.entry_point_path(),
            config_file: settings.source_file.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    let rows = vec![
        ConfigRow {
            key: "config_file",
            value: settings
                .source_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
        },
        ConfigRow {
            key: "project_dir",
            value: runner.project_dir.display().to_string(),
        },
        ConfigRow {
            key: "env_name",
            value: runner.env_name.clone(),
        },
        ConfigRow {
            key: "env_dir",
            value: runner.env_dir().display().to_string(),
        },
        ConfigRow {
            key: "log_dir",
            value: runner.log_dir().display().to_string(),
        },
        ConfigRow {
            key: "entry_point",
            value: runner.entry_point_path().display().to_string(),
        },
        ConfigRow {
            key: "interpreter",
            value: runner.interpreter.clone(),
        },
        ConfigRow {
            key: "notifier",
            value: runner.notifier.to_string(),
        },
        ConfigRow {
            key: "notification_title",
            value: runner.notification_title.clone(),
        },
    ];
    println!("{}", Table::new(rows));
    Ok(())
}

fn to_exit_code(code: i32) -> ExitCode {
    match exit_status_byte(code) {
        Some(code) => ExitCode::from(code),
        None => ExitCode::FAILURE,
    }
}

/// Codes outside 0..=255 (e.g. Windows NTSTATUS values) have no portable form
fn exit_status_byte(code: i32) -> Option<u8> {
    u8::try_from(code).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["dailyrun"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.no_notify);
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "dailyrun",
            "run",
            "--date",
            "20240305",
            "--mode",
            "retry",
            "--workers",
            "8",
            "--no-notify",
            "--",
            "--stock",
            "000001.XSHE",
        ])
        .unwrap();

        assert!(cli.no_notify);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        let request: RunRequest = args.into();
        assert_eq!(request.date.unwrap().to_string(), "20240305");
        assert_eq!(request.mode, Some(RunMode::Retry));
        assert_eq!(request.workers, Some(8));
        assert_eq!(request.extra_args, vec!["--stock", "000001.XSHE"]);
    }

    #[test]
    fn test_invalid_date_rejected_by_parser() {
        assert!(Cli::try_parse_from(["dailyrun", "run", "--date", "2024-03-05"]).is_err());
        assert!(Cli::try_parse_from(["dailyrun", "run", "--mode", "parallel"]).is_err());
    }

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(exit_status_byte(0), Some(0));
        assert_eq!(exit_status_byte(3), Some(3));
        assert_eq!(exit_status_byte(137), Some(137));
        assert_eq!(exit_status_byte(-1), None);
        assert_eq!(exit_status_byte(0xC000_0005_u32 as i32), None);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/usr/local/bin/dailyrun"), "/usr/local/bin/dailyrun");
        assert_eq!(shell_quote("/Users/me/My Jobs/cfg.toml"), "'/Users/me/My Jobs/cfg.toml'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
