// Daily Job Runner - the use case wrapping one entry point invocation
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

use super::banner::{end_banner, start_banner};
use super::constants::{SETUP_FAILURE_EXIT_CODE, SPAWN_FAILURE_EXIT_CODE};
use super::fanout::{FanOutWriter, Sink};
use crate::config::RunnerConfig;
use crate::domain::{log_file_name, JobOutcome, RunDate, RunId, RunRequest};
use crate::error::{Result, SetupError};
use crate::port::{
    ActivatedEnvironment, EntryPointExecutor, EnvironmentActivator, ExecutionError, ExitReport,
    IdProvider, Invocation, LogStore, Notification, NotificationKind, Notifier, TimeProvider,
};

/// Runs the external batch entry point once, with logging and notification.
///
/// Order of operations:
/// 1. create the log directory (idempotent)
/// 2. create `daily_job_{YYYYMMDD_HHMMSS}.log`
/// 3. check the project directory (fatal if missing)
/// 4. activate the execution environment (fatal if it fails, reason logged)
/// 5. resolve the run date (today, local clock, unless overridden)
/// 6. invoke the entry point, output teed to console and log file
/// 7. notify success or failure, exactly once
///
/// Nothing is retried here; a rerun is a new invocation with `--mode retry`.
pub struct JobRunner {
    config: RunnerConfig,
    log_store: Arc<dyn LogStore>,
    activator: Arc<dyn EnvironmentActivator>,
    executor: Arc<dyn EntryPointExecutor>,
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl JobRunner {
    pub fn new(
        config: RunnerConfig,
        log_store: Arc<dyn LogStore>,
        activator: Arc<dyn EnvironmentActivator>,
        executor: Arc<dyn EntryPointExecutor>,
        notifier: Arc<dyn Notifier>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            config,
            log_store,
            activator,
            executor,
            notifier,
            time_provider,
            id_provider,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute one run. `console` is the second destination of the entry
    /// point's output, next to the log file.
    ///
    /// # Errors
    /// Setup failures (log location, project directory, activation). A failing
    /// entry point is not an error: its exit code is in the returned outcome.
    pub async fn run(&self, request: &RunRequest, console: Sink) -> Result<JobOutcome> {
        let run_id = self.id_provider.generate_id();
        let span = info_span!("daily_job", run_id = %run_id);
        self.run_inner(run_id, request, console)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: RunId,
        request: &RunRequest,
        console: Sink,
    ) -> Result<JobOutcome> {
        // 1-2. Log location
        let log_dir = self.config.log_dir();
        self.log_store
            .ensure_dir(&log_dir)
            .map_err(|source| SetupError::LogDir {
                path: log_dir.clone(),
                source,
            })?;

        let started_at = self.time_provider.now_local();
        let log_path = log_dir.join(log_file_name(&started_at));
        let mut log_file = self
            .log_store
            .create(&log_path)
            .map_err(|source| SetupError::LogFile {
                path: log_path.clone(),
                source,
            })?;
        info!(log_path = %log_path.display(), "Log file created");

        // 3. Project directory
        if !self.config.project_dir.is_dir() {
            error!(
                project_dir = %self.config.project_dir.display(),
                "Project directory not found"
            );
            return Err(SetupError::ProjectDirMissing(self.config.project_dir.clone()).into());
        }

        // 4. Environment
        let environment = self.config.environment();
        let activated = match self.activator.activate(&environment) {
            Ok(activated) => activated,
            Err(e) => {
                error!(env = %environment.name, error = %e, "Environment activation failed");
                if let Err(write_err) =
                    writeln!(log_file, "Environment activation failed: {}", e)
                {
                    warn!(error = %write_err, "Could not record activation failure in log file");
                }
                return Err(SetupError::Activation(e).into());
            }
        };
        info!(
            env = %environment.name,
            interpreter = %activated.interpreter.display(),
            "Environment activated"
        );

        // 5-6. Invoke
        let run_date = request
            .date
            .unwrap_or_else(|| RunDate::from_local(&started_at));
        let invocation = self.build_invocation(activated, request, run_date);

        // A console that goes away is detached; the log file keeps receiving output
        let mut output = FanOutWriter::new().with_sink(log_file).with_sink(console);

        output.write_all(
            start_banner(
                &run_id,
                run_date,
                &started_at,
                &invocation.command_line(),
            )
            .as_bytes(),
        )?;
        output.flush()?;

        info!(
            run_date = %run_date,
            command = %invocation.command_line(),
            "Invoking entry point"
        );
        let start_millis = self.time_provider.now_millis();
        let report = match self.executor.execute(&invocation, &mut output).await {
            Ok(report) => report,
            Err(e) => {
                let exit_code = match e {
                    ExecutionError::SpawnFailed(_) => SPAWN_FAILURE_EXIT_CODE,
                    ExecutionError::IoError(_) => SETUP_FAILURE_EXIT_CODE,
                };
                error!(error = %e, exit_code, "Entry point did not complete");
                write_best_effort(&mut output, &format!("Entry point failed: {}\n", e));
                ExitReport {
                    exit_code,
                    duration_ms: self.time_provider.now_millis() - start_millis,
                }
            }
        };

        // From here on the exit code is known: output problems must not replace it
        let finished_at = self.time_provider.now_local();
        write_best_effort(
            &mut output,
            &end_banner(&finished_at, report.exit_code, report.duration_ms),
        );

        let outcome = JobOutcome {
            run_id,
            run_date,
            log_path,
            exit_code: report.exit_code,
            duration_ms: report.duration_ms,
        };

        if outcome.is_success() {
            info!(
                exit_code = outcome.exit_code,
                duration_ms = outcome.duration_ms,
                "Daily job succeeded"
            );
        } else {
            error!(
                exit_code = outcome.exit_code,
                duration_ms = outcome.duration_ms,
                log_path = %outcome.log_path.display(),
                "Daily job failed"
            );
        }

        // 7. Notify (best effort)
        self.notify(&outcome).await;

        Ok(outcome)
    }

    fn build_invocation(
        &self,
        activated: ActivatedEnvironment,
        request: &RunRequest,
        run_date: RunDate,
    ) -> Invocation {
        let mut args = vec![self.config.entry_point_arg().display().to_string()];
        args.extend(request.entry_point_args(run_date));

        Invocation {
            program: activated.interpreter,
            args,
            working_dir: self.config.project_dir.clone(),
            set_vars: activated.set_vars,
            remove_vars: activated.remove_vars,
        }
    }

    async fn notify(&self, outcome: &JobOutcome) {
        let notification = build_notification(&self.config.notification_title, outcome);
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %e, "Notification not delivered");
        }
    }
}

fn write_best_effort(output: &mut impl Write, text: &str) {
    if let Err(e) = output.write_all(text.as_bytes()).and_then(|_| output.flush()) {
        warn!(error = %e, "Could not write to job output");
    }
}

fn build_notification(title: &str, outcome: &JobOutcome) -> Notification {
    if outcome.is_success() {
        Notification {
            kind: NotificationKind::Success,
            title: title.to_string(),
            message: format!("Run {} completed successfully", outcome.run_date),
        }
    } else {
        Notification {
            kind: NotificationKind::Failure,
            title: title.to_string(),
            message: format!(
                "Run {} failed with exit code {}. Log: {}",
                outcome.run_date,
                outcome.exit_code,
                outcome.log_path.display()
            ),
        }
    }
}
