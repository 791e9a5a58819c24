// Subprocess executor implementation
// reason: tokio for async process management and concurrent pipe draining
use async_trait::async_trait;
use std::io::Write;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use dailyrun_core::application::constants::{SETUP_FAILURE_EXIT_CODE, SIGNAL_EXIT_CODE_BASE};
use dailyrun_core::port::entry_point::{
    EntryPointExecutor, ExecutionError, ExitReport, Invocation,
};
use dailyrun_core::port::TimeProvider;

/// Subprocess executor
/// Spawns the entry point and streams its stdout and stderr, interleaved as
/// lines arrive, into the caller's writer.
pub struct SubprocessExecutor {
    time_provider: Arc<dyn TimeProvider>,
}

impl SubprocessExecutor {
    /// Create a new subprocess executor
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(Arc::new(SystemTimeProvider));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    fn build_command(invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for key in &invocation.remove_vars {
            command.env_remove(key);
        }
        command.envs(invocation.set_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }
}

/// Copy both pipes line by line until both reach EOF.
///
/// Forwarding errors are logged once and then ignored: the pipes are still
/// drained so the child never blocks on a full pipe.
async fn forward_output<O, E>(
    stdout: O,
    stderr: E,
    output: &mut (dyn Write + Send),
) -> Result<(), ExecutionError>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let mut stdout_line = Vec::new();
    let mut stderr_line = Vec::new();
    let mut stdout_open = true;
    let mut stderr_open = true;
    let mut sink_healthy = true;

    while stdout_open || stderr_open {
        // read_until keeps partial reads in the buffer, so losing the race is harmless
        tokio::select! {
            read = stdout.read_until(b'\n', &mut stdout_line), if stdout_open => {
                let n = read.map_err(|e| ExecutionError::IoError(e.to_string()))?;
                if n == 0 {
                    stdout_open = false;
                } else {
                    forward_line(output, &stdout_line, &mut sink_healthy);
                    stdout_line.clear();
                }
            }
            read = stderr.read_until(b'\n', &mut stderr_line), if stderr_open => {
                let n = read.map_err(|e| ExecutionError::IoError(e.to_string()))?;
                if n == 0 {
                    stderr_open = false;
                } else {
                    forward_line(output, &stderr_line, &mut sink_healthy);
                    stderr_line.clear();
                }
            }
        }
    }

    if sink_healthy {
        if let Err(e) = output.flush() {
            warn!(error = %e, "Failed to flush entry point output");
        }
    }
    Ok(())
}

fn forward_line(output: &mut (dyn Write + Send), line: &[u8], sink_healthy: &mut bool) {
    if !*sink_healthy {
        return;
    }
    if let Err(e) = output.write_all(line).and_then(|_| output.flush()) {
        warn!(error = %e, "Failed to forward entry point output, discarding the rest");
        *sink_healthy = false;
    }
}

/// Exit code of a finished child. A forwarding failure only cost output,
/// so the status the process returned still decides the result.
fn settle(status: ExitStatus, forwarded: Result<(), ExecutionError>) -> i32 {
    let exit_code = exit_code_of(status);
    if let Err(e) = forwarded {
        warn!(error = %e, exit_code, "Entry point output was cut short");
    }
    exit_code
}

/// Exit code as a shell would report it
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_CODE_BASE + signal;
        }
    }

    SETUP_FAILURE_EXIT_CODE
}

#[async_trait]
impl EntryPointExecutor for SubprocessExecutor {
    async fn execute(
        &self,
        invocation: &Invocation,
        output: &mut (dyn Write + Send),
    ) -> Result<ExitReport, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            working_dir = %invocation.working_dir.display(),
            "Starting subprocess execution"
        );

        let mut child = Self::build_command(invocation).spawn().map_err(|e| {
            ExecutionError::SpawnFailed(format!("{}: {}", invocation.program.display(), e))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecutionError::IoError("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExecutionError::IoError("stderr not captured".to_string()))?;

        let forwarded = forward_output(stdout, stderr, output).await;
        let status = child
            .wait()
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let exit_code = settle(status, forwarded);

        info!(
            program = %invocation.program.display(),
            duration_ms = %duration_ms,
            exit_code = exit_code,
            "Subprocess execution completed"
        );

        Ok(ExitReport {
            exit_code,
            duration_ms,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use dailyrun_core::application::SharedBuffer;
    use dailyrun_core::port::time_provider::SystemTimeProvider;
    use std::path::PathBuf;

    fn sh(script: &str) -> Invocation {
        Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: std::env::temp_dir(),
            set_vars: vec![],
            remove_vars: vec![],
        }
    }

    fn executor() -> SubprocessExecutor {
        SubprocessExecutor::new(Arc::new(SystemTimeProvider))
    }

    #[tokio::test]
    async fn test_execute_success() {
        let mut output = SharedBuffer::new();

        let report = executor()
            .execute(&sh("echo hello"), &mut output)
            .await
            .unwrap();

        assert_eq!(report.exit_code, 0);
        assert_eq!(output.contents(), "hello\n");
    }

    #[tokio::test]
    async fn test_exit_code_is_propagated() {
        let mut output = SharedBuffer::new();

        let report = executor()
            .execute(&sh("echo failing >&2; exit 3"), &mut output)
            .await
            .unwrap();

        assert_eq!(report.exit_code, 3);
        assert_eq!(output.contents(), "failing\n");
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_are_combined() {
        let mut output = SharedBuffer::new();

        executor()
            .execute(&sh("echo out; echo err >&2; printf tail"), &mut output)
            .await
            .unwrap();

        let text = output.contents();
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
        assert!(text.contains("tail"));
    }

    #[tokio::test]
    async fn test_killed_by_signal_maps_to_128_plus_signal() {
        let mut output = SharedBuffer::new();

        let report = executor()
            .execute(&sh("kill -9 $$"), &mut output)
            .await
            .unwrap();

        assert_eq!(report.exit_code, 128 + 9);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let mut invocation = sh("true");
        invocation.program = PathBuf::from("/nonexistent/bin/python");
        let mut output = SharedBuffer::new();

        let result = executor().execute(&invocation, &mut output).await;

        assert!(matches!(result, Err(ExecutionError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_working_dir_and_environment() {
        let dir = tempfile::tempdir().unwrap();
        let mut invocation = sh("pwd; echo \"venv=$VIRTUAL_ENV\"; echo \"home=${PYTHONHOME:-unset}\"");
        invocation.working_dir = dir.path().to_path_buf();
        invocation.set_vars = vec![("VIRTUAL_ENV".to_string(), "/envs/factor".to_string())];
        invocation.remove_vars = vec!["PYTHONHOME".to_string()];
        let mut output = SharedBuffer::new();

        executor().execute(&invocation, &mut output).await.unwrap();

        let text = output.contents();
        let reported = PathBuf::from(text.lines().next().unwrap());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert!(text.contains("venv=/envs/factor\n"));
        assert!(text.contains("home=unset\n"));
    }

    struct FailingPipe;

    impl AsyncRead for FailingPipe {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "pipe broke",
            )))
        }
    }

    #[tokio::test]
    async fn test_pipe_read_error_is_reported() {
        let mut output = SharedBuffer::new();

        let result = forward_output(&b"out\n"[..], FailingPipe, &mut output).await;

        assert!(matches!(result, Err(ExecutionError::IoError(_))));
    }

    #[test]
    fn test_forwarding_failure_keeps_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        let exited_3 = ExitStatus::from_raw(3 << 8);
        let lost_output = Err(ExecutionError::IoError("pipe broke".to_string()));

        assert_eq!(settle(exited_3, lost_output), 3);
        assert_eq!(settle(ExitStatus::from_raw(0), Ok(())), 0);
    }

    #[tokio::test]
    async fn test_broken_sink_still_waits_for_exit() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let report = executor()
            .execute(&sh("seq 1 20000; exit 4"), &mut Closed)
            .await
            .unwrap();

        assert_eq!(report.exit_code, 4);
    }
}
