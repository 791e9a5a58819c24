// Entry Point Executor Port
// Abstraction for running the external batch entry point as an opaque process

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Fully resolved command line for one entry point run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub set_vars: Vec<(String, String)>,
    pub remove_vars: Vec<String>,
}

impl Invocation {
    /// Shell-like rendering for banners and diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the entry point finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    /// Process exit code; `128 + n` when terminated by signal `n`
    pub exit_code: i32,
    pub duration_ms: i64,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Entry Point Executor trait
///
/// Implementations:
/// - SubprocessExecutor: spawns the interpreter as a child process
#[async_trait]
pub trait EntryPointExecutor: Send + Sync {
    /// Run the invocation to completion, writing its combined stdout and
    /// stderr to `output` as it is produced. Blocks until the process exits;
    /// there is no timeout. Once the process has exited its status is
    /// reported even if some output was lost.
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::IoError if the process cannot be observed to exit
    async fn execute(
        &self,
        invocation: &Invocation,
        output: &mut (dyn Write + Send),
    ) -> Result<ExitReport, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Print the output, then exit with the code
        Exit { code: i32, output: String },
        /// Fail to spawn with message
        SpawnFail(String),
    }

    /// Mock Entry Point Executor for testing
    pub struct MockEntryPointExecutor {
        behavior: MockBehavior,
        invocations: Arc<Mutex<Vec<Invocation>>>,
    }

    impl MockEntryPointExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                invocations: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_exit(code: i32, output: impl Into<String>) -> Self {
            Self::new(MockBehavior::Exit {
                code,
                output: output.into(),
            })
        }

        pub fn new_spawn_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::SpawnFail(message.into()))
        }

        pub fn call_count(&self) -> usize {
            self.invocations.lock().unwrap().len()
        }

        pub fn invocations(&self) -> Vec<Invocation> {
            self.invocations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntryPointExecutor for MockEntryPointExecutor {
        async fn execute(
            &self,
            invocation: &Invocation,
            output: &mut (dyn Write + Send),
        ) -> Result<ExitReport, ExecutionError> {
            self.invocations.lock().unwrap().push(invocation.clone());

            match &self.behavior {
                MockBehavior::Exit { code, output: text } => {
                    output
                        .write_all(text.as_bytes())
                        .map_err(|e| ExecutionError::IoError(e.to_string()))?;
                    Ok(ExitReport {
                        exit_code: *code,
                        duration_ms: 100,
                    })
                }
                MockBehavior::SpawnFail(msg) => Err(ExecutionError::SpawnFailed(msg.clone())),
            }
        }
    }
}
