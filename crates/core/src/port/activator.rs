// Environment Activator Port
// Resolves the isolated runtime (interpreter + dependencies) the entry point runs in

use std::path::PathBuf;
use thiserror::Error;

/// Named execution environment to activate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSpec {
    pub name: String,
    pub dir: PathBuf,
    /// Interpreter executable name inside the environment (e.g. `python`)
    pub interpreter: String,
}

/// An activated environment, applied to the child process only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedEnvironment {
    pub interpreter: PathBuf,
    pub set_vars: Vec<(String, String)>,
    pub remove_vars: Vec<String>,
}

/// Activation errors
#[derive(Error, Debug)]
pub enum ActivationError {
    #[error("Environment '{name}' not found at {}", dir.display())]
    NotFound { name: String, dir: PathBuf },

    #[error("Interpreter not found at {}", .0.display())]
    MissingInterpreter(PathBuf),

    #[error("Cannot build PATH for environment: {0}")]
    InvalidPath(String),
}

/// Environment Activator trait
///
/// Implementations:
/// - VenvActivator: Python virtualenv directory (`bin/` or `Scripts/`)
pub trait EnvironmentActivator: Send + Sync {
    /// Resolve the environment without touching the current process
    ///
    /// # Errors
    /// - ActivationError::NotFound if the environment directory does not exist
    /// - ActivationError::MissingInterpreter if it has no usable interpreter
    fn activate(&self, spec: &EnvironmentSpec) -> Result<ActivatedEnvironment, ActivationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock activator that either resolves to a fixed interpreter or fails
    pub struct MockActivator {
        interpreter: Option<PathBuf>,
        calls: AtomicUsize,
    }

    impl MockActivator {
        pub fn new_success(interpreter: impl Into<PathBuf>) -> Self {
            Self {
                interpreter: Some(interpreter.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn new_missing() -> Self {
            Self {
                interpreter: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EnvironmentActivator for MockActivator {
        fn activate(
            &self,
            spec: &EnvironmentSpec,
        ) -> Result<ActivatedEnvironment, ActivationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.interpreter {
                Some(interpreter) => Ok(ActivatedEnvironment {
                    interpreter: interpreter.clone(),
                    set_vars: vec![(
                        "VIRTUAL_ENV".to_string(),
                        spec.dir.display().to_string(),
                    )],
                    remove_vars: vec![],
                }),
                None => Err(ActivationError::NotFound {
                    name: spec.name.clone(),
                    dir: spec.dir.clone(),
                }),
            }
        }
    }
}
