// Runner Configuration
// One explicit object per deployment target (workstation, server) instead of
// paths baked into the job script.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::port::EnvironmentSpec;

pub const DEFAULT_ENV_NAME: &str = ".venv";
pub const DEFAULT_ENTRY_POINT: &str = "run_batch_factor_processing.py";
pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Daily job";
pub const DEFAULT_LOG_SUBDIR: &str = "logs";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration field '{0}' must not be empty")]
    Empty(&'static str),

    #[error("Configuration field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which notifier the composition root wires in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Desktop,
    None,
}

impl std::fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierKind::Desktop => f.write_str("desktop"),
            NotifierKind::None => f.write_str("none"),
        }
    }
}

/// Everything one deployment of the daily job needs.
///
/// Paths are expected to be absolute; the CLI anchors relative ones at the
/// current directory. The runner still copes with a relative `project_dir`
/// for the entry point (see [`RunnerConfig::entry_point_arg`]), but a
/// relative `env_dir` is resolved differently per platform when spawning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Working directory of the entry point
    pub project_dir: PathBuf,
    /// Name of the execution environment directory
    pub env_name: String,
    /// Explicit environment location; defaults to `{project_dir}/../{env_name}`
    pub env_dir: Option<PathBuf>,
    /// Defaults to `{project_dir}/logs`
    pub log_dir: Option<PathBuf>,
    /// Relative paths resolve against `project_dir`
    pub entry_point: PathBuf,
    /// Interpreter executable name inside the environment
    pub interpreter: String,
    pub notifier: NotifierKind,
    pub notification_title: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            env_name: DEFAULT_ENV_NAME.to_string(),
            env_dir: None,
            log_dir: None,
            entry_point: PathBuf::from(DEFAULT_ENTRY_POINT),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            notifier: NotifierKind::default(),
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

impl RunnerConfig {
    pub fn new(project_dir: impl Into<PathBuf>, env_name: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            env_name: env_name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_dir.as_os_str().is_empty() {
            return Err(ConfigError::Empty("project_dir"));
        }
        if self.env_name.trim().is_empty() {
            return Err(ConfigError::Empty("env_name"));
        }
        if self.env_name.contains(|c: char| c == '/' || c == '\\') {
            return Err(ConfigError::Invalid {
                field: "env_name",
                reason: "must be a directory name, use env_dir for a path".to_string(),
            });
        }
        if self.entry_point.as_os_str().is_empty() {
            return Err(ConfigError::Empty("entry_point"));
        }
        if self.interpreter.trim().is_empty() {
            return Err(ConfigError::Empty("interpreter"));
        }
        if let Some(dir) = &self.log_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Empty("log_dir"));
            }
        }
        Ok(())
    }

    /// The environment sits next to the project directory unless `env_dir` says otherwise
    pub fn env_dir(&self) -> PathBuf {
        match &self.env_dir {
            Some(dir) => dir.clone(),
            None => sibling_of(&self.project_dir).join(&self.env_name),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.project_dir.join(DEFAULT_LOG_SUBDIR))
    }

    pub fn entry_point_path(&self) -> PathBuf {
        if self.entry_point.is_absolute() {
            self.entry_point.clone()
        } else {
            self.project_dir.join(&self.entry_point)
        }
    }

    /// Entry point as passed to the interpreter, which runs inside `project_dir`
    pub fn entry_point_arg(&self) -> PathBuf {
        if self.project_dir.is_absolute() {
            self.entry_point_path()
        } else {
            self.entry_point.clone()
        }
    }

    pub fn environment(&self) -> EnvironmentSpec {
        EnvironmentSpec {
            name: self.env_name.clone(),
            dir: self.env_dir(),
            interpreter: self.interpreter.clone(),
        }
    }
}

fn sibling_of(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        // "." or a bare name: step out explicitly
        _ => dir.join(".."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(RunnerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_env_dir_is_adjacent_to_project() {
        let config = RunnerConfig::new("/srv/factors/project", "factor-env");
        assert_eq!(config.env_dir(), PathBuf::from("/srv/factors/factor-env"));
    }

    #[test]
    fn test_env_dir_for_relative_project() {
        let config = RunnerConfig::new(".", "venv");
        assert_eq!(config.env_dir(), PathBuf::from("./../venv"));
    }

    #[test]
    fn test_explicit_env_dir_wins() {
        let config = RunnerConfig {
            env_dir: Some(PathBuf::from("/opt/envs/factor")),
            ..RunnerConfig::new("/srv/project", "ignored")
        };
        assert_eq!(config.env_dir(), PathBuf::from("/opt/envs/factor"));
        assert_eq!(config.environment().name, "ignored");
    }

    #[test]
    fn test_log_dir_and_entry_point_resolution() {
        let mut config = RunnerConfig::new("/srv/project", "venv");
        assert_eq!(config.log_dir(), PathBuf::from("/srv/project/logs"));
        assert_eq!(
            config.entry_point_path(),
            PathBuf::from("/srv/project/run_batch_factor_processing.py")
        );

        config.entry_point = PathBuf::from("/usr/local/bin/factor-job");
        config.log_dir = Some(PathBuf::from("/var/log/factor"));
        assert_eq!(config.entry_point_path(), PathBuf::from("/usr/local/bin/factor-job"));
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/factor"));
    }

    #[test]
    fn test_entry_point_arg_is_relative_to_child_cwd() {
        let relative = RunnerConfig::new("proj", "venv");
        assert_eq!(
            relative.entry_point_arg(),
            PathBuf::from("run_batch_factor_processing.py")
        );

        let absolute = RunnerConfig::new("/srv/proj", "venv");
        assert_eq!(
            absolute.entry_point_arg(),
            PathBuf::from("/srv/proj/run_batch_factor_processing.py")
        );

        let pinned = RunnerConfig {
            entry_point: PathBuf::from("/usr/local/bin/factor-job"),
            ..relative
        };
        assert_eq!(pinned.entry_point_arg(), PathBuf::from("/usr/local/bin/factor-job"));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let base = RunnerConfig::new("/srv/project", "venv");

        let config = RunnerConfig {
            env_name: "  ".to_string(),
            ..base.clone()
        };
        assert_eq!(config.validate(), Err(ConfigError::Empty("env_name")));

        let config = RunnerConfig {
            env_name: "envs/venv".to_string(),
            ..base.clone()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "env_name", .. })
        ));

        let config = RunnerConfig {
            interpreter: String::new(),
            ..base.clone()
        };
        assert_eq!(config.validate(), Err(ConfigError::Empty("interpreter")));

        let config = RunnerConfig {
            project_dir: PathBuf::new(),
            ..base
        };
        assert_eq!(config.validate(), Err(ConfigError::Empty("project_dir")));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: RunnerConfig = serde_json::from_value(serde_json::json!({
            "project_dir": "/srv/project",
            "notifier": "none"
        }))
        .unwrap();

        assert_eq!(config.project_dir, PathBuf::from("/srv/project"));
        assert_eq!(config.notifier, NotifierKind::None);
        assert_eq!(config.env_name, DEFAULT_ENV_NAME);
        assert_eq!(config.interpreter, DEFAULT_INTERPRETER);
    }
}
