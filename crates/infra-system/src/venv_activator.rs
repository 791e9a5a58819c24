// Virtualenv activator
// Does what `source {env}/bin/activate` does, but for the child process only.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use dailyrun_core::port::activator::{
    ActivatedEnvironment, ActivationError, EnvironmentActivator, EnvironmentSpec,
};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

/// Python virtualenv activator
pub struct VenvActivator;

impl VenvActivator {
    pub fn new() -> Self {
        Self
    }

    fn activate_with_path(
        &self,
        spec: &EnvironmentSpec,
        base_path: Option<OsString>,
    ) -> Result<ActivatedEnvironment, ActivationError> {
        if !spec.dir.is_dir() {
            return Err(ActivationError::NotFound {
                name: spec.name.clone(),
                dir: spec.dir.clone(),
            });
        }

        let bin_dir = spec.dir.join(BIN_DIR);
        let interpreter = bin_dir.join(executable_name(&spec.interpreter));
        if !interpreter.is_file() {
            return Err(ActivationError::MissingInterpreter(interpreter));
        }

        let path = prepend_path(&bin_dir, base_path)?;
        debug!(env_dir = %spec.dir.display(), "Resolved virtualenv");

        Ok(ActivatedEnvironment {
            interpreter,
            set_vars: vec![
                ("VIRTUAL_ENV".to_string(), spec.dir.display().to_string()),
                ("PATH".to_string(), path),
            ],
            // a stray PYTHONHOME breaks the venv's stdlib lookup
            remove_vars: vec!["PYTHONHOME".to_string()],
        })
    }
}

impl Default for VenvActivator {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentActivator for VenvActivator {
    fn activate(&self, spec: &EnvironmentSpec) -> Result<ActivatedEnvironment, ActivationError> {
        self.activate_with_path(spec, std::env::var_os("PATH"))
    }
}

fn executable_name(interpreter: &str) -> PathBuf {
    let name = PathBuf::from(interpreter);
    if cfg!(windows) && name.extension().is_none() {
        name.with_extension("exe")
    } else {
        name
    }
}

fn prepend_path(bin_dir: &Path, base_path: Option<OsString>) -> Result<String, ActivationError> {
    let mut entries = vec![bin_dir.to_path_buf()];
    if let Some(base) = base_path {
        entries.extend(std::env::split_paths(&base));
    }
    std::env::join_paths(entries)
        .map_err(|e| ActivationError::InvalidPath(e.to_string()))?
        .into_string()
        .map_err(|raw| ActivationError::InvalidPath(raw.to_string_lossy().into_owned()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn spec(dir: &Path) -> EnvironmentSpec {
        EnvironmentSpec {
            name: "factor-env".to_string(),
            dir: dir.to_path_buf(),
            interpreter: "python".to_string(),
        }
    }

    fn make_venv(root: &Path) -> PathBuf {
        let env_dir = root.join("factor-env");
        fs::create_dir_all(env_dir.join("bin")).unwrap();
        fs::write(env_dir.join("bin/python"), "#!/bin/sh\n").unwrap();
        env_dir
    }

    #[test]
    fn test_activate_existing_venv() {
        let root = tempfile::tempdir().unwrap();
        let env_dir = make_venv(root.path());

        let activated = VenvActivator::new()
            .activate_with_path(&spec(&env_dir), Some(OsString::from("/usr/bin:/bin")))
            .unwrap();

        assert_eq!(activated.interpreter, env_dir.join("bin/python"));
        assert!(activated
            .set_vars
            .contains(&("VIRTUAL_ENV".to_string(), env_dir.display().to_string())));
        let path = &activated
            .set_vars
            .iter()
            .find(|(k, _)| k == "PATH")
            .unwrap()
            .1;
        assert_eq!(
            path,
            &format!("{}:/usr/bin:/bin", env_dir.join("bin").display())
        );
        assert_eq!(activated.remove_vars, vec!["PYTHONHOME".to_string()]);
    }

    #[test]
    fn test_missing_env_dir() {
        let root = tempfile::tempdir().unwrap();

        let result = VenvActivator::new().activate(&spec(&root.path().join("absent")));

        assert!(matches!(result, Err(ActivationError::NotFound { .. })));
    }

    #[test]
    fn test_env_without_interpreter() {
        let root = tempfile::tempdir().unwrap();
        let env_dir = root.path().join("factor-env");
        fs::create_dir_all(env_dir.join("bin")).unwrap();

        let result = VenvActivator::new().activate(&spec(&env_dir));

        assert!(matches!(result, Err(ActivationError::MissingInterpreter(_))));
    }

    #[test]
    fn test_empty_base_path() {
        let root = tempfile::tempdir().unwrap();
        let env_dir = make_venv(root.path());

        let activated = VenvActivator::new()
            .activate_with_path(&spec(&env_dir), None)
            .unwrap();

        assert!(activated
            .set_vars
            .contains(&("PATH".to_string(), env_dir.join("bin").display().to_string())));
    }
}
