//! Layered configuration loading
//!
//! Precedence, lowest first:
//! 1. built-in defaults (`RunnerConfig::default`)
//! 2. TOML file: `--config` / `DAILYRUN_CONFIG`, else `{config_dir}/dailyrun/config.toml` if present
//! 3. `DAILYRUN_*` environment variables (e.g. `DAILYRUN_PROJECT_DIR`)
//! 4. command-line flags

use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use dailyrun_core::{NotifierKind, RunnerConfig};

pub const ENV_PREFIX: &str = "DAILYRUN";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Values given on the command line; `None` keeps the lower layers
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub project_dir: Option<PathBuf>,
    pub env_name: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub entry_point: Option<PathBuf>,
    pub no_notify: bool,
}

/// Resolved configuration plus where it came from
#[derive(Debug, Clone)]
pub struct Settings {
    pub runner: RunnerConfig,
    pub source_file: Option<PathBuf>,
}

/// Load configuration from all layers
pub fn load(explicit_file: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    let source_file = match explicit_file {
        Some(path) => Some(expand(path)),
        None => default_config_file().filter(|p| p.is_file()),
    };

    let builder = layers(
        source_file.as_deref(),
        Some(Environment::with_prefix(ENV_PREFIX).try_parsing(false)),
    );
    let runner = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize::<RunnerConfig>()
        .context("Invalid configuration")?;

    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let runner = resolve(runner, overrides, &cwd)?;

    Ok(Settings {
        runner,
        source_file,
    })
}

/// `{config_dir}/dailyrun/config.toml` for this platform
pub fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dailyrun")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn layers(
    file: Option<&Path>,
    environment: Option<Environment>,
) -> ConfigBuilder<config::builder::DefaultState> {
    let mut builder = Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }
    if let Some(environment) = environment {
        builder = builder.add_source(environment);
    }
    builder
}

/// Apply CLI overrides, expand `~`, anchor relative paths at `cwd`, validate
fn resolve(mut runner: RunnerConfig, overrides: &Overrides, cwd: &Path) -> Result<RunnerConfig> {
    if let Some(dir) = &overrides.project_dir {
        runner.project_dir = dir.clone();
    }
    if let Some(name) = &overrides.env_name {
        runner.env_name = name.clone();
    }
    if let Some(dir) = &overrides.log_dir {
        runner.log_dir = Some(dir.clone());
    }
    if let Some(entry_point) = &overrides.entry_point {
        runner.entry_point = entry_point.clone();
    }
    if overrides.no_notify {
        runner.notifier = NotifierKind::None;
    }

    runner
        .validate()
        .context("Invalid configuration")?;

    runner.project_dir = anchor(cwd, &expand(&runner.project_dir));
    runner.env_dir = runner.env_dir.as_deref().map(|p| anchor(cwd, &expand(p)));
    runner.log_dir = runner.log_dir.as_deref().map(|p| anchor(cwd, &expand(p)));
    // relative entry points resolve against the project dir later
    runner.entry_point = expand(&runner.entry_point);

    Ok(runner)
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

fn anchor(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
