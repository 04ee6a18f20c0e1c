//! Runtime configuration.
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML
//! file, `EASY_AALM_*` environment variables, then whatever the caller
//! (normally the CLI) sets on the struct directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AalmError, Result};
use crate::export::WEEKLY_STRIDE;
use crate::invoker::{self, BUNDLE_DIR};
use crate::report::CDC_REFERENCE_UG_DL;

pub const ENV_HOME: &str = "EASY_AALM_HOME";
pub const ENV_EXE: &str = "EASY_AALM_EXE";
pub const ENV_TEMPLATE: &str = "EASY_AALM_TEMPLATE";
pub const ENV_TIMEOUT_SECS: &str = "EASY_AALM_TIMEOUT_SECS";

pub const DEFAULT_RUN_NAME: &str = "WebSim";
pub const DEFAULT_INPUT_FILE_NAME: &str = "LeggettInput_web.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Example input shipped with the model, relative to the bundle directory.
pub const TEMPLATE_RELATIVE_PATH: &str = "Examples/LeggettInput_Ex1a.txt";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AalmConfig {
    /// Install directory holding `aalm_original/`. Defaults to the
    /// directory of the running binary.
    pub home: Option<PathBuf>,

    /// Explicit executable, tried before the bundled locations.
    pub executable: Option<PathBuf>,

    /// Template input file. Defaults to the bundled example.
    pub template: Option<PathBuf>,

    pub input_file_name: String,
    pub run_name: String,

    /// Append a random suffix to `run_name` for every run.
    pub unique_run_name: bool,

    pub timeout_secs: u64,
    pub cdc_threshold: f64,
    pub weekly_stride: usize,

    /// Treat template schema warnings as errors.
    pub strict_template: bool,
}

impl Default for AalmConfig {
    fn default() -> Self {
        Self {
            home: None,
            executable: None,
            template: None,
            input_file_name: DEFAULT_INPUT_FILE_NAME.to_string(),
            run_name: DEFAULT_RUN_NAME.to_string(),
            unique_run_name: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cdc_threshold: CDC_REFERENCE_UG_DL,
            weekly_stride: WEEKLY_STRIDE,
            strict_template: false,
        }
    }
}

impl AalmConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| AalmError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AalmError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(home) = get(ENV_HOME) {
            self.home = Some(PathBuf::from(home));
        }
        if let Some(exe) = get(ENV_EXE) {
            self.executable = Some(PathBuf::from(exe));
        }
        if let Some(template) = get(ENV_TEMPLATE) {
            self.template = Some(PathBuf::from(template));
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                AalmError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number, got {secs:?}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("run_name", &self.run_name)?;
        validate_name("input_file_name", &self.input_file_name)?;
        if self.timeout_secs == 0 {
            return Err(AalmError::Config("timeout_secs must be positive".to_string()));
        }
        if self.weekly_stride == 0 {
            return Err(AalmError::Config("weekly_stride must be positive".to_string()));
        }
        if !self.cdc_threshold.is_finite() || self.cdc_threshold <= 0.0 {
            return Err(AalmError::Config(format!(
                "cdc_threshold must be a positive number, got {}",
                self.cdc_threshold
            )));
        }
        Ok(())
    }

    pub fn home_dir(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(default_home)
    }

    pub fn template_path(&self) -> PathBuf {
        self.template.clone().unwrap_or_else(|| {
            self.home_dir()
                .join(BUNDLE_DIR)
                .join(TEMPLATE_RELATIVE_PATH)
        })
    }

    pub fn executable_candidates(&self) -> Vec<PathBuf> {
        invoker::executable_candidates(&self.home_dir(), self.executable.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Run name for the next run, suffixed when `unique_run_name` is set.
    pub fn effective_run_name(&self) -> String {
        if self.unique_run_name {
            let id = Uuid::new_v4().simple().to_string();
            format!("{}_{}", self.run_name, &id[..8])
        } else {
            self.run_name.clone()
        }
    }
}

/// Directory of the running binary, or `.` when that cannot be determined.
fn default_home() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Names end up in a comma-separated row and in file paths.
fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AalmError::Config(format!("{field} must not be empty")));
    }
    if let Some(c) = value
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, ',' | '/' | '\\'))
    {
        return Err(AalmError::Config(format!(
            "{field} {value:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}
