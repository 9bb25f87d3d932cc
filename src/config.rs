use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde_json::Value;

use crate::environment::Environment;
use crate::expander::{is_valid_name, substitute};

pub const RC_FILE_NAME: &str = ".myshrc";

/// Process-level settings gathered once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    /// Directory holding `.myshrc`: `MYSHDOTDIR`, else `HOME`.
    pub rc_dir: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl ShellConfig {
    pub fn from_env(env: &Environment) -> Self {
        let rc_dir = env
            .get("MYSHDOTDIR")
            .or_else(|| env.get("HOME"))
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);

        let log_level = env
            .get("MYSH_LOG")
            .and_then(|level| level.parse().ok())
            .unwrap_or(LevelFilter::Off);

        ShellConfig { rc_dir, log_level }
    }

    pub fn rc_path(&self) -> Option<PathBuf> {
        self.rc_dir.as_ref().map(|dir| dir.join(RC_FILE_NAME))
    }
}

/// A `.myshrc` entry that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("{0}: not a string")]
    NotAString(String),
    #[error("{0}: invalid characters for variable name")]
    InvalidName(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read .myshrc: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON format for .myshrc")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid JSON format for .myshrc")]
    NotAnObject,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Apply the rc file at `path` to `env`. A missing file applies nothing.
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        env: &mut Environment,
    ) -> Result<Vec<ConfigWarning>, ConfigError> {
        let path = path.as_ref();
        let src = match fs::read_to_string(path) {
            Ok(src) => src,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no rc file at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        log::info!("loading {}", path.display());
        Self::load_from_str(&src, env)
    }

    /// Entries apply in file order, each substituted against the environment
    /// as it stands after the previous one.
    pub fn load_from_str(src: &str, env: &mut Environment) -> Result<Vec<ConfigWarning>, ConfigError> {
        let Value::Object(entries) = serde_json::from_str::<Value>(src)? else {
            return Err(ConfigError::NotAnObject);
        };

        let mut warnings = Vec::new();
        for (name, value) in entries {
            let Value::String(raw) = value else {
                warnings.push(ConfigWarning::NotAString(name));
                continue;
            };
            if !is_valid_name(&name) {
                warnings.push(ConfigWarning::InvalidName(name));
                continue;
            }
            let value = substitute(&raw, &*env);
            log::debug!("rc: {}={:?}", name, value);
            env.set(&name, &value);
        }
        Ok(warnings)
    }
}
