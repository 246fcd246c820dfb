//! Configuration for py2binmod.
//!
//! ```toml
//! [app]
//! dev_mode = false
//!
//! [runtime]
//! flavor = "multi_thread"
//! worker_threads = 4
//!
//! [backend]
//! program = "${HOME}/.local/bin/py2binmod-backend"
//! args = []
//! check_prerequisites = true
//! ```
//!
//! Every section is optional. The file is read from
//! `~/.py2binmod/config.toml` unless `PY2BINMOD_CONFIG` points elsewhere.

mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use settings::{
    BACKEND_ENV, BackendSettings, DEFAULT_BACKEND_PROGRAM, DEV_MODE_ENV, RUNTIME_ENV, Settings,
};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "PY2BINMOD_CONFIG";

const CONFIG_DIR: &str = ".py2binmod";
const CONFIG_FILE: &str = "config.toml";

pub(crate) const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct Py2binmodConfig {
    pub app: Option<AppConfig>,
    pub runtime: Option<RuntimeConfig>,
    pub backend: Option<BackendConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Surface command failures raw instead of converting them to exit codes.
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RuntimeConfig {
    /// `"multi_thread"` or `"current_thread"`.
    pub flavor: Option<String>,
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Executable that performs transpile and build. `${VAR}` is expanded.
    pub program: Option<String>,
    /// Extra arguments placed before the subcommand.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_true")]
    pub check_prerequisites: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            check_prerequisites: true,
        }
    }
}

impl Py2binmodConfig {
    /// Load the config file, if any. `env` looks up environment variables.
    pub fn load(env: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        match config_path(env) {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from an explicit path. A missing file is not an error.
    /// Nothing is logged; callers report the error once tracing is installed.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Location of the config file: `$PY2BINMOD_CONFIG`, else
/// `~/.py2binmod/config.toml`.
pub fn config_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(explicit) = env(CONFIG_ENV).filter(|value| !value.trim().is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Replace every `${VAR}` with its value from `env`; unknown variables
/// become empty. An unterminated `${` is kept literally.
pub fn expand_env_vars(value: &str, env: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
