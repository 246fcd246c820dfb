//! Effective settings: config file values with environment overrides applied.

use py2binmod_core::{RuntimeFlavor, RuntimePolicy};

use crate::{Py2binmodConfig, expand_env_vars};

/// `"true"` enables debug mode; any other value disables it.
pub const DEV_MODE_ENV: &str = "DEV_MODE";
/// Backend program, overriding `[backend] program`.
pub const BACKEND_ENV: &str = "PY2BINMOD_BACKEND";
/// Runtime flavor, overriding `[runtime] flavor`.
pub const RUNTIME_ENV: &str = "PY2BINMOD_RUNTIME";

pub const DEFAULT_BACKEND_PROGRAM: &str = "py2binmod-backend";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub dev_mode: bool,
    pub runtime: RuntimePolicy,
    pub backend: BackendSettings,
    /// Problems found while resolving, for logging once tracing is up.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub program: String,
    pub args: Vec<String>,
    pub check_prerequisites: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_BACKEND_PROGRAM.to_string(),
            args: Vec::new(),
            check_prerequisites: true,
        }
    }
}

impl Settings {
    /// Merge `config` (if loaded) with the environment seen through `env`.
    ///
    /// Precedence for each value: environment, then config file, then default.
    pub fn resolve(config: Option<&Py2binmodConfig>, env: impl Fn(&str) -> Option<String>) -> Self {
        let file_dev_mode = config
            .and_then(|c| c.app.as_ref())
            .is_some_and(|app| app.dev_mode);
        let dev_mode = match env(DEV_MODE_ENV) {
            Some(value) => value == "true",
            None => file_dev_mode,
        };

        let mut warnings = Vec::new();
        Self {
            dev_mode,
            runtime: resolve_runtime(config, &env, &mut warnings),
            backend: resolve_backend(config, &env),
            warnings,
        }
    }
}

fn resolve_runtime(
    config: Option<&Py2binmodConfig>,
    env: &impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<String>,
) -> RuntimePolicy {
    let section = config.and_then(|c| c.runtime.as_ref());
    let raw = env(RUNTIME_ENV).or_else(|| section.and_then(|r| r.flavor.clone()));

    let flavor = match raw {
        Some(raw) => RuntimeFlavor::parse(&raw).unwrap_or_else(|| {
            warnings.push(format!("Unknown runtime flavor {raw:?}; using default"));
            RuntimeFlavor::default()
        }),
        None => RuntimeFlavor::default(),
    };

    RuntimePolicy {
        flavor,
        worker_threads: section.and_then(|r| r.worker_threads),
    }
}

fn resolve_backend(
    config: Option<&Py2binmodConfig>,
    env: &impl Fn(&str) -> Option<String>,
) -> BackendSettings {
    let mut backend = BackendSettings::default();

    if let Some(section) = config.and_then(|c| c.backend.as_ref()) {
        if let Some(program) = section.program.as_deref() {
            backend.program = expand_env_vars(program, env);
        }
        backend.args.clone_from(&section.args);
        backend.check_prerequisites = section.check_prerequisites;
    }

    if let Some(program) = env(BACKEND_ENV).filter(|p| !p.trim().is_empty()) {
        backend.program = program;
    }
    backend
}
