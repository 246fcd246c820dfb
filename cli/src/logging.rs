//! Tracing setup.
//!
//! Logs go to a file so that the terminal only ever shows command output and
//! the one-line error messages. Dev mode adds a debug layer on stderr.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "py2binmod.log";

/// Install the global subscriber. `config_dir` is the directory holding the
/// config file; logs live in its `logs/` subdirectory.
pub fn init_tracing(dev_mode: bool, config_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file(log_file_candidates(config_dir));
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    // Without a log file, stay silent rather than mixing logs into command output.
    let log_path = log_file.map(|(path, file)| {
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter)
                .boxed(),
        );
        path
    });

    if dev_mode {
        layers.push(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(LevelFilter::DEBUG)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();

    if let Some(path) = log_path {
        tracing::info!(path = %path.display(), dev_mode, "Logging initialized");
    }
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file(candidates: Vec<PathBuf>) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates(config_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.py2binmod/logs/py2binmod.log
    if let Some(dir) = config_dir {
        candidates.push(dir.join(LOG_DIR).join(LOG_FILE));
    }

    // Fallback: <tmp>/py2binmod/logs/py2binmod.log
    candidates.push(
        std::env::temp_dir()
            .join("py2binmod")
            .join(LOG_DIR)
            .join(LOG_FILE),
    );

    candidates
}
