//! Process-wide selection of the async runtime used by bridged handlers.
//!
//! Selection happens once, before any handler is registered. The chosen
//! policy is only a recipe: every bridged invocation still builds its own
//! runtime from it.

use std::io;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Runtime};

static SELECTED: OnceLock<RuntimePolicy> = OnceLock::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeFlavor {
    /// Work-stealing scheduler on a pool of worker threads.
    MultiThread,
    /// Everything runs on the thread that called the handler.
    #[default]
    CurrentThread,
}

impl RuntimeFlavor {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "multi_thread" | "multi" => Some(Self::MultiThread),
            "current_thread" | "current" => Some(Self::CurrentThread),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MultiThread => "multi_thread",
            Self::CurrentThread => "current_thread",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimePolicy {
    pub flavor: RuntimeFlavor,
    /// Worker count for `MultiThread`; tokio's default when `None`.
    pub worker_threads: Option<usize>,
}

impl RuntimePolicy {
    #[must_use]
    pub const fn current_thread() -> Self {
        Self {
            flavor: RuntimeFlavor::CurrentThread,
            worker_threads: None,
        }
    }

    #[must_use]
    pub const fn multi_thread(worker_threads: Option<usize>) -> Self {
        Self {
            flavor: RuntimeFlavor::MultiThread,
            worker_threads,
        }
    }

    /// Build a fresh runtime following this policy.
    pub fn build_runtime(&self) -> io::Result<Runtime> {
        match self.flavor {
            RuntimeFlavor::CurrentThread => Builder::new_current_thread().enable_all().build(),
            RuntimeFlavor::MultiThread => {
                let mut builder = Builder::new_multi_thread();
                if let Some(workers) = self.worker_threads.filter(|n| *n > 0) {
                    builder.worker_threads(workers);
                }
                builder.enable_all().build()
            }
        }
    }
}

/// Select the process-wide policy. Only the first call has an effect; every
/// call returns the policy that is in force.
pub fn select(preferred: RuntimePolicy) -> RuntimePolicy {
    *SELECTED.get_or_init(|| {
        let chosen = resolve(preferred);
        tracing::debug!(
            flavor = chosen.flavor.as_str(),
            worker_threads = ?chosen.worker_threads,
            "runtime policy selected"
        );
        chosen
    })
}

/// The policy in force, or the default if [`select`] was never called.
#[must_use]
pub fn selected() -> RuntimePolicy {
    SELECTED.get().copied().unwrap_or_default()
}

/// Fallback chain: preferred, then the platform alternate, then the default.
fn resolve(preferred: RuntimePolicy) -> RuntimePolicy {
    if is_available(&preferred) {
        return preferred;
    }
    tracing::warn!(
        flavor = preferred.flavor.as_str(),
        "preferred runtime unavailable; falling back"
    );

    if let Some(alternate) = platform_alternate(&preferred)
        && is_available(&alternate)
    {
        return alternate;
    }

    RuntimePolicy::default()
}

fn is_available(policy: &RuntimePolicy) -> bool {
    if policy.flavor == RuntimeFlavor::MultiThread && cfg!(target_family = "wasm") {
        return false;
    }
    match policy.build_runtime() {
        Ok(runtime) => {
            runtime.shutdown_background();
            true
        }
        Err(err) => {
            tracing::warn!(flavor = policy.flavor.as_str(), error = %err, "runtime probe failed");
            false
        }
    }
}

/// A multi-threaded runtime that cannot start with the requested worker count
/// gets one more try with a single worker before giving up on threads.
fn platform_alternate(preferred: &RuntimePolicy) -> Option<RuntimePolicy> {
    match preferred.flavor {
        RuntimeFlavor::MultiThread if !cfg!(target_family = "wasm") => {
            (preferred.worker_threads != Some(1)).then_some(RuntimePolicy::multi_thread(Some(1)))
        }
        _ => None,
    }
}
