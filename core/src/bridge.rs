//! Blocking facade over suspending handlers.
//!
//! A bridged call owns a brand-new runtime for exactly its own duration:
//! built on entry, driven with `block_on`, shut down before returning. No
//! runtime is shared between calls.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;

use crate::handler::{BlockingFn, Handler, HandlerFut, Outcome};
use crate::runtime::RuntimePolicy;

/// Upper bound on waiting for blocking tasks when a call's runtime shuts down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridged handler invoked while an async runtime is already running on this thread")]
    NestedRuntime,
    #[error("failed to start async runtime")]
    Runtime(#[source] io::Error),
}

/// Turn `handler` into a blocking function.
///
/// Blocking handlers come back untouched (the very same `Arc`). Suspending
/// handlers are wrapped so that each invocation runs to completion on its own
/// runtime built from `policy`; their result or failure is returned as is.
pub fn bridge<A, T>(handler: Handler<A, T>, policy: RuntimePolicy) -> BlockingFn<A, T>
where
    A: 'static,
    T: 'static,
{
    match handler {
        Handler::Blocking(f) => f,
        Handler::Suspending(f) => Arc::new(move |args: A| {
            if Handle::try_current().is_ok() {
                return Err(BridgeError::NestedRuntime.into());
            }
            run_to_completion(&policy, f(args))
        }),
    }
}

fn run_to_completion<T>(policy: &RuntimePolicy, fut: HandlerFut<T>) -> Outcome<T> {
    let runtime = policy.build_runtime().map_err(BridgeError::Runtime)?;
    let outcome = runtime.block_on(fut);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    outcome
}
