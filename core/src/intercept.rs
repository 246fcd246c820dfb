//! Failure interception: the single boundary that turns failures into exit
//! codes.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use crate::compose::Decorator;
use crate::handler::{Flow, Handler, Outcome};
use crate::status::{StatusError, exit_code_for, status_of};

type Matcher = Arc<dyn Fn(&anyhow::Error) -> bool + Send + Sync>;

/// Which failures are converted into exit codes, and whether debug mode is on.
#[derive(Clone)]
pub struct InterceptPolicy {
    debug: bool,
    matcher: Matcher,
}

impl InterceptPolicy {
    /// Intercept every failure. With `debug` set, failures are re-raised as is.
    #[must_use]
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            matcher: Arc::new(|_: &anyhow::Error| true),
        }
    }

    /// Only intercept failures with an `E` somewhere in their chain.
    #[must_use]
    pub fn matching<E>(self) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            matcher: Arc::new(|err: &anyhow::Error| chain_contains::<E>(err)),
            ..self
        }
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn matches(&self, err: &anyhow::Error) -> bool {
        (self.matcher)(err)
    }

    /// Apply the policy to one handler outcome.
    pub fn resolve<T>(&self, outcome: Outcome<T>) -> Outcome<T> {
        let err = match outcome {
            Ok(flow) => return Ok(flow),
            Err(err) => err,
        };

        if !self.matches(&err) {
            return Err(err);
        }
        if self.debug {
            tracing::debug!(error = %format!("{err:#}"), "debug mode: re-raising failure");
            return Err(err);
        }

        let code = exit_code_for(&err);
        tracing::error!(
            exit_code = code,
            status = ?status_of(&err),
            error = %format!("{err:#}"),
            "command failed"
        );
        Ok(Flow::Terminate(code))
    }
}

impl Default for InterceptPolicy {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for InterceptPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptPolicy")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

fn chain_contains<E>(err: &anyhow::Error) -> bool
where
    E: StdError + Send + Sync + 'static,
{
    err.chain().any(|cause| {
        cause.is::<E>()
            || cause
                .downcast_ref::<StatusError>()
                .is_some_and(|wrapped| wrapped.get_ref().is::<E>())
    })
}

/// Wrap `handler` so its failures go through `policy`. The execution mode is
/// kept: blocking in, blocking out; suspending in, suspending out.
pub fn intercept<A, T>(handler: Handler<A, T>, policy: InterceptPolicy) -> Handler<A, T>
where
    A: 'static,
    T: 'static,
{
    match handler {
        Handler::Blocking(f) => Handler::blocking(move |args| policy.resolve(f(args))),
        Handler::Suspending(f) => Handler::suspending(move |args| {
            let policy = policy.clone();
            let fut = f(args);
            async move { policy.resolve(fut.await) }
        }),
    }
}

/// Decorator that runs every invocation inside a `command` span.
pub fn instrument<A, T>(name: &str) -> Decorator<Handler<A, T>>
where
    A: 'static,
    T: 'static,
{
    let name = name.to_owned();
    Box::new(move |handler: Handler<A, T>| match handler {
        Handler::Blocking(f) => Handler::blocking(move |args| {
            let span = tracing::info_span!("command", command = %name);
            let _entered = span.enter();
            tracing::debug!("invoking blocking handler");
            f(args)
        }),
        Handler::Suspending(f) => Handler::suspending(move |args| {
            let span = tracing::info_span!("command", command = %name);
            f(args).instrument(span)
        }),
    })
}
