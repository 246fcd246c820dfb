//! Handler representation shared by every registration stage.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Control flow produced by a handler that did not fail.
///
/// `Terminate` is the explicit early-exit request (for example after printing
/// the version). It is not an error and is never reported as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<T> {
    Continue(T),
    Terminate(i32),
}

impl<T> Flow<T> {
    #[must_use]
    pub const fn is_terminate(&self) -> bool {
        matches!(self, Flow::Terminate(_))
    }

    /// The requested exit code, if this is a termination.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Flow::Continue(_) => None,
            Flow::Terminate(code) => Some(*code),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Flow<U> {
        match self {
            Flow::Continue(value) => Flow::Continue(f(value)),
            Flow::Terminate(code) => Flow::Terminate(code),
        }
    }
}

/// Success (`Ok(Continue)`), early exit (`Ok(Terminate)`) or failure (`Err`).
pub type Outcome<T = ()> = anyhow::Result<Flow<T>>;

/// Future returned by a suspending handler.
pub type HandlerFut<T = ()> = Pin<Box<dyn Future<Output = Outcome<T>> + Send + 'static>>;

pub type BlockingFn<A, T = ()> = Arc<dyn Fn(A) -> Outcome<T> + Send + Sync>;
pub type SuspendingFn<A, T = ()> = Arc<dyn Fn(A) -> HandlerFut<T> + Send + Sync>;

/// A command implementation in one of the two execution modes.
///
/// Handlers are immutable once built; cloning shares the underlying function.
pub enum Handler<A, T = ()> {
    /// Runs to completion on the calling thread.
    Blocking(BlockingFn<A, T>),
    /// Yields while it waits; needs an async runtime to be driven.
    Suspending(SuspendingFn<A, T>),
}

impl<A: 'static, T: 'static> Handler<A, T> {
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(A) -> Outcome<T> + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }

    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self::Suspending(Arc::new(move |args| -> HandlerFut<T> { Box::pin(f(args)) }))
    }
}

impl<A, T> Handler<A, T> {
    #[must_use]
    pub const fn is_suspending(&self) -> bool {
        matches!(self, Handler::Suspending(_))
    }
}

impl<A, T> Clone for Handler<A, T> {
    fn clone(&self) -> Self {
        match self {
            Handler::Blocking(f) => Handler::Blocking(Arc::clone(f)),
            Handler::Suspending(f) => Handler::Suspending(Arc::clone(f)),
        }
    }
}

impl<A, T> fmt::Debug for Handler<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Blocking(_) => f.write_str("Handler::Blocking"),
            Handler::Suspending(_) => f.write_str("Handler::Suspending"),
        }
    }
}
