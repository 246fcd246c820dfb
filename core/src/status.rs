//! Failure status model and exit code derivation.

use std::error::Error as StdError;
use std::fmt;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// An error that carries the process status it should terminate with.
///
/// Displays and chains exactly like the wrapped error; only the status is
/// added. Find it again with [`exit_code_for`].
pub struct StatusError {
    status: i32,
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl StatusError {
    pub fn new(status: i32, inner: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self {
            status,
            inner: inner.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> i32 {
        self.status
    }

    /// The wrapped error itself. It is not part of `source()`, since display
    /// already shows it.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }
}

impl fmt::Debug for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusError")
            .field("status", &self.status)
            .field("inner", &self.inner)
            .finish()
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for StatusError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// Attach a process status to the error side of a `Result`.
pub trait WithStatus<T> {
    fn with_status(self, status: i32) -> anyhow::Result<T>;
}

impl<T, E> WithStatus<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn with_status(self, status: i32) -> anyhow::Result<T> {
        self.map_err(|err| anyhow::Error::new(StatusError::new(status, err)))
    }
}

/// The status carried by `err`, searching the whole context chain.
#[must_use]
pub fn status_of(err: &anyhow::Error) -> Option<i32> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StatusError>())
        .map(StatusError::status)
}

/// Exit code for a failure: its status when set and non-zero, otherwise 1.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    status_of(err)
        .filter(|status| *status != EXIT_SUCCESS)
        .unwrap_or(EXIT_FAILURE)
}
