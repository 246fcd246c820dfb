//! Command execution engine for py2binmod.
//!
//! Every command handler, blocking or suspending, is normalized into one
//! blocking invocation protocol before the argument parser ever sees it:
//!
//! ```text
//! Handler ─ apply_decorators([instrument, intercept]) ─ bridge ─ AsyncCli registration
//!                                                                    │
//!                           clap parse ─ callback ─ command ─────────┘
//!                                                       │
//!                              Continue ─ 0 │ Terminate(code) ─ code │ Err ─ process boundary
//! ```
//!
//! Early termination is a value ([`Flow::Terminate`]), not an unwinding
//! signal, so success, early exit and failure stay distinct at every layer.

pub mod bridge;
pub mod compose;
mod exit;
mod handler;
pub mod intercept;
pub mod registry;
pub mod runtime;
mod status;

pub use bridge::{BridgeError, bridge};
pub use compose::{Decorator, apply_decorators};
pub use exit::{
    VersionInfo, exit_with_code, exit_with_error, exit_with_error_to, show_version,
    show_version_to,
};
pub use handler::{BlockingFn, Flow, Handler, HandlerFut, Outcome, SuspendingFn};
pub use intercept::{InterceptPolicy, instrument, intercept};
pub use registry::AsyncCli;
pub use runtime::{RuntimeFlavor, RuntimePolicy};
pub use status::{EXIT_FAILURE, EXIT_SUCCESS, StatusError, WithStatus, exit_code_for, status_of};
