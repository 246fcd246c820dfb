//! Command registration and dispatch on top of clap.
//!
//! Every handler goes through the same fixed pipeline before clap can select
//! it:
//!
//! 1. `instrument(name)`: tracing span per invocation;
//! 2. `intercept(policy)`: failures become exit codes (mode preserving);
//! 3. `bridge(runtime)`: suspending handlers become blocking;
//! 4. framework registration: the clap subcommand (or root args) is attached
//!    and the resulting blocking function is stored under the command name.
//!
//! The dispatcher therefore only ever calls blocking functions. Failures of
//! the bridge itself (no runtime could be started, nested invocation) are
//! resolved by the same intercept policy after the bridged call returns.
//!
//! The callback is eager: the arguments before the first subcommand token are
//! parsed on their own and the callback runs on them before the rest of the
//! command line is looked at.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use anyhow::anyhow;
use clap::error::ErrorKind;
use clap::{Arg, ArgMatches, Command};

use crate::bridge::{BridgeError, bridge};
use crate::compose::{Decorator, apply_decorators};
use crate::exit::VersionInfo;
use crate::handler::{BlockingFn, Flow, Handler};
use crate::intercept::{InterceptPolicy, instrument, intercept};
use crate::runtime::RuntimePolicy;
use crate::status::EXIT_SUCCESS;

/// Span name used for the top-level callback.
const CALLBACK_NAME: &str = "callback";

pub struct AsyncCli {
    info: VersionInfo,
    root: Command,
    policy: InterceptPolicy,
    runtime: RuntimePolicy,
    callback: Option<BlockingFn<ArgMatches>>,
    root_args: Vec<Arg>,
    commands: BTreeMap<String, BlockingFn<ArgMatches>>,
}

impl AsyncCli {
    #[must_use]
    pub fn new(
        info: VersionInfo,
        about: &'static str,
        policy: InterceptPolicy,
        runtime: RuntimePolicy,
    ) -> Self {
        let root = Command::new(info.name)
            .version(info.version)
            .about(about)
            .disable_version_flag(true);
        Self {
            info,
            root,
            policy,
            runtime,
            callback: None,
            root_args: Vec::new(),
            commands: BTreeMap::new(),
        }
    }

    /// Register a subcommand. Its handler receives the subcommand's matches.
    #[must_use]
    pub fn command(mut self, command: Command, handler: Handler<ArgMatches>) -> Self {
        let name = command.get_name().to_owned();
        let wrapped = self.wrap(&name, handler);
        self.root = self.root.subcommand(command);
        if self.commands.insert(name.clone(), wrapped).is_some() {
            tracing::warn!(command = %name, "command registered twice; keeping the last handler");
        }
        self
    }

    /// Register the top-level callback together with the root flags it
    /// reads. It runs before any subcommand is parsed; `Terminate` stops
    /// dispatch.
    #[must_use]
    pub fn callback<I>(mut self, args: I, handler: Handler<ArgMatches>) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        self.root_args = args.into_iter().collect();
        self.root = self.root.args(self.root_args.clone());
        self.callback = Some(self.wrap(CALLBACK_NAME, handler));
        self
    }

    #[must_use]
    pub const fn info(&self) -> &VersionInfo {
        &self.info
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    fn wrap(&self, name: &str, handler: Handler<ArgMatches>) -> BlockingFn<ArgMatches> {
        let policy = self.policy.clone();
        let stages: [Decorator<Handler<ArgMatches>>; 2] = [
            instrument(name),
            Box::new(move |handler: Handler<ArgMatches>| intercept(handler, policy)),
        ];
        let bridged = bridge(apply_decorators(handler, stages), self.runtime);

        let policy = self.policy.clone();
        Arc::new(move |matches: ArgMatches| match bridged(matches) {
            Err(err) if err.is::<BridgeError>() => policy.resolve(Err(err)),
            outcome => outcome,
        })
    }

    /// Parse `argv` (program name first) and run exactly one invocation.
    ///
    /// Returns the process exit code. `Err` only reaches the caller for
    /// failures the interceptor let through (debug mode, unmatched kinds).
    pub fn run<I, S>(&self, argv: I) -> anyhow::Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();

        let eager = self.run_callback_eagerly(&argv)?;
        if let Some(Flow::Terminate(code)) = eager {
            tracing::info!(exit_code = code, "callback terminated dispatch");
            return Ok(code);
        }

        let matches = match self.root.clone().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(err) => {
                let code = err.exit_code();
                tracing::debug!(kind = ?err.kind(), exit_code = code, "argument parsing stopped");
                err.print()?;
                return Ok(code);
            }
        };
        self.dispatch(&matches, eager.is_some())
    }

    /// Run the callback on the leading root flags alone, so a flag such as
    /// `--version` wins over anything wrong later on the command line.
    ///
    /// `None` when there is no callback or the leading flags do not parse on
    /// their own; the callback then runs after the full parse.
    fn run_callback_eagerly(&self, argv: &[OsString]) -> anyhow::Result<Option<Flow<()>>> {
        let Some(callback) = &self.callback else {
            return Ok(None);
        };

        let leading = argv.iter().take(1).chain(
            argv.iter()
                .skip(1)
                .take_while(|arg| arg.to_str().is_some_and(|arg| arg.starts_with('-') && arg != "--")),
        );
        let root_only = Command::new(self.info.name)
            .args(self.root_args.clone())
            .disable_help_flag(true)
            .disable_version_flag(true);

        match root_only.try_get_matches_from(leading) {
            Ok(matches) => Ok(Some(callback(matches)?)),
            Err(err) => {
                tracing::debug!(kind = ?err.kind(), "leading flags need the full parse");
                Ok(None)
            }
        }
    }

    fn dispatch(&self, matches: &ArgMatches, callback_ran: bool) -> anyhow::Result<i32> {
        if !callback_ran
            && let Some(callback) = &self.callback
            && let Flow::Terminate(code) = callback(matches.clone())?
        {
            tracing::info!(exit_code = code, "callback terminated dispatch");
            return Ok(code);
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            let err = self
                .root
                .clone()
                .error(ErrorKind::MissingSubcommand, "a subcommand is required");
            err.print()?;
            return Ok(err.exit_code());
        };

        let handler = self
            .commands
            .get(name)
            .ok_or_else(|| anyhow!("no handler registered for command `{name}`"))?;

        tracing::info!(command = name, "dispatching");
        let code = match handler(sub_matches.clone())? {
            Flow::Continue(()) => EXIT_SUCCESS,
            Flow::Terminate(code) => code,
        };
        tracing::info!(command = name, exit_code = code, "command finished");
        Ok(code)
    }
}
