//! py2binmod command line.
//!
//! ```text
//! main() -> Settings::resolve -> init_tracing -> runtime::select -> build_cli -> AsyncCli::run
//!                                                                                   |
//!                                                       --version | transpile | build
//! ```
//!
//! `transpile` and `build` resolve their paths and hand off to a [`Toolchain`].

mod commands;
pub mod logging;
pub mod paths;

use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches};
use py2binmod_core::{AsyncCli, Handler, InterceptPolicy, RuntimePolicy, VersionInfo, show_version};
use py2binmod_tools::Toolchain;

pub use commands::{BuildArgs, TranspileArgs};

pub const NAME: &str = "py2binmod";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const INFO: VersionInfo = VersionInfo::new(NAME, VERSION);

const ABOUT: &str = "Turn Python projects into WebAssembly modules";

/// The full command tree with every handler registered.
#[must_use]
pub fn build_cli(
    toolchain: Arc<dyn Toolchain>,
    policy: InterceptPolicy,
    runtime: RuntimePolicy,
) -> AsyncCli {
    let debug = policy.is_debug();
    AsyncCli::new(INFO, ABOUT, policy, runtime)
        .callback([version_arg()], version_handler())
        .command(
            commands::transpile_command(),
            commands::transpile_handler(Arc::clone(&toolchain), debug),
        )
        .command(commands::build_command(), commands::build_handler(toolchain, debug))
}

fn version_arg() -> Arg {
    Arg::new("version")
        .short('v')
        .long("version")
        .action(ArgAction::SetTrue)
        .help("Show the version and exit")
}

fn version_handler() -> Handler<ArgMatches> {
    Handler::blocking(|matches: ArgMatches| Ok(show_version(matches.get_flag("version"), &INFO)))
}
