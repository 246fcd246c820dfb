//! py2binmod binary entry point.

use std::sync::Arc;

use anyhow::Result;
use py2binmod::logging::init_tracing;
use py2binmod::build_cli;
use py2binmod_config::{Py2binmodConfig, Settings, config_path};
use py2binmod_core::{InterceptPolicy, runtime};
use py2binmod_tools::BackendToolchain;

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn main() -> Result<()> {
    let loaded = Py2binmodConfig::load(env_var);
    let config = loaded.as_ref().ok().and_then(Option::as_ref);
    let settings = Settings::resolve(config, env_var);

    let config_dir = config_path(env_var).and_then(|path| path.parent().map(ToOwned::to_owned));
    init_tracing(settings.dev_mode, config_dir.as_deref());

    if let Err(err) = &loaded {
        let cause = std::error::Error::source(err).map(ToString::to_string);
        tracing::warn!(path = %err.path().display(), ?cause, "ignoring config file");
    }
    for warning in &settings.warnings {
        tracing::warn!("{warning}");
    }

    let runtime = runtime::select(settings.runtime);
    let toolchain = BackendToolchain::new(settings.backend.program.clone())
        .with_args(settings.backend.args.clone())
        .check_prerequisites(settings.backend.check_prerequisites);
    tracing::debug!(
        backend = toolchain.program(),
        flavor = runtime.flavor.as_str(),
        "toolchain configured"
    );
    let cli = build_cli(
        Arc::new(toolchain),
        InterceptPolicy::new(settings.dev_mode),
        runtime,
    );

    let code = cli.run(std::env::args_os())?;
    tracing::info!(exit_code = code, "exiting");
    std::process::exit(code);
}
