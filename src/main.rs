use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use trayport_keygen::command::SystemRunner;
use trayport_keygen::identity::{self, Args};
use trayport_keygen::prompt::{ConsolePrompt, Prompt};
use trayport_keygen::utils::paths::get_config_dir;
use trayport_keygen::utils::registry::RegQuery;
use trayport_keygen::{run, KeygenError, RunContext};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let runner = SystemRunner;
    let registry = RegQuery::new(&runner);
    let prompt = ConsolePrompt::from_env();

    match execute(&args, &runner, &registry, &prompt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            prompt.warn("Error - Trayport", &e.to_string());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn execute(
    args: &Args,
    runner: &SystemRunner,
    registry: &RegQuery<'_>,
    prompt: &ConsolePrompt,
) -> Result<(), KeygenError> {
    let config_dir = get_config_dir().ok();
    let resolved = identity::resolve(args, registry, config_dir.as_deref())?;
    let mode = resolved.mode;
    let ctx = RunContext::new(resolved, runner, registry, prompt)?;
    let report = run(&ctx, mode)?;
    tracing::debug!("{:?}", report);
    Ok(())
}
