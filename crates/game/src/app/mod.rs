use std::process::ExitCode;

use tracing::{error, info};

mod bootstrap;
mod gameplay;
mod loop_runner;

use bootstrap::{BootstrapError, Command};

/// Entry point shared by every command the binary accepts.
pub(crate) fn run(args: &[String]) -> ExitCode {
    bootstrap::init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Shadow Strike Startup ===");

    let outcome = bootstrap::parse_command(args).and_then(|command| match command {
        Command::Play => bootstrap::build_app().map(loop_runner::run),
        Command::Autotile { level } => {
            bootstrap::run_autotile(level).map(|()| ExitCode::SUCCESS)
        }
    });

    outcome.unwrap_or_else(|err: BootstrapError| {
        error!(error = %err, "startup_failed");
        ExitCode::FAILURE
    })
}
