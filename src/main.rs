use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod consolidate;
mod discovery;
mod intake;
mod mission;
mod notify;
mod output;
mod paths;
mod report;
mod table;
mod transport;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.global.verbose);

    match &args.command {
        Command::Init(init) => workflow::run_init(&args.global, init)?,
        Command::Authorize(authorize) => workflow::run_authorize(&args.global, authorize)?,
        Command::Intake(intake) => workflow::run_intake(&args.global, intake)?,
        Command::Run(run) => return workflow::run_mission(&args.global, run),
        Command::Status(status) => workflow::run_status(&args.global, status)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
