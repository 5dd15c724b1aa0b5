//! Workflow run step: resolve the plan, run the mission, report the outcome.
use crate::cli::{GlobalArgs, RunArgs};
use crate::config;
use crate::mission::{Mission, MissionPlan};
use crate::output;
use crate::transport::{build_authenticator, preflight};
use anyhow::Result;
use std::process::ExitCode;

/// Run the mission; configuration errors are `Err`, mission results are exit codes.
pub fn run_mission(global: &GlobalArgs, args: &RunArgs) -> Result<ExitCode> {
    let paths = super::workspace_paths(global)?;
    let config = super::load_valid_config(&paths)?;
    preflight(&config, &paths)?;

    let input_dir = config.input_dir(&paths);
    let env_pattern = config::pattern_from_env();
    let pattern = config::resolve_pattern(
        args.pattern.as_deref(),
        env_pattern.as_deref(),
        &config,
        &input_dir,
    )?;
    let plan = MissionPlan {
        input_dir,
        output_dir: config.output_dir(&paths),
        pattern,
        sender: config.sender.clone(),
        recipients: config.recipients.clone(),
        week: super::report_week(args.date),
    };
    tracing::debug!(?plan, "mission plan");

    let authenticator = build_authenticator(&config, &paths);
    let report = Mission::new(plan).run(authenticator.as_ref());
    let outcome = report.outcome();

    if args.json {
        output::print_json(&output::RunOutput::new(&report))?;
    } else {
        print!("{}", output::render_run(&report));
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
