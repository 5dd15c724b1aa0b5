//! Workflow intake step.
use crate::cli::{GlobalArgs, IntakeArgs};
use crate::intake::replace_inputs;
use anyhow::Result;

/// Replace the configured input directory with `args.files`.
pub fn run_intake(global: &GlobalArgs, args: &IntakeArgs) -> Result<()> {
    let paths = super::workspace_paths(global)?;
    let config = super::load_valid_config(&paths)?;
    let copied = replace_inputs(&config.input_dir(&paths), &args.files)?;
    for path in &copied {
        println!("{}", path.display());
    }
    Ok(())
}
