//! Workflow steps behind each CLI command.
//!
//! Each step resolves the workspace, loads what it needs, and prints its
//! result; mission policy itself lives in `crate::mission`.
mod authorize;
mod init;
mod intake;
mod run;
mod status;

pub(crate) use authorize::run_authorize;
pub(crate) use init::run_init;
pub(crate) use intake::run_intake;
pub(crate) use run::run_mission;
pub(crate) use status::{run_status, StatusSummary};

use crate::cli::GlobalArgs;
use crate::config::{self, MissionConfig};
use crate::paths::{resolve_workspace_root, WorkspacePaths};
use crate::report::ReportWeek;
use anyhow::Result;
use chrono::{Local, NaiveDate};

fn workspace_paths(global: &GlobalArgs) -> Result<WorkspacePaths> {
    let root = resolve_workspace_root(global.workspace.as_deref())?;
    tracing::debug!(root = %root.display(), "workspace resolved");
    Ok(WorkspacePaths::new(root))
}

/// Load and validate `config.json`; any problem is a configuration error.
fn load_valid_config(paths: &WorkspacePaths) -> Result<MissionConfig> {
    let config = config::load_config(paths)?;
    config::validate_config(&config)?;
    Ok(config)
}

fn report_week(date: Option<NaiveDate>) -> ReportWeek {
    ReportWeek::from_date(date.unwrap_or_else(|| Local::now().date_naive()))
}
