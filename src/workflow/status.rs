//! Workflow status step.
//!
//! Status inspects the workspace without side effects and names the next
//! command the operator should run.
use crate::cli::{GlobalArgs, StatusArgs};
use crate::config::{self, MissionConfig};
use crate::discovery::matching_files;
use crate::output;
use crate::paths::WorkspacePaths;
use crate::report::ReportWeek;
use crate::transport::{self, TransportReadiness};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub present: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputStatus {
    pub dir: PathBuf,
    pub pattern: Option<String>,
    pub files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub path: PathBuf,
    pub exists: bool,
}

/// Snapshot of workspace readiness for one report week.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub workspace: PathBuf,
    pub week: String,
    pub config: ConfigStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportReadiness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactStatus>,
    pub next_action: String,
}

enum ConfigState {
    Missing,
    Valid(MissionConfig),
    Invalid(String),
}

fn load_config_state(paths: &WorkspacePaths) -> ConfigState {
    if !paths.config_path().is_file() {
        return ConfigState::Missing;
    }
    match config::load_config(paths).and_then(|config| {
        config::validate_config(&config)?;
        Ok(config)
    }) {
        Ok(config) => ConfigState::Valid(config),
        Err(err) => ConfigState::Invalid(error_chain_message(&err)),
    }
}

/// Build a status summary without touching the workspace.
pub fn status_summary(
    paths: &WorkspacePaths,
    week: ReportWeek,
    env_pattern: Option<&str>,
) -> StatusSummary {
    let mut summary = StatusSummary {
        workspace: paths.root().to_path_buf(),
        week: week.label(),
        config: ConfigStatus {
            present: false,
            valid: false,
            error: None,
        },
        transport: None,
        inputs: None,
        artifact: None,
        next_action: String::new(),
    };

    let config = match load_config_state(paths) {
        ConfigState::Missing => {
            summary.next_action =
                "rsmith init --sender <addr> --recipient <addr>".to_string();
            return summary;
        }
        ConfigState::Invalid(message) => {
            summary.config.present = true;
            summary.config.error = Some(message);
            summary.next_action = format!("fix {}", paths.config_path().display());
            return summary;
        }
        ConfigState::Valid(config) => config,
    };
    summary.config.present = true;
    summary.config.valid = true;

    let readiness = transport::readiness(&config, paths);
    let input_dir = config.input_dir(paths);
    let inputs = match config::resolve_pattern(None, env_pattern, &config, &input_dir)
        .and_then(|pattern| {
            let files = matching_files(&input_dir, &pattern)?.len();
            Ok((pattern, files))
        }) {
        Ok((pattern, files)) => InputStatus {
            dir: input_dir.clone(),
            pattern: Some(pattern),
            files,
            error: None,
        },
        Err(err) => InputStatus {
            dir: input_dir.clone(),
            pattern: None,
            files: 0,
            error: Some(error_chain_message(&err)),
        },
    };
    let artifact_path = week.artifact_path(&config.output_dir(paths));

    summary.next_action = if let Some(problem) = readiness.problem.as_deref() {
        problem.to_string()
    } else if inputs.error.is_some() {
        "fix the file pattern (RSMITH_PATTERN or file_pattern in config.json)".to_string()
    } else if inputs.files == 0 {
        "rsmith intake <FILE>...".to_string()
    } else {
        "rsmith run".to_string()
    };
    summary.transport = Some(readiness);
    summary.inputs = Some(inputs);
    summary.artifact = Some(ArtifactStatus {
        exists: artifact_path.is_file(),
        path: artifact_path,
    });
    summary
}

/// Run the status step and print a summary or JSON output.
pub fn run_status(global: &GlobalArgs, args: &StatusArgs) -> Result<()> {
    let paths = super::workspace_paths(global)?;
    let week = super::report_week(args.date);
    let env_pattern = config::pattern_from_env();
    let summary = status_summary(&paths, week, env_pattern.as_deref());

    if args.json {
        let text = serde_json::to_string_pretty(&summary).context("serialize status summary")?;
        println!("{text}");
    } else {
        print!("{}", output::render_status(&summary));
    }
    Ok(())
}

fn error_chain_message(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
