//! Operator-facing rendering of run and status results.
use crate::mission::{MissionOutcome, MissionReport};
use crate::notify::NotificationStatus;
use crate::workflow::StatusSummary;
use anyhow::{Context, Result};
use serde::Serialize;

/// JSON shape of `rsmith run --json`.
#[derive(Serialize)]
pub struct RunOutput<'a> {
    pub outcome: MissionOutcome,
    pub exit_code: u8,
    #[serde(flatten)]
    pub report: &'a MissionReport,
}

impl<'a> RunOutput<'a> {
    pub fn new(report: &'a MissionReport) -> Self {
        let outcome = report.outcome();
        Self {
            outcome,
            exit_code: outcome.exit_code(),
            report,
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

/// Log transcript followed by the artifact and outcome lines.
pub fn render_run(report: &MissionReport) -> String {
    let mut text = report.log.render();
    text.push('\n');
    match report.artifact.as_ref() {
        Some(path) => text.push_str(&format!("artifact: {}\n", path.display())),
        None => text.push_str("artifact: none\n"),
    }
    let notification = match &report.notification {
        NotificationStatus::NotAttempted => "not attempted".to_string(),
        NotificationStatus::Sent => "sent".to_string(),
        NotificationStatus::Failed(reason) => format!("failed ({reason})"),
    };
    text.push_str(&format!("notification: {notification}\n"));
    let outcome = report.outcome();
    match report.abort.as_ref() {
        Some(reason) if outcome == MissionOutcome::Failed => {
            text.push_str(&format!("outcome: {} ({reason})\n", outcome.describe()));
        }
        _ => text.push_str(&format!("outcome: {}\n", outcome.describe())),
    }
    text
}

pub fn render_status(summary: &StatusSummary) -> String {
    let mut text = String::new();
    text.push_str(&format!("workspace: {}\n", summary.workspace.display()));
    text.push_str(&format!("week: {}\n", summary.week));
    let config_state = match (summary.config.present, summary.config.valid) {
        (false, _) => "missing".to_string(),
        (true, true) => "valid".to_string(),
        (true, false) => format!(
            "invalid ({})",
            summary.config.error.as_deref().unwrap_or("unknown error")
        ),
    };
    text.push_str(&format!("config: {config_state}\n"));
    if let Some(transport) = summary.transport.as_ref() {
        let state = if transport.ready { "ready" } else { "not ready" };
        text.push_str(&format!("transport: {} ({state})\n", transport.kind));
    }
    if let Some(inputs) = summary.inputs.as_ref() {
        text.push_str(&format!("input dir: {}\n", inputs.dir.display()));
        match (inputs.pattern.as_deref(), inputs.error.as_deref()) {
            (_, Some(error)) => text.push_str(&format!("pattern: invalid ({error})\n")),
            (Some(pattern), None) => {
                text.push_str(&format!("pattern: {pattern}\n"));
                text.push_str(&format!("input files: {}\n", inputs.files));
            }
            (None, None) => {}
        }
    }
    if let Some(artifact) = summary.artifact.as_ref() {
        let state = if artifact.exists { "present" } else { "not yet generated" };
        text.push_str(&format!("artifact: {} ({state})\n", artifact.path.display()));
    }
    text.push_str(&format!("next: {}\n", summary.next_action));
    text
}
