//! Mission orchestrator: one run from authentication to notification.
//!
//! The run is a linear state machine that stops at the first failing stage.
//! Every transition and stage event lands in the run's `MissionLog`; nothing
//! escapes as an error, the caller always gets a `MissionReport`.
mod log;

pub use log::{LogLevel, MissionLog};

use crate::consolidate::{consolidate, ConsolidateError};
use crate::discovery::discover;
use crate::notify::{notify, Authenticator, NotificationStatus};
use crate::report::{emit, ReportWeek};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionState {
    Idle,
    Authenticating,
    Discovering,
    Processing,
    Emitting,
    Notifying,
    Done,
    Aborted,
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Discovering => "discovering",
            Self::Processing => "processing",
            Self::Emitting => "emitting",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why a run stopped before `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),
    #[error("no data to process")]
    NoData,
    #[error("{0}")]
    SchemaViolation(String),
    #[error("could not consolidate the data: {0}")]
    ProcessingFailed(String),
    #[error("could not write the report: {0}")]
    EmissionFailed(String),
    #[error("no report was generated")]
    NothingEmitted,
}

/// Fully resolved inputs for one run.
#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pattern: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub week: ReportWeek,
}

/// How the operator should read a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    Delivered,
    /// The artifact is ready but the email was not sent.
    ArtifactOnly,
    NoData,
    Failed,
}

impl MissionOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Delivered | Self::NoData => 0,
            Self::Failed => 1,
            Self::ArtifactOnly => 2,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Delivered => "report generated and emailed",
            Self::ArtifactOnly => "report generated but notification failed",
            Self::NoData => "no data to process",
            Self::Failed => "mission failed",
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub week: String,
    pub pattern: String,
    pub final_state: MissionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_in: Option<MissionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortReason>,
    pub artifact: Option<PathBuf>,
    pub notification: NotificationStatus,
    pub log: MissionLog,
}

impl MissionReport {
    pub fn outcome(&self) -> MissionOutcome {
        match (&self.abort, &self.notification) {
            (Some(AbortReason::NoData), _) => MissionOutcome::NoData,
            (Some(_), _) => MissionOutcome::Failed,
            (None, NotificationStatus::Sent) => MissionOutcome::Delivered,
            (None, _) => MissionOutcome::ArtifactOnly,
        }
    }
}

pub struct Mission {
    plan: MissionPlan,
}

impl Mission {
    pub fn new(plan: MissionPlan) -> Self {
        Self { plan }
    }

    /// Execute the mission with sessions from `authenticator`.
    pub fn run(&self, authenticator: &dyn Authenticator) -> MissionReport {
        let plan = &self.plan;
        let mut run = Run::new();
        run.log.info(format!(
            "mission started for week {} (pattern '{}')",
            plan.week, plan.pattern
        ));

        run.enter(MissionState::Authenticating);
        if !authenticator.is_authorized() {
            run.log.warn("no stored authorization found");
        }
        let session = match authenticator.authenticate() {
            Ok(session) => {
                run.log.info("authentication successful");
                session
            }
            Err(err) => {
                return run.abort(AbortReason::AuthenticationFailed(format!("{err:#}")), plan)
            }
        };

        run.enter(MissionState::Discovering);
        let row_sets = match discover(&plan.input_dir, &plan.pattern, &mut run.log) {
            Ok(row_sets) if row_sets.is_empty() => return run.abort(AbortReason::NoData, plan),
            Ok(row_sets) => row_sets,
            Err(err) => return run.abort(AbortReason::DiscoveryFailed(format!("{err:#}")), plan),
        };

        run.enter(MissionState::Processing);
        let report = match consolidate(&row_sets, &mut run.log) {
            Ok(Some(report)) => report,
            Ok(None) => return run.abort(AbortReason::NoData, plan),
            Err(err) => return run.abort(processing_abort(err), plan),
        };

        run.enter(MissionState::Emitting);
        let artifact = match emit(Some(&report), &plan.output_dir, plan.week, &mut run.log) {
            Ok(Some(path)) => path,
            Ok(None) => return run.abort(AbortReason::NothingEmitted, plan),
            Err(err) => return run.abort(AbortReason::EmissionFailed(format!("{err:#}")), plan),
        };
        run.artifact = Some(artifact.clone());

        run.enter(MissionState::Notifying);
        run.notification = notify(
            session.as_ref(),
            &plan.sender,
            &plan.recipients,
            &artifact,
            plan.week,
            &mut run.log,
        );
        if matches!(run.notification, NotificationStatus::Failed(_)) {
            run.log.warn(format!(
                "report is ready at {} but could not be emailed",
                artifact.display()
            ));
        }

        run.enter(MissionState::Done);
        run.log.info("mission complete");
        run.finish(plan)
    }
}

fn processing_abort(err: ConsolidateError) -> AbortReason {
    match err {
        ConsolidateError::SchemaViolation { .. } => AbortReason::SchemaViolation(err.to_string()),
        ConsolidateError::Table(source) => AbortReason::ProcessingFailed(format!("{source:#}")),
    }
}

/// Mutable state of a run in progress.
struct Run {
    state: MissionState,
    aborted_in: Option<MissionState>,
    abort: Option<AbortReason>,
    artifact: Option<PathBuf>,
    notification: NotificationStatus,
    log: MissionLog,
}

impl Run {
    fn new() -> Self {
        Self {
            state: MissionState::Idle,
            aborted_in: None,
            abort: None,
            artifact: None,
            notification: NotificationStatus::NotAttempted,
            log: MissionLog::new(),
        }
    }

    fn enter(&mut self, next: MissionState) {
        tracing::debug!(from = %self.state, to = %next, "mission transition");
        self.log.info(format!("state: {} -> {next}", self.state));
        self.state = next;
    }

    fn abort(mut self, reason: AbortReason, plan: &MissionPlan) -> MissionReport {
        let message = format!("mission aborted while {}: {reason}", self.state);
        if reason == AbortReason::NoData {
            self.log.warn(message);
        } else {
            self.log.error(message);
        }
        self.aborted_in = Some(self.state);
        self.abort = Some(reason);
        self.enter(MissionState::Aborted);
        self.finish(plan)
    }

    fn finish(self, plan: &MissionPlan) -> MissionReport {
        MissionReport {
            week: plan.week.label(),
            pattern: plan.pattern.clone(),
            final_state: self.state,
            aborted_in: self.aborted_in,
            abort: self.abort,
            artifact: self.artifact,
            notification: self.notification,
            log: self.log,
        }
    }
}

#[cfg(test)]
#[path = "mission_tests.rs"]
mod tests;
