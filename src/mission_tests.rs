use super::*;
use crate::notify::testing::FakeAuthenticator;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "ID_Producto,Nombre_Producto,Cantidad,Precio_Unitario";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("input")).unwrap();
        Self { dir }
    }

    fn input(&self, name: &str, body: &str) {
        fs::write(self.dir.path().join("input").join(name), body).unwrap();
    }

    fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    fn plan(&self, pattern: &str) -> MissionPlan {
        MissionPlan {
            input_dir: self.dir.path().join("input"),
            output_dir: self.output_dir(),
            pattern: pattern.to_string(),
            sender: "reports@example.com".to_string(),
            recipients: vec!["boss@example.com".to_string()],
            week: ReportWeek::from_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()),
        }
    }

    fn two_files(&self) {
        self.input("a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n"));
        self.input(
            "b.csv",
            &format!("{HEADER}\nP1,Widget,3,5.0\nP2,Gadget,1,20.0\n"),
        );
    }
}

fn output_is_empty(dir: &Path) -> bool {
    !dir.exists() || fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn two_files_are_consolidated_emitted_and_sent() {
    let fixture = Fixture::new();
    fixture.two_files();
    let auth = FakeAuthenticator::ok();

    let report = Mission::new(fixture.plan("*.csv")).run(&auth);

    assert_eq!(report.final_state, MissionState::Done);
    assert_eq!(report.outcome(), MissionOutcome::Delivered);
    assert_eq!(report.notification, NotificationStatus::Sent);
    let artifact = report.artifact.clone().unwrap();
    assert_eq!(
        artifact,
        fixture.output_dir().join("reporte_consolidado_2026_S42.xlsx")
    );
    assert!(artifact.is_file());

    let sent = auth.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Sales Report Consolidated - Week 2026_S42");
    assert_eq!(sent[0].attachment, fs::read(&artifact).unwrap());
    assert_eq!(report.log.count(LogLevel::Error), 0);
}

#[test]
fn every_transition_is_logged_in_order() {
    let fixture = Fixture::new();
    fixture.two_files();
    let report = Mission::new(fixture.plan("*.csv")).run(&FakeAuthenticator::ok());

    let transitions: Vec<&str> = report
        .log
        .entries()
        .iter()
        .filter(|entry| entry.message.starts_with("state: "))
        .map(|entry| entry.message.as_str())
        .collect();
    assert_eq!(
        transitions,
        vec![
            "state: idle -> authenticating",
            "state: authenticating -> discovering",
            "state: discovering -> processing",
            "state: processing -> emitting",
            "state: emitting -> notifying",
            "state: notifying -> done",
        ]
    );
}

#[test]
fn failed_send_keeps_artifact_and_finishes() {
    let fixture = Fixture::new();
    fixture.two_files();
    let auth = FakeAuthenticator::failing_send("smtp unavailable");

    let report = Mission::new(fixture.plan("*.csv")).run(&auth);

    assert_eq!(report.final_state, MissionState::Done);
    assert_eq!(report.outcome(), MissionOutcome::ArtifactOnly);
    assert_eq!(report.outcome().exit_code(), 2);
    assert!(matches!(
        &report.notification,
        NotificationStatus::Failed(reason) if reason.contains("smtp unavailable")
    ));
    assert!(report.artifact.as_ref().unwrap().is_file());
    assert!(report.log.contains(LogLevel::Error, "transport error"));
    assert!(auth.sent().is_empty());
}

#[test]
fn authentication_failure_aborts_before_touching_files() {
    let fixture = Fixture::new();
    fixture.two_files();
    let auth = FakeAuthenticator::unauthorized();

    let report = Mission::new(fixture.plan("*.csv")).run(&auth);

    assert_eq!(report.final_state, MissionState::Aborted);
    assert_eq!(report.aborted_in, Some(MissionState::Authenticating));
    assert!(matches!(
        report.abort,
        Some(AbortReason::AuthenticationFailed(_))
    ));
    assert_eq!(report.outcome(), MissionOutcome::Failed);
    assert_eq!(report.notification, NotificationStatus::NotAttempted);
    assert!(report.artifact.is_none());
    assert!(output_is_empty(&fixture.output_dir()));
}

#[test]
fn empty_input_ends_as_no_data() {
    let fixture = Fixture::new();
    let auth = FakeAuthenticator::ok();

    let report = Mission::new(fixture.plan("*.csv")).run(&auth);

    assert_eq!(report.final_state, MissionState::Aborted);
    assert_eq!(report.aborted_in, Some(MissionState::Discovering));
    assert_eq!(report.abort, Some(AbortReason::NoData));
    assert_eq!(report.outcome(), MissionOutcome::NoData);
    assert_eq!(report.outcome().exit_code(), 0);
    assert!(report.log.contains(LogLevel::Warn, "no files found"));
    assert_eq!(report.log.count(LogLevel::Error), 0);
    assert!(auth.sent().is_empty());
}

#[test]
fn unreadable_files_only_is_no_data() {
    let fixture = Fixture::new();
    fixture.input("broken.csv", "ID_Producto,Cantidad\nP1,1,extra\n");

    let report = Mission::new(fixture.plan("*.csv")).run(&FakeAuthenticator::ok());

    assert_eq!(report.abort, Some(AbortReason::NoData));
    assert!(report.log.contains(LogLevel::Error, "could not read 'broken.csv'"));
}

#[test]
fn invalid_pattern_is_a_discovery_failure() {
    let fixture = Fixture::new();
    fixture.two_files();

    let report = Mission::new(fixture.plan("[")).run(&FakeAuthenticator::ok());

    assert_eq!(report.aborted_in, Some(MissionState::Discovering));
    assert!(matches!(report.abort, Some(AbortReason::DiscoveryFailed(_))));
    assert_eq!(report.outcome(), MissionOutcome::Failed);
}

#[test]
fn schema_violation_stops_before_emitting() {
    let fixture = Fixture::new();
    fixture.input("a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n"));
    fixture.input("b.csv", "ID_Producto,Nombre_Producto,Cantidad\nP2,Gadget,1\n");
    let auth = FakeAuthenticator::ok();

    let report = Mission::new(fixture.plan("*.csv")).run(&auth);

    assert_eq!(report.aborted_in, Some(MissionState::Processing));
    match &report.abort {
        Some(AbortReason::SchemaViolation(detail)) => {
            assert!(detail.contains("b.csv"));
            assert!(detail.contains("Precio_Unitario"));
        }
        other => panic!("unexpected abort: {other:?}"),
    }
    assert!(output_is_empty(&fixture.output_dir()));
    assert!(auth.sent().is_empty());
}

#[test]
fn unwritable_output_is_an_emission_failure() {
    let fixture = Fixture::new();
    fixture.two_files();
    fs::write(fixture.output_dir(), b"not a directory").unwrap();

    let report = Mission::new(fixture.plan("*.csv")).run(&FakeAuthenticator::ok());

    assert_eq!(report.aborted_in, Some(MissionState::Emitting));
    assert!(matches!(report.abort, Some(AbortReason::EmissionFailed(_))));
    assert_eq!(report.notification, NotificationStatus::NotAttempted);
}

#[test]
fn report_serializes_with_tagged_reasons() {
    let fixture = Fixture::new();
    let report = Mission::new(fixture.plan("*.csv")).run(&FakeAuthenticator::ok());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["final_state"], "aborted");
    assert_eq!(value["aborted_in"], "discovering");
    assert_eq!(value["abort"]["kind"], "no_data");
    assert_eq!(value["notification"]["status"], "not_attempted");
    assert_eq!(value["week"], "2026_S42");
    assert!(value["log"].as_array().unwrap().len() > 3);
}

#[test]
fn internal_consolidation_errors_are_not_schema_violations() {
    let internal = processing_abort(ConsolidateError::Table(anyhow::anyhow!(
        "row 3 has 5 cells, expected 6"
    )));
    assert_eq!(
        internal,
        AbortReason::ProcessingFailed("row 3 has 5 cells, expected 6".to_string())
    );
    assert_eq!(
        internal.to_string(),
        "could not consolidate the data: row 3 has 5 cells, expected 6"
    );

    let schema = processing_abort(ConsolidateError::SchemaViolation {
        source_name: "b.csv".to_string(),
        detail: "missing required column 'Precio_Unitario'".to_string(),
    });
    assert!(matches!(schema, AbortReason::SchemaViolation(detail) if detail.contains("b.csv")));
}
