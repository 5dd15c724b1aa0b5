//! End-to-end runs of the `rsmith` binary over a temporary workspace.

mod common;

use common::{files_in, Workspace, HEADER};
use std::fs;

#[test]
fn init_creates_layout_and_refuses_to_overwrite() {
    let ws = Workspace::create();
    ws.init_outbox();

    assert!(ws.path("config.json").is_file());
    assert!(ws.path("input").is_dir());
    assert!(ws.path("output").is_dir());
    assert!(ws.path("outbox").is_dir());

    let again = ws.rsmith(&[
        "init",
        "--sender",
        "reports@example.com",
        "--recipient",
        "boss@example.com",
        "--transport",
        "outbox",
    ]);
    assert_ne!(again.code, Some(0));
    assert!(again.stderr.contains("--force"), "stderr: {}", again.stderr);
}

#[test]
fn intake_then_run_delivers_weekly_report() {
    let ws = Workspace::create();
    ws.init_outbox();
    let files = vec![
        ws.upload("ventas_lunes.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n")),
        ws.upload(
            "ventas_martes.csv",
            &format!("{HEADER}\nP1,Widget,3,5.0\nP2,Gadget,1,20.0\n"),
        ),
    ];
    let intake = ws.intake(&files);
    assert_eq!(intake.code, Some(0), "intake failed: {}", intake.stderr);

    let run = ws.rsmith(&["run", "--json", "--date", "2026-10-18"]);
    assert_eq!(run.code, Some(0), "run failed: {}\n{}", run.stdout, run.stderr);
    let report = run.json();
    assert_eq!(report["outcome"], "delivered");
    assert_eq!(report["final_state"], "done");
    assert_eq!(report["week"], "2026_S42");
    assert_eq!(report["pattern"], "*.csv");
    assert_eq!(report["notification"]["status"], "sent");

    let artifact = ws.path("output/reporte_consolidado_2026_S42.xlsx");
    assert!(artifact.is_file());
    assert_eq!(
        report["artifact"].as_str(),
        Some(artifact.display().to_string().as_str())
    );

    let outbox = files_in(&ws.path("outbox"));
    assert_eq!(outbox.len(), 1);
    let eml = fs::read_to_string(&outbox[0]).unwrap();
    assert!(eml.contains("Subject: Sales Report Consolidated - Week 2026_S42"));
    assert!(eml.contains("reporte_consolidado_2026_S42.xlsx"));
}

#[test]
fn text_run_prints_log_artifact_and_outcome() {
    let ws = Workspace::create();
    ws.init_outbox();
    ws.intake(&[ws.upload("a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n"))]);

    let run = ws.rsmith(&["run", "--date", "2026-10-18"]);
    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert!(run.stdout.contains("] state: idle -> authenticating"));
    assert!(run.stdout.contains("artifact: "));
    assert!(run
        .stdout
        .contains("outcome: report generated and emailed"));
}

#[test]
fn run_without_inputs_is_not_an_error() {
    let ws = Workspace::create();
    ws.init_outbox();

    let run = ws.rsmith(&["run", "--json", "--date", "2026-10-18"]);
    assert_eq!(run.code, Some(0));
    let report = run.json();
    assert_eq!(report["outcome"], "no_data");
    assert_eq!(report["abort"]["kind"], "no_data");
    assert!(files_in(&ws.path("output")).is_empty());
    assert!(files_in(&ws.path("outbox")).is_empty());
}

#[test]
fn schema_violation_fails_without_artifact() {
    let ws = Workspace::create();
    ws.init_outbox();
    ws.intake(&[
        ws.upload("a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n")),
        ws.upload("b.csv", "ID_Producto,Nombre_Producto,Cantidad\nP2,Gadget,1\n"),
    ]);

    let run = ws.rsmith(&["run", "--json", "--date", "2026-10-18"]);
    assert_eq!(run.code, Some(1));
    let report = run.json();
    assert_eq!(report["outcome"], "failed");
    assert_eq!(report["aborted_in"], "processing");
    assert_eq!(report["abort"]["kind"], "schema_violation");
    assert!(files_in(&ws.path("output")).is_empty());
}

#[test]
fn pattern_flag_selects_inputs() {
    let ws = Workspace::create();
    ws.init_outbox();
    ws.intake(&[
        ws.upload("ventas_a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n")),
        ws.upload("otros.csv", "nothing,useful\n1,2\n"),
    ]);

    let run = ws.rsmith(&["run", "--json", "--date", "2026-10-18", "--pattern", "ventas_*.csv"]);
    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()["outcome"], "delivered");
}

#[test]
fn missing_config_points_at_init() {
    let ws = Workspace::create();
    let run = ws.rsmith(&["run"]);
    assert_eq!(run.code, Some(1));
    assert!(run.stderr.contains("rsmith init"), "stderr: {}", run.stderr);
}

#[test]
fn gmail_without_credentials_fails_preflight() {
    let ws = Workspace::create();
    let init = ws.rsmith(&[
        "init",
        "--sender",
        "reports@example.com",
        "--recipient",
        "boss@example.com",
    ]);
    assert_eq!(init.code, Some(0), "stderr: {}", init.stderr);
    assert!(init.stdout.contains("rsmith authorize"));

    let run = ws.rsmith(&["run"]);
    assert_eq!(run.code, Some(1));
    assert!(
        run.stderr.contains("missing OAuth client credentials"),
        "stderr: {}",
        run.stderr
    );
}

#[test]
fn status_reports_readiness_and_expected_artifact() {
    let ws = Workspace::create();
    ws.init_outbox();
    ws.intake(&[ws.upload("a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n"))]);

    let status = ws.rsmith(&["status", "--json", "--date", "2026-10-18"]);
    assert_eq!(status.code, Some(0), "stderr: {}", status.stderr);
    let summary = status.json();
    assert_eq!(summary["config"]["valid"], true);
    assert_eq!(summary["transport"]["ready"], true);
    assert_eq!(summary["inputs"]["files"], 1);
    assert_eq!(summary["artifact"]["exists"], false);
    assert_eq!(summary["next_action"], "rsmith run");

    ws.rsmith(&["run", "--date", "2026-10-18"]);
    let after = ws.rsmith(&["status", "--json", "--date", "2026-10-18"]).json();
    assert_eq!(after["artifact"]["exists"], true);
}

#[test]
fn rejected_intake_keeps_previous_inputs() {
    let ws = Workspace::create();
    ws.init_outbox();
    ws.intake(&[ws.upload("a.csv", &format!("{HEADER}\nP1,Widget,2,5.0\n"))]);

    let rejected = ws.intake(&[ws.upload("notes.txt", "hello")]);
    assert_ne!(rejected.code, Some(0));
    let inputs = files_in(&ws.path("input"));
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].ends_with("a.csv"));
}
