//! CLI argument parsing for the report mission.
//!
//! The CLI only gathers inputs; workspace resolution and mission policy live
//! in `workflow` so commands stay thin.
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "rsmith",
    version,
    about = "Consolidate weekly sales reports and email the result",
    after_help = "Commands:\n  init --sender <addr> --recipient <addr>  Create the workspace and config.json\n  authorize                                One-time Gmail consent (writes token.json)\n  intake <FILE>...                         Replace the input files\n  run                                      Consolidate, write the workbook, and email it\n  status                                   Summarize workspace readiness\n\nExamples:\n  rsmith init --sender reports@example.com --recipient boss@example.com\n  rsmith authorize\n  rsmith intake ~/Downloads/ventas_*.csv\n  rsmith run\n  rsmith status --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Workspace root (default: RSMITH_WORKSPACE, then the user data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Emit debug diagnostics on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Authorize(AuthorizeArgs),
    Intake(IntakeArgs),
    Run(RunArgs),
    Status(StatusArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Gmail,
    Outbox,
}

/// Init command inputs for bootstrapping a workspace.
#[derive(Parser, Debug)]
#[command(about = "Create the workspace directories and config.json")]
pub struct InitArgs {
    /// Address the report is sent from
    #[arg(long, value_name = "ADDR")]
    pub sender: String,

    /// Report recipient (repeatable)
    #[arg(long = "recipient", value_name = "ADDR", required = true)]
    pub recipients: Vec<String>,

    /// How reports are delivered
    #[arg(long, value_enum, default_value_t = TransportKind::Gmail)]
    pub transport: TransportKind,

    /// Overwrite an existing config.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Authorize the Gmail account once and store token.json")]
pub struct AuthorizeArgs {
    /// Authorization code or redirected URL (prompted for when omitted)
    #[arg(long, value_name = "CODE")]
    pub code: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Replace the input directory with the given reports")]
pub struct IntakeArgs {
    /// CSV or XLSX reports to process next
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Consolidate inputs, write the weekly workbook, and email it")]
pub struct RunArgs {
    /// Glob selecting input files (overrides RSMITH_PATTERN and config)
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Report date used for the week label (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Emit the mission report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Summarize workspace readiness and the expected artifact")]
pub struct StatusArgs {
    /// Report date used for the week label (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
