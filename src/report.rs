//! Report emission: the two-sheet workbook and its week-derived file name.
//!
//! Artifacts are written to a temp file beside the target and renamed into
//! place, so readers never observe a partially written workbook.
use crate::consolidate::ConsolidatedReport;
use crate::mission::MissionLog;
use crate::table::{Table, Value};
use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sheet holding every consolidated row.
pub const FULL_SHEET_NAME: &str = "Datos_Completos";
/// Sheet holding the per-product summary.
pub const SUMMARY_SHEET_NAME: &str = "Resumen_por_Producto";
/// Artifact file name prefix.
pub const ARTIFACT_PREFIX: &str = "reporte_consolidado";
/// MIME type of the emitted workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// ISO 8601 week of a report date.
///
/// The same label feeds the artifact name, the email subject, and status
/// lookups, so a week always maps to exactly one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWeek {
    pub year: i32,
    pub week: u32,
}

impl ReportWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// `<isoyear>_S<ww>`, e.g. `2026_S42`.
    pub fn label(&self) -> String {
        format!("{}_S{:02}", self.year, self.week)
    }

    /// `reporte_consolidado_<label>.xlsx`.
    pub fn artifact_file_name(&self) -> String {
        format!("{ARTIFACT_PREFIX}_{}.xlsx", self.label())
    }

    pub fn artifact_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.artifact_file_name())
    }
}

impl fmt::Display for ReportWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Write `report` into `output_dir` for `week`; `Ok(None)` when there is no report.
pub fn emit(
    report: Option<&ConsolidatedReport>,
    output_dir: &Path,
    week: ReportWeek,
    log: &mut MissionLog,
) -> Result<Option<PathBuf>> {
    let Some(report) = report else {
        log.info("no processed report, nothing to save");
        return Ok(None);
    };

    let path = week.artifact_path(output_dir);
    log.info(format!("generating workbook at {}", path.display()));
    let bytes = render_workbook(report)?;
    write_atomic(&path, &bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
    log.info(format!(
        "report generated: {} ({} rows, {} products)",
        path.display(),
        report.full().len(),
        report.summary().len()
    ));
    Ok(Some(path))
}

/// Serialize both tables into an in-memory XLSX workbook.
pub fn render_workbook(report: &ConsolidatedReport) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook
            .add_worksheet()
            .set_name(FULL_SHEET_NAME)
            .context("name full sheet")?;
        write_table(sheet, report.full())?;
    }
    {
        let sheet = workbook
            .add_worksheet()
            .set_name(SUMMARY_SHEET_NAME)
            .context("name summary sheet")?;
        write_table(sheet, report.summary())?;
    }
    workbook.save_to_buffer().context("serialize workbook")
}

fn write_table(sheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col, column) in table.columns().iter().enumerate() {
        let col = column_number(col)?;
        sheet
            .write_string(0, col, column.name.as_str())
            .with_context(|| format!("write header {}", column.name))?;
    }
    for (row_index, row) in table.rows().iter().enumerate() {
        let row_number = u32::try_from(row_index + 1)
            .map_err(|_| anyhow!("too many rows for a worksheet"))?;
        for (col, value) in row.iter().enumerate() {
            let col = column_number(col)?;
            match value {
                Value::Empty => {}
                Value::Number(number) => {
                    sheet
                        .write_number(row_number, col, *number)
                        .with_context(|| format!("write cell {row_number}:{col}"))?;
                }
                Value::Text(text) => {
                    sheet
                        .write_string(row_number, col, text.as_str())
                        .with_context(|| format!("write cell {row_number}:{col}"))?;
                }
            }
        }
    }
    Ok(())
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| anyhow!("too many columns for a worksheet"))
}

/// Replace `path` with `bytes` via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("artifact path {} has no parent", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}
