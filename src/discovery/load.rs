//! Format-specific loaders turning a file into raw headers and cells.
use super::SourceFormat;
use crate::table::{Table, Value};
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// Parse `path` as `format` into a typed table.
pub(super) fn load_table(path: &Path, format: SourceFormat) -> Result<Table> {
    let (headers, rows) = match format {
        SourceFormat::Csv => read_csv(path)?,
        SourceFormat::Xlsx => read_xlsx(path)?,
    };
    Table::from_raw(headers, rows).with_context(|| format!("parse {}", path.display()))
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(anyhow!("{} has no header row", path.display()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read {}", path.display()))?;
        rows.push(record.iter().map(Value::from_field).collect());
    }
    Ok((headers, rows))
}

fn read_xlsx(path: &Path) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("open workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("{} has no worksheets", path.display()))?
        .with_context(|| format!("read first worksheet of {}", path.display()))?;

    let mut row_iter = range.rows();
    let header_row = row_iter
        .next()
        .ok_or_else(|| anyhow!("{} has no header row", path.display()))?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_value(cell).to_string())
        .collect();

    let mut rows = Vec::new();
    for row in row_iter {
        let values: Vec<Value> = row.iter().map(cell_value).collect();
        if values.iter().all(Value::is_empty) {
            continue;
        }
        rows.push(values);
    }
    Ok((trim_trailing_blank_headers(headers), rows))
}

/// Drop empty header cells past the last named column.
///
/// The used range of a sheet can extend past the table when a cell was
/// formatted but left blank; the matching data cells must then be empty too.
fn trim_trailing_blank_headers(mut headers: Vec<String>) -> Vec<String> {
    while headers.last().is_some_and(|header| header.trim().is_empty()) {
        headers.pop();
    }
    headers
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::Int(value) => Value::Number(*value as f64),
        Data::Float(value) => Value::Number(*value),
        Data::String(text) => Value::from_field(text),
        other => Value::from_field(&other.to_string()),
    }
}
