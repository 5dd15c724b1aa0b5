//! Merge row-sets into the full table and the per-product summary.
//!
//! Schema checks run before any arithmetic: a missing or non-numeric
//! measure column is a `SchemaViolation`, never a late arithmetic error.
use crate::discovery::RowSet;
use crate::mission::MissionLog;
use crate::table::{
    Column, ColumnType, Table, Value, PRODUCT_ID_COLUMN, PRODUCT_NAME_COLUMN, QUANTITY_COLUMN,
    SUM_QUANTITY_COLUMN, SUM_TOTAL_SALE_COLUMN, TOTAL_SALE_COLUMN, UNIT_PRICE_COLUMN,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Columns every row-set must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    PRODUCT_ID_COLUMN,
    PRODUCT_NAME_COLUMN,
    QUANTITY_COLUMN,
    UNIT_PRICE_COLUMN,
];

const MEASURE_COLUMNS: [&str; 2] = [QUANTITY_COLUMN, UNIT_PRICE_COLUMN];

#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("schema violation in '{source_name}': {detail}")]
    SchemaViolation { source_name: String, detail: String },
    #[error("build consolidated table: {0}")]
    Table(#[from] anyhow::Error),
}

impl ConsolidateError {
    fn violation(source_name: &str, detail: impl Into<String>) -> Self {
        Self::SchemaViolation {
            source_name: source_name.to_string(),
            detail: detail.into(),
        }
    }
}

/// The full merged table plus its per-product aggregate.
#[derive(Debug, Clone)]
pub struct ConsolidatedReport {
    full: Table,
    summary: Table,
    sources: Vec<String>,
}

impl ConsolidatedReport {
    pub fn full(&self) -> &Table {
        &self.full
    }

    pub fn summary(&self) -> &Table {
        &self.summary
    }

    /// Source file names in discovery order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// Consolidate `row_sets`; `Ok(None)` when there is nothing to process.
pub fn consolidate(
    row_sets: &[RowSet],
    log: &mut MissionLog,
) -> Result<Option<ConsolidatedReport>, ConsolidateError> {
    if row_sets.is_empty() {
        log.info("no data to process");
        return Ok(None);
    }

    log.info("consolidating all data into a single report");
    let columns = union_schema(row_sets)?;
    let full = concat_with_total(row_sets, columns)?;
    log.info(format!(
        "data consolidated: {} rows from {} file(s)",
        full.len(),
        row_sets.len()
    ));
    log.info(format!(
        "computed '{TOTAL_SALE_COLUMN}' = {QUANTITY_COLUMN} * {UNIT_PRICE_COLUMN}"
    ));

    let summary = summarize(&full)?;
    log.info(format!(
        "grouped sales by product: {} product(s)",
        summary.len()
    ));
    tracing::info!(rows = full.len(), products = summary.len(), "consolidated");

    Ok(Some(ConsolidatedReport {
        full,
        summary,
        sources: row_sets
            .iter()
            .map(|row_set| row_set.source.name.clone())
            .collect(),
    }))
}

/// Validate every row-set and return the unioned columns in first-seen order.
fn union_schema(row_sets: &[RowSet]) -> Result<Vec<Column>, ConsolidateError> {
    let mut columns: Vec<Column> = Vec::new();
    for row_set in row_sets {
        let name = row_set.source.name.as_str();
        for required in REQUIRED_COLUMNS {
            if row_set.table.column(required).is_none() {
                return Err(ConsolidateError::violation(
                    name,
                    format!("missing required column '{required}'"),
                ));
            }
        }
        for measure in MEASURE_COLUMNS {
            if let Some(column) = row_set.table.column(measure) {
                if column.kind == ColumnType::Text {
                    return Err(ConsolidateError::violation(
                        name,
                        format!("column '{measure}' must be numeric"),
                    ));
                }
            }
        }
        for column in row_set.table.columns() {
            match columns.iter_mut().find(|known| known.name == column.name) {
                // Recomputed by `concat_with_total`; input values are discarded.
                Some(known) if known.name == TOTAL_SALE_COLUMN => {}
                Some(known) => {
                    let earlier = known.kind;
                    known.kind = earlier.unify(column.kind).ok_or_else(|| {
                        ConsolidateError::violation(
                            name,
                            format!(
                                "column '{}' is {} here but {} in earlier files",
                                column.name, column.kind, earlier
                            ),
                        )
                    })?;
                }
                None => columns.push(column.clone()),
            }
        }
    }
    Ok(columns)
}

fn concat_with_total(row_sets: &[RowSet], mut columns: Vec<Column>) -> anyhow::Result<Table> {
    let quantity_index = position(&columns, QUANTITY_COLUMN)?;
    let price_index = position(&columns, UNIT_PRICE_COLUMN)?;
    // An input `Total_Venta` is overwritten in place, never duplicated.
    let total_index = match columns.iter().position(|c| c.name == TOTAL_SALE_COLUMN) {
        Some(index) => {
            columns[index].kind = ColumnType::Number;
            index
        }
        None => {
            columns.push(Column::new(TOTAL_SALE_COLUMN, ColumnType::Number));
            columns.len() - 1
        }
    };

    let mut rows = Vec::with_capacity(row_sets.iter().map(|r| r.table.len()).sum());
    for row_set in row_sets {
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|column| row_set.table.column_index(&column.name))
            .collect();
        for source_row in row_set.table.rows() {
            let mut row: Vec<Value> = mapping
                .iter()
                .map(|index| index.map_or(Value::Empty, |index| source_row[index].clone()))
                .collect();
            let quantity = row[quantity_index].as_number();
            let price = row[price_index].as_number();
            row[total_index] = match (quantity, price) {
                (Some(quantity), Some(price)) => Value::Number(quantity * price),
                _ => Value::Empty,
            };
            rows.push(row);
        }
    }

    Table::new(columns, rows)
}

/// Group by `(ID_Producto, Nombre_Producto)` and sum quantity and sales.
///
/// Empty cells are skipped by the sums; groups sort by key.
fn summarize(full: &Table) -> anyhow::Result<Table> {
    let id_index = position(full.columns(), PRODUCT_ID_COLUMN)?;
    let name_index = position(full.columns(), PRODUCT_NAME_COLUMN)?;
    let quantity_index = position(full.columns(), QUANTITY_COLUMN)?;
    let total_index = position(full.columns(), TOTAL_SALE_COLUMN)?;

    let mut groups: BTreeMap<(String, String), (f64, f64)> = BTreeMap::new();
    for row in full.rows() {
        let key = (row[id_index].as_key(), row[name_index].as_key());
        let sums = groups.entry(key).or_insert((0.0, 0.0));
        sums.0 += row[quantity_index].as_number().unwrap_or(0.0);
        sums.1 += row[total_index].as_number().unwrap_or(0.0);
    }

    let columns = vec![
        Column::new(PRODUCT_ID_COLUMN, ColumnType::Text),
        Column::new(PRODUCT_NAME_COLUMN, ColumnType::Text),
        Column::new(SUM_QUANTITY_COLUMN, ColumnType::Number),
        Column::new(SUM_TOTAL_SALE_COLUMN, ColumnType::Number),
    ];
    let rows = groups
        .into_iter()
        .map(|((id, name), (quantity, total))| {
            vec![
                Value::Text(id),
                Value::Text(name),
                Value::Number(quantity),
                Value::Number(total),
            ]
        })
        .collect();
    Table::new(columns, rows)
}

fn position(columns: &[Column], name: &str) -> anyhow::Result<usize> {
    columns
        .iter()
        .position(|column| column.name == name)
        .ok_or_else(|| anyhow::anyhow!("column '{name}' missing after merge"))
}

#[cfg(test)]
#[path = "consolidate_tests.rs"]
mod tests;
