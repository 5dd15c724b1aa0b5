//! Typed tabular model shared by discovery, consolidation, and emission.
//!
//! Column types are inferred once at load time so later stages can reject
//! schema problems by name instead of failing mid-arithmetic.
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Product identifier column of the input schema.
pub const PRODUCT_ID_COLUMN: &str = "ID_Producto";
/// Product name column of the input schema.
pub const PRODUCT_NAME_COLUMN: &str = "Nombre_Producto";
/// Quantity column of the input schema.
pub const QUANTITY_COLUMN: &str = "Cantidad";
/// Unit price column of the input schema.
pub const UNIT_PRICE_COLUMN: &str = "Precio_Unitario";
/// Provenance column appended to every loaded row-set.
pub const SOURCE_COLUMN: &str = "Fuente";
/// Derived `Cantidad * Precio_Unitario` column of the full table.
pub const TOTAL_SALE_COLUMN: &str = "Total_Venta";
/// Summary column holding the per-product quantity sum.
pub const SUM_QUANTITY_COLUMN: &str = "Cantidad_Total";
/// Summary column holding the per-product sales sum.
pub const SUM_TOTAL_SALE_COLUMN: &str = "Venta_Total";

/// Columns whose values are identities, never measures.
const TEXT_COLUMNS: [&str; 3] = [PRODUCT_ID_COLUMN, PRODUCT_NAME_COLUMN, SOURCE_COLUMN];

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
}

impl Value {
    /// Interpret a raw text field: blank is empty, everything else is text.
    pub fn from_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Empty
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Text rendering used for grouping keys; empty renders as `""`.
    pub fn as_key(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(value) => format_number(*value),
            Value::Text(text) => text.clone(),
        }
    }

    fn parse_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Empty => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(value) => write!(f, "{}", format_number(*value)),
            Value::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Number,
    Text,
    /// No non-empty cell has been seen; compatible with any type.
    Blank,
}

impl ColumnType {
    /// Combine two observations of the same column, or `None` on conflict.
    pub fn unify(self, other: ColumnType) -> Option<ColumnType> {
        match (self, other) {
            (ColumnType::Blank, kind) | (kind, ColumnType::Blank) => Some(kind),
            (left, right) if left == right => Some(left),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Number => write!(f, "number"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Blank => write!(f, "blank"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered columns plus rows of exactly one value per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from already-typed columns; every row must match the width.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = columns.len();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(anyhow!(
                "row {} has {} values, expected {}",
                index + 1,
                row.len(),
                width
            ));
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from raw loader output, inferring each column's type.
    ///
    /// Headers must be non-empty and unique. Short rows are padded with
    /// empty cells; long rows are rejected.
    pub fn from_raw(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(anyhow!("missing header row"));
        }
        let mut seen = BTreeSet::new();
        for (index, header) in headers.iter().enumerate() {
            if header.trim().is_empty() {
                return Err(anyhow!("header cell {} is empty", index + 1));
            }
            if !seen.insert(header.as_str()) {
                return Err(anyhow!("duplicate column {header:?}"));
            }
        }

        let width = headers.len();
        let mut rows = rows;
        for (index, row) in rows.iter_mut().enumerate() {
            if row.len() > width {
                return Err(anyhow!(
                    "row {} has {} values, header has {}",
                    index + 1,
                    row.len(),
                    width
                ));
            }
            row.resize(width, Value::Empty);
        }

        let mut columns = Vec::with_capacity(width);
        for (index, header) in headers.into_iter().enumerate() {
            let kind = if TEXT_COLUMNS.contains(&header.as_str()) {
                ColumnType::Text
            } else {
                infer_kind(rows.iter().map(|row| &row[index]))
            };
            for row in rows.iter_mut() {
                normalize_cell(&mut row[index], kind);
            }
            columns.push(Column::new(header, kind));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Iterate one column's values; empty iterator when the column is absent.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.map(|index| &row[index]))
    }

    /// Set a text column to `value` on every row, appending it when absent.
    pub fn set_text_column(&mut self, name: &str, value: &str) {
        let index = match self.column_index(name) {
            Some(index) => {
                self.columns[index].kind = ColumnType::Text;
                index
            }
            None => {
                self.columns.push(Column::new(name, ColumnType::Text));
                for row in self.rows.iter_mut() {
                    row.push(Value::Empty);
                }
                self.columns.len() - 1
            }
        };
        for row in self.rows.iter_mut() {
            row[index] = Value::Text(value.to_string());
        }
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut kind = ColumnType::Blank;
    for cell in cells {
        match cell {
            Value::Empty => {}
            other if other.parse_number().is_some() => {
                if kind == ColumnType::Blank {
                    kind = ColumnType::Number;
                }
            }
            _ => return ColumnType::Text,
        }
    }
    kind
}

fn normalize_cell(cell: &mut Value, kind: ColumnType) {
    let normalized = match (kind, &*cell) {
        (_, Value::Empty) => return,
        (ColumnType::Number, other) => match other.parse_number() {
            Some(number) => Value::Number(number),
            None => return,
        },
        (ColumnType::Text, Value::Number(number)) => Value::Text(format_number(*number)),
        _ => return,
    };
    *cell = normalized;
}
