//! Input discovery: find matching report files and load them as row-sets.
//!
//! A single unreadable file never aborts the batch; it is logged and
//! skipped so the remaining files still reach consolidation.
mod load;

use crate::mission::MissionLog;
use crate::table::{Table, SOURCE_COLUMN};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default glob used when nothing else selects a pattern.
pub const DEFAULT_PATTERN: &str = "*.csv";

/// File formats the loaders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// A discovered input file; read once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub name: String,
    pub format: Option<SourceFormat>,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let format = SourceFormat::from_path(&path);
        Self { path, name, format }
    }
}

/// One source file's table, tagged with its provenance column.
#[derive(Debug, Clone)]
pub struct RowSet {
    pub source: SourceFile,
    pub table: Table,
}

impl RowSet {
    /// Load `source` and append the `Fuente` column.
    pub fn load(source: SourceFile) -> Result<Self> {
        let format = source
            .format
            .ok_or_else(|| anyhow!("unsupported file type for {}", source.name))?;
        let mut table = load::load_table(&source.path, format)?;
        table.set_text_column(SOURCE_COLUMN, &source.name);
        Ok(Self { source, table })
    }
}

/// List regular files in `input_dir` whose name matches `pattern`, sorted by name.
///
/// A missing directory yields no matches.
pub fn matching_files(input_dir: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    let matcher =
        glob::Pattern::new(pattern).with_context(|| format!("invalid file pattern {pattern:?}"))?;
    if !input_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in
        fs::read_dir(input_dir).with_context(|| format!("read {}", input_dir.display()))?
    {
        let entry = entry.with_context(|| format!("read {}", input_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matcher.matches(name));
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths.into_iter().map(SourceFile::new).collect())
}

/// Infer `*.<ext>` from the first file (by name) in `input_dir`.
pub fn infer_pattern(input_dir: &Path) -> Result<Option<String>> {
    let files = matching_files(input_dir, "*")?;
    Ok(files.iter().find_map(|file| {
        file.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!("*.{ext}"))
    }))
}

/// Find files matching `pattern` under `input_dir` and load each as a row-set.
///
/// Zero matches returns an empty vector with a warning; per-file load
/// failures are logged and skipped. Only an invalid pattern or an unreadable
/// directory is an error.
pub fn discover(input_dir: &Path, pattern: &str, log: &mut MissionLog) -> Result<Vec<RowSet>> {
    log.info(format!(
        "searching for files matching '{pattern}' in '{}'",
        input_dir.display()
    ));
    let files = matching_files(input_dir, pattern)?;
    if files.is_empty() {
        log.warn("no files found to process");
        return Ok(Vec::new());
    }

    let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
    log.info(format!(
        "found {} file(s): {}",
        files.len(),
        names.join(", ")
    ));

    let mut row_sets = Vec::with_capacity(files.len());
    for file in files {
        let name = file.name.clone();
        match RowSet::load(file) {
            Ok(row_set) => {
                tracing::debug!(file = %name, rows = row_set.table.len(), "loaded input file");
                log.info(format!(
                    "loaded '{name}' ({} rows)",
                    row_set.table.len()
                ));
                row_sets.push(row_set);
            }
            Err(err) => {
                log.error(format!("could not read '{name}': {err:#}"));
            }
        }
    }
    Ok(row_sets)
}
