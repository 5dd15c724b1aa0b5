//! Upload intake: swap the input directory for a new batch of reports.
use crate::discovery::SourceFormat;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Replace every file in `input_dir` with copies of `files`.
///
/// All files are checked before anything is deleted, so a rejected batch
/// leaves the previous inputs in place.
pub fn replace_inputs(input_dir: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Err(anyhow!("no files given"));
    }
    let mut names = BTreeSet::new();
    for file in files {
        if !file.is_file() {
            return Err(anyhow!("{} is not a readable file", file.display()));
        }
        if SourceFormat::from_path(file).is_none() {
            return Err(anyhow!(
                "{} is not a .csv or .xlsx report",
                file.display()
            ));
        }
        let name = file
            .file_name()
            .ok_or_else(|| anyhow!("{} has no file name", file.display()))?;
        if !names.insert(name.to_os_string()) {
            return Err(anyhow!(
                "more than one file is named {}",
                name.to_string_lossy()
            ));
        }
    }

    fs::create_dir_all(input_dir).with_context(|| format!("create {}", input_dir.display()))?;
    let mut removed = 0usize;
    for entry in fs::read_dir(input_dir).with_context(|| format!("read {}", input_dir.display()))? {
        let path = entry
            .with_context(|| format!("read {}", input_dir.display()))?
            .path();
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
            removed += 1;
        }
    }
    tracing::debug!(removed, dir = %input_dir.display(), "cleared previous inputs");

    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let target = input_dir.join(file.file_name().unwrap_or_default());
        fs::copy(file, &target)
            .with_context(|| format!("copy {} to {}", file.display(), target.display()))?;
        copied.push(target);
    }
    tracing::info!(files = copied.len(), "inputs replaced");
    Ok(copied)
}
