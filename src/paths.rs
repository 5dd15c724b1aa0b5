//! Typed paths into a workspace layout.
use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable selecting the workspace root.
pub const WORKSPACE_ENV: &str = "RSMITH_WORKSPACE";

/// Convenience wrapper for locating workspace files.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Return the OAuth client `credentials.json` path.
    pub fn credentials_path(&self) -> PathBuf {
        self.root.join("credentials.json")
    }

    /// Return the stored OAuth `token.json` path.
    pub fn token_path(&self) -> PathBuf {
        self.root.join("token.json")
    }

    /// Resolve a configured directory; relative paths hang off the root.
    pub fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        }
    }
}

/// Pick the workspace root: explicit flag, then `RSMITH_WORKSPACE`, then the
/// per-user data directory.
pub fn resolve_workspace_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env::var_os(WORKSPACE_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    // Default to ~/.local/share/report-smith
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(data_dir.join("report-smith"))
}
