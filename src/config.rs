//! Mission configuration helpers.
//!
//! This module loads, validates, and resolves `config.json` so a run sees a
//! single, fully-specified view of directories, pattern, and recipients.
use crate::discovery::{infer_pattern, DEFAULT_PATTERN};
use crate::notify::parse_mailbox;
use crate::paths::WorkspacePaths;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Environment variable overriding the configured file pattern.
pub const PATTERN_ENV: &str = "RSMITH_PATTERN";
/// Default timeout for Gmail HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("outbox")
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECONDS
}

/// How reports leave the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Gmail HTTP API with stored OAuth tokens.
    Gmail {
        #[serde(default = "default_http_timeout")]
        http_timeout_seconds: u64,
    },
    /// Write `.eml` files into a directory instead of sending.
    Outbox {
        #[serde(default = "default_outbox_dir")]
        dir: PathBuf,
    },
}

impl TransportConfig {
    pub fn gmail() -> Self {
        Self::Gmail {
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
        }
    }

    pub fn outbox() -> Self {
        Self::Outbox {
            dir: default_outbox_dir(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gmail { .. } => "gmail",
            Self::Outbox { .. } => "outbox",
        }
    }
}

/// Workspace-owned mission configuration (`config.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionConfig {
    pub schema_version: u32,
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,
    pub sender: String,
    pub recipients: Vec<String>,
    pub transport: TransportConfig,
}

/// Build the config written by `rsmith init`.
pub fn default_config(
    sender: String,
    recipients: Vec<String>,
    transport: TransportConfig,
) -> MissionConfig {
    MissionConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        input_dir: default_input_dir(),
        output_dir: default_output_dir(),
        file_pattern: None,
        sender,
        recipients,
        transport,
    }
}

/// Load `config.json` from the workspace.
pub fn load_config(paths: &WorkspacePaths) -> Result<MissionConfig> {
    let path = paths.config_path();
    if !path.is_file() {
        return Err(anyhow!(
            "missing config {} (run `rsmith init` first)",
            path.display()
        ));
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: MissionConfig =
        serde_json::from_slice(&bytes).context("parse mission config JSON")?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(paths: &WorkspacePaths, config: &MissionConfig) -> Result<()> {
    let path = paths.config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize mission config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version, addresses, and pattern.
pub fn validate_config(config: &MissionConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    parse_mailbox(&config.sender).context("sender")?;
    if config.recipients.is_empty() {
        return Err(anyhow!("recipients must list at least one address"));
    }
    for recipient in &config.recipients {
        parse_mailbox(recipient).context("recipients")?;
    }
    if let Some(pattern) = config.file_pattern.as_deref() {
        if pattern.trim().is_empty() {
            return Err(anyhow!("file_pattern must be non-empty when set"));
        }
    }
    if let TransportConfig::Gmail {
        http_timeout_seconds,
    } = &config.transport
    {
        if *http_timeout_seconds == 0 {
            return Err(anyhow!("http_timeout_seconds must be greater than zero"));
        }
    }
    Ok(())
}

impl MissionConfig {
    pub fn input_dir(&self, paths: &WorkspacePaths) -> PathBuf {
        paths.resolve(&self.input_dir)
    }

    pub fn output_dir(&self, paths: &WorkspacePaths) -> PathBuf {
        paths.resolve(&self.output_dir)
    }
}

/// Choose the file pattern: flag > env > config > inferred > `*.csv`.
pub fn resolve_pattern(
    explicit: Option<&str>,
    env_value: Option<&str>,
    config: &MissionConfig,
    input_dir: &Path,
) -> Result<String> {
    let chosen = [explicit, env_value, config.file_pattern.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty());
    if let Some(pattern) = chosen {
        return Ok(pattern.to_string());
    }
    Ok(infer_pattern(input_dir)?.unwrap_or_else(|| DEFAULT_PATTERN.to_string()))
}

/// Read the pattern override from the environment.
pub fn pattern_from_env() -> Option<String> {
    std::env::var(PATTERN_ENV).ok()
}
