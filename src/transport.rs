//! Concrete mail transports and the preflight checks that guard them.
mod gmail;
pub mod oauth;
mod outbox;

pub use gmail::{http_agent, GmailAuthenticator};
pub use outbox::OutboxAuthenticator;

use crate::config::{MissionConfig, TransportConfig};
use crate::notify::Authenticator;
use crate::paths::WorkspacePaths;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;

/// Build the authenticator selected by `config.transport`.
pub fn build_authenticator(
    config: &MissionConfig,
    paths: &WorkspacePaths,
) -> Box<dyn Authenticator> {
    match &config.transport {
        TransportConfig::Gmail {
            http_timeout_seconds,
        } => Box::new(GmailAuthenticator::new(
            paths.credentials_path(),
            paths.token_path(),
            Duration::from_secs(*http_timeout_seconds),
        )),
        TransportConfig::Outbox { dir } => Box::new(OutboxAuthenticator::new(paths.resolve(dir))),
    }
}

/// Readiness of the configured transport, as reported by `rsmith status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportReadiness {
    pub kind: &'static str,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Check the transport without contacting any service.
pub fn readiness(config: &MissionConfig, paths: &WorkspacePaths) -> TransportReadiness {
    let problem = match &config.transport {
        TransportConfig::Gmail { .. } => gmail_problem(paths),
        TransportConfig::Outbox { .. } => None,
    };
    TransportReadiness {
        kind: config.transport.kind(),
        ready: problem.is_none(),
        problem,
    }
}

/// Configuration errors that must stop a run before the mission starts.
pub fn preflight(config: &MissionConfig, paths: &WorkspacePaths) -> Result<()> {
    match readiness(config, paths).problem {
        Some(problem) => Err(anyhow!(problem)),
        None => Ok(()),
    }
}

fn gmail_problem(paths: &WorkspacePaths) -> Option<String> {
    let credentials = paths.credentials_path();
    if !credentials.is_file() {
        return Some(format!(
            "missing OAuth client credentials: download the desktop client JSON from the \
             Google Cloud console and save it as {}",
            credentials.display()
        ));
    }
    let token = paths.token_path();
    if !token.is_file() {
        return Some(format!(
            "not authorized yet: no token at {} (run `rsmith authorize`)",
            token.display()
        ));
    }
    None
}
