//! Gmail HTTP API transport.
use super::oauth::{self, ClientSecrets, StoredToken};
use crate::notify::{render_mime, Authenticator, EmailMessage, MailSession};
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

#[derive(Serialize)]
struct SendRequest {
    raw: String,
}

/// Build an agent whose calls fail instead of hanging past `timeout`.
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

/// Authenticates from `credentials.json` + `token.json`, refreshing on expiry.
pub struct GmailAuthenticator {
    credentials_path: PathBuf,
    token_path: PathBuf,
    agent: ureq::Agent,
}

impl GmailAuthenticator {
    pub fn new(credentials_path: PathBuf, token_path: PathBuf, timeout: Duration) -> Self {
        Self {
            credentials_path,
            token_path,
            agent: http_agent(timeout),
        }
    }
}

impl Authenticator for GmailAuthenticator {
    fn is_authorized(&self) -> bool {
        self.credentials_path.is_file() && self.token_path.is_file()
    }

    fn authenticate(&self) -> Result<Box<dyn MailSession>> {
        if !self.credentials_path.is_file() {
            return Err(anyhow!(
                "missing OAuth client credentials at {}",
                self.credentials_path.display()
            ));
        }
        if !self.token_path.is_file() {
            return Err(anyhow!(
                "not authorized yet: no token at {} (run `rsmith authorize`)",
                self.token_path.display()
            ));
        }
        let secrets = ClientSecrets::load(&self.credentials_path)?;
        let mut token = StoredToken::load(&self.token_path)?;
        if token.needs_refresh(Utc::now()) {
            token = oauth::refresh(&self.agent, &secrets, &token)?;
            token.save(&self.token_path)?;
            tracing::info!("OAuth token refreshed");
        }
        Ok(Box::new(GmailSession {
            agent: self.agent.clone(),
            access_token: token.access_token,
            token_type: token.token_type,
        }))
    }
}

/// Session bound to one access token.
pub struct GmailSession {
    agent: ureq::Agent,
    access_token: String,
    token_type: String,
}

impl MailSession for GmailSession {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let raw = URL_SAFE_NO_PAD.encode(render_mime(message)?);
        let authorization = format!("{} {}", self.token_type, self.access_token);
        let response = self
            .agent
            .post(SEND_URL)
            .header("Authorization", authorization.as_str())
            .send_json(&SendRequest { raw })
            .context("gmail send request failed")?;
        tracing::info!(status = response.status().as_u16(), "gmail message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn authenticate_without_token_explains_next_step() {
        let dir = TempDir::new().unwrap();
        let credentials = dir.path().join("credentials.json");
        std::fs::write(&credentials, b"{}").unwrap();
        let auth = GmailAuthenticator::new(
            credentials,
            dir.path().join("token.json"),
            Duration::from_secs(1),
        );
        assert!(!auth.is_authorized());
        let err = auth.authenticate().err().unwrap();
        assert!(err.to_string().contains("rsmith authorize"));
    }

    #[test]
    fn authenticate_with_fresh_token_needs_no_network() {
        let dir = TempDir::new().unwrap();
        let credentials = dir.path().join("credentials.json");
        std::fs::write(
            &credentials,
            br#"{"installed":{"client_id":"id","client_secret":"s","auth_uri":"https://a.example/auth","token_uri":"https://a.example/token"}}"#,
        )
        .unwrap();
        let token_path = dir.path().join("token.json");
        StoredToken {
            access_token: "live".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: None,
            token_type: "Bearer".to_string(),
            scopes: Vec::new(),
        }
        .save(&token_path)
        .unwrap();

        let auth = GmailAuthenticator::new(credentials, token_path, Duration::from_secs(1));
        assert!(auth.is_authorized());
        assert!(auth.authenticate().is_ok());
    }
}
