//! OAuth client credentials, stored tokens, and the one-time consent flow.
//!
//! Tokens are refreshed on expiry and written back so later runs never need
//! the interactive step again.
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// Scope allowing the account to send mail and nothing else.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_MINUTES: i64 = 5;

/// OAuth client registration (`credentials.json`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("parse {}", path.display()))
    }

    /// Parse the downloaded client JSON (`installed` or `web` section).
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_slice(bytes).context("parse OAuth client JSON")?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow!("client JSON has neither an 'installed' nor a 'web' section"))
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// Consent URL the operator opens once to authorize sending.
    pub fn consent_url(&self) -> Result<Url> {
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("response_type", "code"),
                ("scope", GMAIL_SEND_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .with_context(|| format!("invalid auth_uri {:?}", self.auth_uri))
    }
}

/// Stored token (`token.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("serialize token")?;
        fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// True when the token is expired or within the refresh margin of expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Duration::minutes(EXPIRY_MARGIN_MINUTES),
            // No expiration info; assume still valid.
            None => false,
        }
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response
                .expires_in
                .map(|seconds| now + Duration::seconds(seconds)),
            token_type: response.token_type.unwrap_or_else(default_token_type),
            scopes: response
                .scope
                .map(|scope| scope.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Accept either a bare authorization code or the full redirected URL.
pub fn extract_authorization_code(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("no authorization code provided"));
    }
    if trimmed.contains("://") {
        let url = Url::parse(trimmed).context("parse redirected URL")?;
        if let Some((_, error)) = url.query_pairs().find(|(key, _)| key == "error") {
            return Err(anyhow!("authorization was denied: {error}"));
        }
        return url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| anyhow!("redirected URL has no 'code' parameter"));
    }
    Ok(trimmed.to_string())
}

/// Exchange an authorization code for a stored token.
pub fn exchange_code(
    agent: &ureq::Agent,
    secrets: &ClientSecrets,
    code: &str,
) -> Result<StoredToken> {
    tracing::debug!(token_uri = %secrets.token_uri, "exchanging authorization code");
    let response: TokenResponse = agent
        .post(&secrets.token_uri)
        .send_form([
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", secrets.redirect_uri()),
        ])
        .context("token exchange request failed")?
        .body_mut()
        .read_json()
        .context("read token exchange response")?;
    let token = StoredToken::from_response(response, None);
    if token.refresh_token.is_none() {
        return Err(anyhow!(
            "token response has no refresh token; revoke the app's access and authorize again"
        ));
    }
    Ok(token)
}

/// Refresh `token` using its refresh token.
pub fn refresh(
    agent: &ureq::Agent,
    secrets: &ClientSecrets,
    token: &StoredToken,
) -> Result<StoredToken> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or_else(|| anyhow!("stored token cannot be refreshed (no refresh token)"))?;
    tracing::debug!(token_uri = %secrets.token_uri, "refreshing OAuth token");
    let response: TokenResponse = agent
        .post(&secrets.token_uri)
        .send_form([
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ])
        .context("token refresh request failed")?
        .body_mut()
        .read_json()
        .context("read token refresh response")?;
    Ok(StoredToken::from_response(
        response,
        token.refresh_token.clone(),
    ))
}
