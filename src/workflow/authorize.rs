//! Workflow authorize step: one-time OAuth consent for the Gmail transport.
use crate::cli::{AuthorizeArgs, GlobalArgs};
use crate::config::TransportConfig;
use crate::transport::http_agent;
use crate::transport::oauth::{exchange_code, extract_authorization_code, ClientSecrets};
use anyhow::{anyhow, Context, Result};
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub fn run_authorize(global: &GlobalArgs, args: &AuthorizeArgs) -> Result<()> {
    let paths = super::workspace_paths(global)?;
    let config = super::load_valid_config(&paths)?;
    let TransportConfig::Gmail {
        http_timeout_seconds,
    } = config.transport
    else {
        return Err(anyhow!(
            "authorize only applies to the gmail transport (config uses {})",
            config.transport.kind()
        ));
    };

    let credentials_path = paths.credentials_path();
    if !credentials_path.is_file() {
        return Err(anyhow!(
            "missing OAuth client credentials: save the desktop client JSON as {}",
            credentials_path.display()
        ));
    }
    let secrets = ClientSecrets::load(&credentials_path)?;

    let input = match args.code.as_deref() {
        Some(code) => code.to_string(),
        None => prompt_for_code(&secrets)?,
    };
    let code = extract_authorization_code(&input)?;

    let agent = http_agent(Duration::from_secs(http_timeout_seconds));
    let token = exchange_code(&agent, &secrets, &code)?;
    let token_path = paths.token_path();
    token.save(&token_path)?;
    println!("wrote {}", token_path.display());
    Ok(())
}

fn prompt_for_code(secrets: &ClientSecrets) -> Result<String> {
    let url = secrets.consent_url()?;
    println!("Open this URL in a browser and grant access:\n\n  {url}\n");
    print!("Paste the authorization code or the redirected URL: ");
    io::stdout().flush().context("flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read authorization code")?;
    Ok(line)
}
