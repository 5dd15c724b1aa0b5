//! Workflow init step.
//!
//! Init creates the workspace directories and a validated `config.json`.
use crate::cli::{GlobalArgs, InitArgs, TransportKind};
use crate::config::{default_config, validate_config, write_config, TransportConfig};
use anyhow::{anyhow, Context, Result};
use std::fs;

/// Run the init step.
pub fn run_init(global: &GlobalArgs, args: &InitArgs) -> Result<()> {
    let paths = super::workspace_paths(global)?;
    let config_path = paths.config_path();
    if config_path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }

    let transport = match args.transport {
        TransportKind::Gmail => TransportConfig::gmail(),
        TransportKind::Outbox => TransportConfig::outbox(),
    };
    let recipients = args
        .recipients
        .iter()
        .map(|recipient| recipient.trim().to_string())
        .collect();
    let config = default_config(args.sender.trim().to_string(), recipients, transport);
    validate_config(&config)?;

    let mut dirs = vec![config.input_dir(&paths), config.output_dir(&paths)];
    if let TransportConfig::Outbox { dir } = &config.transport {
        dirs.push(paths.resolve(dir));
    }
    for dir in &dirs {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    write_config(&paths, &config)?;
    println!("wrote {}", config_path.display());

    if matches!(config.transport, TransportConfig::Gmail { .. })
        && !paths.credentials_path().is_file()
    {
        println!(
            "next: save the OAuth client JSON as {} and run `rsmith authorize`",
            paths.credentials_path().display()
        );
    }
    Ok(())
}
