//! Show the effective configuration and a task configuration template.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crab_utils::config::Config;
use crab_utils::credentials::Credentials;
use crab_utils::task_config::crab_config;

/// Print the effective settings as YAML, followed by the proxy in use
pub fn cmd_config(config: &Config, source: Option<&Path>) -> Result<()> {
    match source {
        Some(path) if path.exists() => {
            println!("{} {}", "# Loaded from".dimmed(), path.display())
        }
        _ => println!("{}", "# No config file, using defaults".dimmed()),
    }
    print!("{}", serde_yaml::to_string(config)?);

    let credentials = Credentials::resolve(None, config);
    let marker = if credentials.proxy.is_file() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!(
        "{} {} proxy: {}",
        "#".dimmed(),
        marker,
        credentials.proxy.display()
    );
    Ok(())
}

/// Print an empty CRAB task configuration
pub fn cmd_template() -> Result<()> {
    print!("{}", crab_config().to_yaml()?);
    Ok(())
}
