//! Status query and tabular result inspection.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::path::Path;

use crab_utils::exec::{CommandRunner, ExternalCommand};
use crab_utils::logging::Logging;
use crab_utils::status::{get_column, muted_status_info, CommandStatusProvider};

pub fn cmd_status(
    runner: &dyn CommandRunner,
    logging: &Logging,
    command: &[String],
) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        bail!("No status command given");
    };

    let provider = CommandStatusProvider::new(runner, ExternalCommand::new(program).args(args));
    let status = muted_status_info(&provider, logging)?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub fn cmd_column(file: &Path, name: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let result: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", file.display()))?;

    match get_column(&result, name)? {
        Some(Value::String(s)) => println!("{}", s),
        Some(value) => println!("{}", value),
        None => println!("{}", "None".dimmed()),
    }
    Ok(())
}
