mod cli;
mod cmd;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use cli::{Cli, Commands};
use crab_utils::config::{global_config_path, Config};
use crab_utils::exec::SystemRunner;
use crab_utils::logging::Logging;

fn main() {
    if let Err(err) = run() {
        eprintln!("{} {:#}", "Error:".red(), err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // These work without a readable config
    match &cli.command {
        Commands::Version => return cmd::util::cmd_version(cli.verbose),
        Commands::Man { out_dir } => return cmd::util::cmd_man(out_dir.as_deref()),
        Commands::Completion { shell } => return cmd::util::cmd_completion(*shell),
        _ => {}
    }

    let config_path: Option<PathBuf> = cli.config.clone().or_else(global_config_path);
    let config = Config::load_layered(config_path.as_deref())?;

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else if cli.quiet {
        LevelFilter::ERROR
    } else {
        config.console_level_filter()?
    };
    let logging = Logging::new(level);
    logging.install(cli.log_file.as_deref().or(config.log_file.as_deref()))?;

    let runner = SystemRunner;
    match cli.command {
        Commands::Whoami { proxy } => cmd::query::cmd_whoami(&runner, &config, proxy.as_deref()),
        Commands::Fetch { url, output, proxy } => cmd::query::cmd_fetch(
            &runner,
            &config,
            &url,
            output.as_deref(),
            proxy.as_deref(),
        ),
        Commands::Lumis {
            dataset,
            instance,
            pairs,
        } => cmd::query::cmd_lumis(&runner, &config, &dataset, instance.as_deref(), pairs),
        Commands::Status { command } => cmd::status::cmd_status(&runner, &logging, &command),
        Commands::Column { file, name } => cmd::status::cmd_column(&file, &name),
        Commands::Config => cmd::config::cmd_config(&config, config_path.as_deref()),
        Commands::Template => cmd::config::cmd_template(),
        Commands::Version | Commands::Man { .. } | Commands::Completion { .. } => Ok(()),
    }
}
