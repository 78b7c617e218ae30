//! Commands that query grid services: whoami, fetch and lumis.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use crab_utils::config::Config;
use crab_utils::das::DasClient;
use crab_utils::download::{destination_from_url, Downloader};
use crab_utils::exec::CommandRunner;
use crab_utils::identity::Cric;

pub fn cmd_whoami(
    runner: &dyn CommandRunner,
    config: &Config,
    proxy: Option<&Path>,
) -> Result<()> {
    let username = Cric::new(runner, config).get_username(proxy)?;
    println!("{}", username);
    Ok(())
}

pub fn cmd_fetch(
    runner: &dyn CommandRunner,
    config: &Config,
    url: &str,
    output: Option<&Path>,
    proxy: Option<&Path>,
) -> Result<()> {
    let destination = match output {
        Some(path) => path.to_path_buf(),
        None => destination_from_url(url)?,
    };

    let status = Downloader::new(runner, config).fetch_file(url, Some(&destination), proxy)?;
    if status != 200 {
        bail!("Download of {} failed with HTTP status {}", url, status);
    }

    println!("{} {}", "✓".green(), destination.display());
    Ok(())
}

pub fn cmd_lumis(
    runner: &dyn CommandRunner,
    config: &Config,
    dataset: &str,
    instance: Option<&str>,
    pairs: bool,
) -> Result<()> {
    let mut das = DasClient::new(runner, config);
    if let Some(instance) = instance {
        das = das.with_instance(instance);
    }

    if pairs {
        print!("{}", format_pairs(&das.valid_run_lumi_pairs(dataset)?));
    } else {
        println!("{}", das.lumi_list_in_valid_files(dataset)?.to_json());
    }
    Ok(())
}

fn format_pairs(pairs: &[(u32, u32)]) -> String {
    pairs
        .iter()
        .map(|(run, lumi)| format!("{} {}\n", run, lumi))
        .collect()
}
