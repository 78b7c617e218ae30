//! CLI argument definitions for crab-utils.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crab-utils")]
#[command(version)]
#[command(about = "User utilities for the CRAB job-submission client", long_about = None)]
pub struct Cli {
    /// Show debug output on the console
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors on the console
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read configuration from this file instead of the per-user one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write debug-level logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the CERN username mapped to your grid proxy
    Whoami {
        /// Proxy file (default: $X509_USER_PROXY or /tmp/x509up_u<uid>)
        #[arg(long, value_name = "PATH")]
        proxy: Option<PathBuf>,
    },
    /// Download a URL using your grid proxy as client certificate
    Fetch {
        url: String,
        /// Destination file (default: last path segment of the URL)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        proxy: Option<PathBuf>,
    },
    /// Print the runs and lumis in the valid files of a dataset
    Lumis {
        /// Dataset name as published in DBS
        dataset: String,
        /// DBS instance (default from config, usually phys03)
        #[arg(long)]
        instance: Option<String>,
        /// Print raw (run, lumi) pairs in query order instead of a lumi mask
        #[arg(long)]
        pairs: bool,
    },
    /// Run a status command with the console muted and print its JSON
    Status {
        /// Command printing the status JSON object, e.g. `crab status --json`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Print one column of a tabular server result stored as JSON
    Column {
        /// File holding the result (`desc.columns` and `result`)
        file: PathBuf,
        /// Column name
        name: String,
    },
    /// Show the effective configuration
    Config,
    /// Print an empty CRAB task configuration
    Template,
    /// Show version information (with -v: commit and build date)
    Version,
    /// Generate a man page
    Man {
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Generate shell completions
    Completion {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}
