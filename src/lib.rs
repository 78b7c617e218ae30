//! # crab-utils - user utilities for the CRAB job-submission client
//!
//! Helpers used alongside CRAB when submitting and monitoring analysis jobs
//! on the grid. Every remote call goes through an external tool (`curl`,
//! `dasgoclient`) run via a [`exec::CommandRunner`].
//!
//! ## Modules
//!
//! - [`identity`] - Resolve the username mapped to an X.509 proxy via CRIC
//! - [`download`] - Fetch a URL with the proxy as client certificate
//! - [`das`] - Runs and lumis in the valid files of a dataset
//! - [`lumi_list`] - Compact run/lumi interval lists
//! - [`status`] - Muted status queries and tabular result access
//! - [`logging`] - Console level, logger registry and the tracing subscriber
//! - [`config`] - Layered configuration (defaults, file, environment)
//! - [`task_config`] - Skeleton of a CRAB task configuration
//!
//! ## Example
//!
//! ```no_run
//! use crab_utils::config::Config;
//! use crab_utils::das::DasClient;
//! use crab_utils::exec::SystemRunner;
//!
//! let config = Config::load().expect("Failed to load config");
//! let lumis = DasClient::new(&SystemRunner, &config)
//!     .lumi_list_in_valid_files("/Prim/Proc-v1/USER")
//!     .expect("DAS query failed");
//! println!("{}", lumis.to_json());
//! ```

pub mod config;
pub mod credentials;
pub mod das;
pub mod diagnostics;
pub mod download;
pub mod errors;
pub mod exec;
pub mod identity;
pub mod logging;
pub mod lumi_list;
pub mod status;
pub mod task_config;

pub use errors::ClientError;
pub use lumi_list::LumiList;
