//! Configuration for the client utilities.
//!
//! Values are layered, later overriding earlier:
//! 1. Built-in defaults
//! 2. Config file (`~/.config/crab-utils/config.yaml`, or `--config <path>`)
//! 3. Environment (`X509_USER_PROXY`, `X509_CERT_DIR`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

use crate::credentials::{CERT_DIR_ENV, DEFAULT_CERT_DIR, PROXY_ENV};
use crate::das::DEFAULT_DBS_INSTANCE;
use crate::identity::CRIC_WHOAMI_URL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory of trusted CA certificates passed to curl as `--capath`
    #[serde(default = "default_cert_dir")]
    pub cert_dir: PathBuf,
    /// X.509 proxy; when unset, `$X509_USER_PROXY` or `/tmp/x509up_u<uid>`
    #[serde(default)]
    pub proxy: Option<PathBuf>,
    #[serde(default = "default_cric_whoami_url")]
    pub cric_whoami_url: String,
    #[serde(default = "default_curl")]
    pub curl: String,
    #[serde(default = "default_das_client")]
    pub das_client: String,
    /// DBS instance queried through DAS, e.g. `phys03` or `global`
    #[serde(default = "default_dbs_instance")]
    pub dbs_instance: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Console verbosity: off/mute, error, warn, info, debug, trace
    #[serde(default = "default_console_level")]
    pub console_level: String,
}

fn default_cert_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CERT_DIR)
}

fn default_cric_whoami_url() -> String {
    CRIC_WHOAMI_URL.to_string()
}

fn default_curl() -> String {
    "curl".to_string()
}

fn default_das_client() -> String {
    "dasgoclient".to_string()
}

fn default_dbs_instance() -> String {
    DEFAULT_DBS_INSTANCE.to_string()
}

fn default_console_level() -> String {
    "info".to_string()
}

/// Built-in values only; the environment is not consulted. Use
/// [`Config::load`] or [`Config::apply_env`] for `X509_CERT_DIR` and
/// `X509_USER_PROXY` overrides.
impl Default for Config {
    fn default() -> Self {
        Self {
            cert_dir: default_cert_dir(),
            proxy: None,
            cric_whoami_url: default_cric_whoami_url(),
            curl: default_curl(),
            das_client: default_das_client(),
            dbs_instance: default_dbs_instance(),
            log_file: None,
            console_level: default_console_level(),
        }
    }
}

impl Config {
    /// Load the global config file (if present) and apply the environment.
    pub fn load() -> Result<Self> {
        Self::load_layered(global_config_path().as_deref())
    }

    /// Load `path` if it exists, fall back to defaults otherwise, then apply
    /// the environment.
    pub fn load_layered(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.filter(|p| p.exists()) {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Config =
            serde_yaml::from_str(content).context("Failed to parse config YAML")?;
        config.expand_paths();
        config.console_level_filter()?;
        Ok(config)
    }

    /// Override credential locations from the environment.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(proxy) = lookup(PROXY_ENV).filter(|v| !v.is_empty()) {
            self.proxy = Some(PathBuf::from(proxy));
        }
        if let Some(dir) = lookup(CERT_DIR_ENV).filter(|v| !v.is_empty()) {
            self.cert_dir = PathBuf::from(dir);
        }
    }

    pub fn console_level_filter(&self) -> Result<LevelFilter> {
        parse_level(&self.console_level)
    }

    fn expand_paths(&mut self) {
        self.cert_dir = expand_tilde(&self.cert_dir);
        self.proxy = self.proxy.as_deref().map(expand_tilde);
        self.log_file = self.log_file.as_deref().map(expand_tilde);
    }
}

/// Parse a console level name. `mute` is accepted as an alias for `off`.
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("mute") {
        return Ok(LevelFilter::OFF);
    }
    LevelFilter::from_str(name).with_context(|| format!("Invalid console level '{}'", name))
}

/// Path of the per-user config file.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crab-utils").join("config.yaml"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
