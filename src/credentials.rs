//! X.509 proxy and CA directory resolution.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::ClientError;

/// Environment variable overriding the proxy location.
pub const PROXY_ENV: &str = "X509_USER_PROXY";
/// Environment variable overriding the CA certificate directory.
pub const CERT_DIR_ENV: &str = "X509_CERT_DIR";
pub const DEFAULT_CERT_DIR: &str = "/etc/grid-security/certificates";

/// Conventional proxy location written by `voms-proxy-init`.
pub fn default_proxy_path() -> PathBuf {
    PathBuf::from(format!("/tmp/x509up_u{}", current_uid()))
}

fn proxy_from_env() -> Option<PathBuf> {
    std::env::var_os(PROXY_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(unix)]
fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

#[cfg(not(unix))]
fn current_uid() -> u32 {
    0
}

/// Client certificate material for mutual-TLS calls made through curl.
///
/// The proxy file holds both the certificate chain and the private key, so
/// it is passed as `--cert` and `--key` alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub proxy: PathBuf,
    pub cert_dir: PathBuf,
}

impl Credentials {
    /// Pick the proxy: explicit argument, then config, then
    /// `X509_USER_PROXY`, then the per-UID default. The file is not checked.
    ///
    /// The CA directory is taken from `config` as is; `X509_CERT_DIR` only
    /// applies through [`Config::load`] or [`Config::apply_env`].
    pub fn resolve(explicit: Option<&Path>, config: &Config) -> Self {
        let proxy = explicit
            .map(Path::to_path_buf)
            .or_else(|| config.proxy.clone())
            .or_else(proxy_from_env)
            .unwrap_or_else(default_proxy_path);

        Self {
            proxy,
            cert_dir: config.cert_dir.clone(),
        }
    }

    /// Like [`Credentials::resolve`], but fails when the proxy file is absent.
    pub fn locate(explicit: Option<&Path>, config: &Config) -> Result<Self, ClientError> {
        let credentials = Self::resolve(explicit, config);
        if !credentials.proxy.is_file() {
            return Err(ClientError::ProxyNotFound(credentials.proxy));
        }
        Ok(credentials)
    }

    /// Authentication arguments shared by every curl invocation.
    pub fn curl_args(&self) -> Vec<String> {
        let proxy = self.proxy.to_string_lossy().into_owned();
        vec![
            "-sS".to_string(),
            "--capath".to_string(),
            self.cert_dir.to_string_lossy().into_owned(),
            "--cert".to_string(),
            proxy.clone(),
            "--key".to_string(),
            proxy,
        ]
    }
}
