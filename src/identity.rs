//! Username resolution through the CRIC identity service.
//!
//! The proxy's DN is mapped to a CERN account by querying CRIC's `whoami`
//! preset over mutual TLS, with the proxy acting as client certificate.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error};

use crate::config::Config;
use crate::credentials::Credentials;
use crate::diagnostics;
use crate::errors::ClientError;
use crate::exec::{CommandRunner, ExternalCommand};

pub const CRIC_WHOAMI_URL: &str =
    "https://cms-cric.cern.ch/api/accounts/user/query/?json&preset=whoami";

/// Shape of the `whoami` response: `{"result": [{"login": "...", ...}]}`.
#[derive(Debug, Deserialize)]
struct WhoAmI {
    #[serde(default)]
    result: Vec<WhoAmIRecord>,
}

#[derive(Debug, Deserialize)]
struct WhoAmIRecord {
    #[serde(default)]
    login: Option<String>,
}

/// Extract the login from a `whoami` response body.
///
/// Returns an empty string when the record or its login is missing or null.
/// Spaces, newlines and double quotes are stripped from the value.
pub fn parse_whoami(body: &str) -> Result<String, serde_json::Error> {
    let response: WhoAmI = serde_json::from_str(body)?;
    let login = response
        .result
        .into_iter()
        .next()
        .and_then(|record| record.login)
        .unwrap_or_default();

    Ok(login
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '"'))
        .collect())
}

/// Client for the CRIC identity lookup.
pub struct Cric<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
}

impl<'a> Cric<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    pub fn whoami_command(&self, credentials: &Credentials) -> ExternalCommand {
        ExternalCommand::new(&self.config.curl)
            .args(credentials.curl_args())
            .arg(&self.config.cric_whoami_url)
    }

    /// Ask CRIC for the account mapped to the proxy's DN.
    ///
    /// # Errors
    ///
    /// `ProxyNotFound` if no proxy file exists; `Username` if curl fails or
    /// prints nothing, or if the response yields no login (empty or `null`).
    pub fn username_from_cric(&self, proxy: Option<&Path>) -> Result<String, ClientError> {
        let credentials = Credentials::locate(proxy, self.config)?;
        let command = self.whoami_command(&credentials);
        let line = command.command_line();

        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(err) => {
                return Err(ClientError::Username(diagnostics::cric_unreachable(
                    &line,
                    "",
                    &err.to_string(),
                )))
            }
        };

        if !output.success() || output.stdout.is_empty() {
            return Err(ClientError::Username(diagnostics::cric_unreachable(
                &line,
                &output.stdout,
                &output.stderr,
            )));
        }

        let parsed = match parse_whoami(&output.stdout) {
            Ok(login) if !login.is_empty() && login != "null" => return Ok(login),
            Ok(login) => login,
            Err(err) => format!("<unparsable response: {}>", err),
        };

        Err(ClientError::Username(diagnostics::cric_username_missing(
            &line,
            &output.stdout,
            &parsed,
        )))
    }

    /// Resolve the username, retrying once verbosely on failure.
    ///
    /// The first attempt only logs at debug level. If it fails, an error is
    /// logged and a second attempt runs whose full diagnostics go to the
    /// error log; its outcome is returned.
    pub fn get_username(&self, proxy: Option<&Path>) -> Result<String, ClientError> {
        debug!("Retrieving username ...");

        match self.attempt(proxy, true) {
            Ok(username) => {
                debug!("username is {}", username);
                Ok(username)
            }
            Err(_) => {
                error!(
                    "ERROR: CRIC could not resolve the DN in the user proxy into a user name\n \
                     Please find below details of failures for investigation:"
                );
                self.attempt(proxy, false)
            }
        }
    }

    fn attempt(&self, proxy: Option<&Path>, quiet: bool) -> Result<String, ClientError> {
        let result = self.username_from_cric(proxy);
        if let Err(err) = &result {
            if quiet {
                debug!("Username lookup failed: {}", err);
            } else {
                error!("{}", err);
            }
        }
        result
    }
}
