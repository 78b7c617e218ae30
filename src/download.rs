//! Authenticated file download with curl.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::diagnostics;
use crate::errors::ClientError;
use crate::exec::{CommandOutput, CommandRunner, ExternalCommand};

/// Status reported when curl itself failed, so no HTTP exchange happened.
pub const COMMAND_FAILED_STATUS: u16 = 503;

/// Derive a local file name from the last path segment of `url`.
pub fn destination_from_url(url: &str) -> Result<PathBuf, ClientError> {
    let parsed = Url::parse(url)
        .map_err(|e| ClientError::Client(format!("Invalid URL '{}': {}", url, e)))?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            ClientError::Client(format!(
                "Cannot derive a file name from URL '{}'; pass a destination",
                url
            ))
        })
}

pub struct Downloader<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
}

impl<'a> Downloader<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    pub fn download_command(
        &self,
        url: &str,
        destination: &Path,
        credentials: &Credentials,
    ) -> ExternalCommand {
        ExternalCommand::new(&self.config.curl)
            .args(credentials.curl_args())
            .arg("-o")
            .arg(destination.to_string_lossy())
            .arg("-w")
            .arg("%{http_code}")
            .arg(url)
    }

    /// Download `url` into `destination` (default: the URL's file name).
    ///
    /// Returns the HTTP status code, or [`COMMAND_FAILED_STATUS`] if curl
    /// could not run or exited nonzero. On anything but 200 the destination
    /// file is removed; for HTTP errors its body is logged first.
    pub fn fetch_file(
        &self,
        url: &str,
        destination: Option<&Path>,
        proxy: Option<&Path>,
    ) -> Result<u16, ClientError> {
        let destination = match destination {
            Some(path) => path.to_path_buf(),
            None => destination_from_url(url)?,
        };
        let credentials = Credentials::resolve(proxy, self.config);
        let command = self.download_command(url, &destination, &credentials);
        debug!("Will execute:\n{}", command);

        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(err) => {
                debug!("{}", err);
                remove_if_exists(&destination)?;
                return Ok(COMMAND_FAILED_STATUS);
            }
        };

        let mut error_details = String::new();
        let status = if output.success() {
            let status = match parse_http_code(&command, &output) {
                Ok(status) => status,
                Err(err) => {
                    remove_if_exists(&destination)?;
                    return Err(err);
                }
            };
            if status != 200 {
                error_details = read_lossy(&destination)?;
                remove_if_exists(&destination)?;
            }
            status
        } else {
            remove_if_exists(&destination)?;
            COMMAND_FAILED_STATUS
        };

        debug!(
            "exitcode: {}\nstdout: {}\nstderr: {}\nerror details: {}",
            output.exit_code_display(),
            output.stdout,
            output.stderr,
            error_details
        );

        Ok(status)
    }
}

fn parse_http_code(command: &ExternalCommand, output: &CommandOutput) -> Result<u16, ClientError> {
    output.stdout.trim().parse::<u16>().map_err(|_| {
        ClientError::Client(diagnostics::unexpected_output(
            &command.command_line(),
            "expected an HTTP status code",
            &output.stdout,
        ))
    })
}

fn read_lossy(path: &Path) -> Result<String, ClientError> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_exists(path: &Path) -> Result<(), ClientError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
