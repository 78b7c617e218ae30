//! Task status queries and tabular result access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::diagnostics;
use crate::errors::ClientError;
use crate::exec::{CommandRunner, ExternalCommand};
use crate::logging::Logging;

/// Key under which a status query reports a (non-fatal) failure.
pub const FAILURE_MSG_KEY: &str = "statusFailureMsg";

/// Result of a status query: a JSON object with a `statusFailureMsg` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusInfo(Map<String, Value>);

impl StatusInfo {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ClientError::Client(format!(
                "Status information must be a JSON object, got: {}",
                other
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The embedded failure message, if any.
    ///
    /// Null, `false` and empty strings count as no failure.
    pub fn failure_message(&self) -> Option<String> {
        match self.0.get(FAILURE_MSG_KEY)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Something that can report a task's status.
pub trait StatusProvider {
    fn query_status(&self) -> Result<StatusInfo, ClientError>;
}

impl<F> StatusProvider for F
where
    F: Fn() -> Result<StatusInfo, ClientError>,
{
    fn query_status(&self) -> Result<StatusInfo, ClientError> {
        self()
    }
}

/// Runs an external status command and reads its JSON output.
pub struct CommandStatusProvider<'a> {
    runner: &'a dyn CommandRunner,
    command: ExternalCommand,
}

impl<'a> CommandStatusProvider<'a> {
    pub fn new(runner: &'a dyn CommandRunner, command: ExternalCommand) -> Self {
        Self { runner, command }
    }
}

impl StatusProvider for CommandStatusProvider<'_> {
    fn query_status(&self) -> Result<StatusInfo, ClientError> {
        let line = self.command.command_line();
        let output = self.runner.run(&self.command)?;

        if !output.success() || output.stdout.trim().is_empty() {
            return Err(ClientError::Client(diagnostics::command_failed(
                &line,
                &output.exit_code_display(),
                &output.stdout,
                &output.stderr,
            )));
        }

        let value: Value = serde_json::from_str(&output.stdout).map_err(|e| {
            ClientError::Client(diagnostics::unexpected_output(
                &line,
                &e.to_string(),
                &output.stdout,
            ))
        })?;
        StatusInfo::from_value(value)
    }
}

/// Query status with the console muted, then report any embedded failure.
///
/// The console level is restored before this returns, whether or not the
/// provider succeeded. A non-empty `statusFailureMsg` is logged at error
/// level and the status is still returned unmodified.
pub fn muted_status_info(
    provider: &dyn StatusProvider,
    logging: &Logging,
) -> Result<StatusInfo, ClientError> {
    let status = {
        let _muted = logging.mute();
        provider.query_status()?
    };

    if let Some(msg) = status.failure_message() {
        error!("Error while getting status information. Got:\n{} ", msg);
    }

    Ok(status)
}

/// Value of `column` in a tabular server result.
///
/// The result carries column names under `desc.columns` and positional
/// values under `result`. The string `"None"` is returned as `None`.
///
/// # Errors
///
/// `ColumnNotFound` when `column` is not among the column names, `Client`
/// when the result does not have the tabular shape.
pub fn get_column(result: &Value, column: &str) -> Result<Option<Value>, ClientError> {
    let columns = result
        .pointer("/desc/columns")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::Client("Result has no 'desc.columns' list".to_string()))?;

    let index = columns
        .iter()
        .position(|name| name.as_str() == Some(column))
        .ok_or_else(|| ClientError::ColumnNotFound(column.to_string()))?;

    let values = result
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::Client("Result has no 'result' list".to_string()))?;

    match values.get(index) {
        Some(Value::String(s)) if s == "None" => Ok(None),
        Some(value) => Ok(Some(value.clone())),
        None => Err(ClientError::Client(format!(
            "Result has no value for column '{}' at position {}",
            column, index
        ))),
    }
}
