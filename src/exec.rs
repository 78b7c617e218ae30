//! External command execution.
//!
//! Every remote interaction in this crate goes through an external tool
//! (`curl`, `dasgoclient`, a status command). The [`CommandRunner`] trait is
//! the single seam through which those processes are spawned, so callers can
//! substitute a [`ScriptedRunner`] in tests.

use std::fmt;
use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::ClientError;

/// A program and its arguments, executed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render the command as a shell-quoted line, suitable for diagnostics
    /// and for pasting into a terminal.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code as shown in diagnostics.
    pub fn exit_code_display(&self) -> String {
        match self.exit_code {
            Some(code) => code.to_string(),
            None => "killed by signal".to_string(),
        }
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run the command, blocking until it exits.
    ///
    /// A nonzero exit is reported through [`CommandOutput::exit_code`]; only
    /// a failure to start the process is an `Err`.
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput, ClientError>;
}

/// Spawns real processes with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput, ClientError> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|source| ClientError::Spawn {
                command: command.command_line(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }
}

/// Runner that answers from a script of canned responses.
///
/// Responses are matched by program name and, optionally, by a fragment of
/// the rendered command line. The first match wins and responses are not
/// consumed, so one entry can answer repeated calls. Every call is recorded.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    responses: Arc<Mutex<Vec<ScriptedResponse>>>,
    history: Arc<Mutex<Vec<ExternalCommand>>>,
}

#[derive(Clone)]
struct ScriptedResponse {
    program: String,
    fragment: Option<String>,
    outcome: Outcome,
}

#[derive(Clone)]
enum Outcome {
    Exited(CommandOutput),
    SpawnFailure(String),
}

/// Builder for one scripted response, see [`ScriptedRunner::expect`].
pub struct ResponseBuilder {
    runner: ScriptedRunner,
    response: ScriptedResponse,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start scripting a response for `program`. The default response is a
    /// successful exit with empty output.
    pub fn expect(&self, program: &str) -> ResponseBuilder {
        ResponseBuilder {
            runner: self.clone(),
            response: ScriptedResponse {
                program: program.to_string(),
                fragment: None,
                outcome: Outcome::Exited(CommandOutput {
                    exit_code: Some(0),
                    ..CommandOutput::default()
                }),
            },
        }
    }

    /// Commands run so far, in call order.
    pub fn calls(&self) -> Vec<ExternalCommand> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput, ClientError> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        let line = command.command_line();
        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        let matched = responses.iter().find(|r| {
            r.program == command.program
                && r.fragment.as_deref().map_or(true, |f| line.contains(f))
        });

        match matched.map(|r| &r.outcome) {
            Some(Outcome::Exited(output)) => Ok(output.clone()),
            Some(Outcome::SpawnFailure(reason)) => Err(ClientError::Spawn {
                command: line,
                source: io::Error::new(io::ErrorKind::NotFound, reason.clone()),
            }),
            None => Err(ClientError::Spawn {
                command: line,
                source: io::Error::new(io::ErrorKind::NotFound, "no scripted response"),
            }),
        }
    }
}

impl ResponseBuilder {
    /// Only answer commands whose rendered line contains `fragment`.
    pub fn matching(mut self, fragment: &str) -> Self {
        self.response.fragment = Some(fragment.to_string());
        self
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        if let Outcome::Exited(output) = &mut self.response.outcome {
            output.stdout = stdout.to_string();
        }
        self
    }

    pub fn stderr(mut self, stderr: &str) -> Self {
        if let Outcome::Exited(output) = &mut self.response.outcome {
            output.stderr = stderr.to_string();
        }
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        if let Outcome::Exited(output) = &mut self.response.outcome {
            output.exit_code = Some(code);
        }
        self
    }

    /// Make the command fail before it starts, as a missing binary would.
    pub fn fails_to_spawn(mut self) -> Self {
        self.response.outcome = Outcome::SpawnFailure("program not found".to_string());
        self
    }

    pub fn finish(self) {
        self.runner
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_arguments() {
        let cmd = ExternalCommand::new("dasgoclient")
            .arg("--query")
            .arg("file dataset=/A/B/C instance=prod/phys03")
            .arg("--json");
        assert_eq!(
            cmd.command_line(),
            "dasgoclient --query 'file dataset=/A/B/C instance=prod/phys03' --json"
        );
    }

    #[test]
    fn test_system_runner_captures_stdout() {
        let cmd = ExternalCommand::new("echo").arg("test output");
        let output = SystemRunner.run(&cmd).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "test output");
    }

    #[test]
    fn test_system_runner_reports_nonzero_exit() {
        let cmd = ExternalCommand::new("sh").args(["-c", "echo oops >&2; exit 3"]);
        let output = SystemRunner.run(&cmd).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let cmd = ExternalCommand::new("definitely-not-a-real-binary-4242");
        let err = SystemRunner.run(&cmd).unwrap_err();
        assert!(matches!(err, ClientError::Spawn { .. }));
        assert!(err.to_string().contains("definitely-not-a-real-binary-4242"));
    }

    #[test]
    fn test_scripted_runner_matches_fragment() {
        let runner = ScriptedRunner::new();
        runner.expect("tool").matching("alpha").stdout("A").finish();
        runner.expect("tool").stdout("fallback").finish();

        let a = runner
            .run(&ExternalCommand::new("tool").arg("alpha"))
            .unwrap();
        let b = runner.run(&ExternalCommand::new("tool").arg("beta")).unwrap();

        assert_eq!(a.stdout, "A");
        assert_eq!(b.stdout, "fallback");
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_scripted_runner_without_response_fails_to_spawn() {
        let runner = ScriptedRunner::new();
        let err = runner.run(&ExternalCommand::new("curl")).unwrap_err();
        assert!(matches!(err, ClientError::Spawn { .. }));
    }

    #[test]
    fn test_exit_code_display_for_signal() {
        let output = CommandOutput::default();
        assert_eq!(output.exit_code_display(), "killed by signal");
    }
}
