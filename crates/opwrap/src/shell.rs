//! Subprocess execution
//!
//! Commands are passed argv-style to the child process, never through a
//! shell, so arguments need no escaping. [`CommandLine`] renders itself with
//! double quotes around arguments containing whitespace for logs and errors.

use std::collections::HashMap;
use std::fmt;
use std::process::{Command, Stdio};

use thiserror::Error;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    interactive: bool,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            interactive: false,
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Let the child read from the terminal and write prompts to stderr.
    /// Standard output is still captured.
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Program followed by arguments, as a token list
    pub fn tokens(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.tokens().into_iter().map(quote).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

fn quote(token: &str) -> String {
    if token.is_empty() {
        return "\"\"".to_string();
    }
    if token.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", token.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

/// Captured result of a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub status: i32,
}

/// A command that exited non-zero or could not be started at all
#[derive(Debug, Clone, Error)]
#[error("Command failed with status {}: {}", status_label(.status), .command)]
pub struct CommandError {
    /// Rendered command text
    pub command: String,
    /// Exit status; `None` when the process never ran or was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}

impl CommandError {
    pub fn new(command: &CommandLine, status: Option<i32>) -> Self {
        Self {
            command: command.to_string(),
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Executes command lines on behalf of the client.
///
/// `env` holds extra variables for this invocation only; implementations
/// must not write them into the parent process environment.
pub trait CommandRunner {
    fn run(
        &self,
        command: &CommandLine,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(
        &self,
        command: &CommandLine,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, CommandError> {
        (**self).run(command, env)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(
        &self,
        command: &CommandLine,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, CommandError> {
        (**self).run(command, env)
    }
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        command: &CommandLine,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, CommandError> {
        let mut child = Command::new(command.program());
        child.args(command.arguments()).envs(env);

        if command.is_interactive() {
            child
                .stdin(Stdio::inherit())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit());
        }

        let output = child.output().map_err(|e| {
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                format!("'{}' not found in PATH", command.program())
            } else {
                format!("Failed to execute '{}': {}", command.program(), e)
            };
            CommandError::new(command, None).with_stderr(reason)
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CommandError::new(command, output.status.code())
                .with_stdout(stdout)
                .with_stderr(stderr));
        }

        Ok(CommandOutput {
            stdout,
            status: output.status.code().unwrap_or(0),
        })
    }
}
