//! Scripted command runner for client tests
//!
//! Responses are matched against the rendered command text, either exactly
//! or by regex. Every call is recorded with the environment it was given.

#![allow(dead_code)]

use std::collections::HashMap;

use opwrap::{CommandError, CommandLine, CommandOutput, CommandRunner};
use parking_lot::Mutex;
use regex::Regex;

/// How a scripted response selects commands
pub enum Pattern {
    Exact(String),
    Regex(Regex),
}

impl Pattern {
    pub fn regex(pattern: &str) -> Self {
        Pattern::Regex(Regex::new(pattern).expect("valid test regex"))
    }

    fn matches(&self, command: &str) -> bool {
        match self {
            Pattern::Exact(expected) => expected == command,
            Pattern::Regex(re) => re.is_match(command),
        }
    }
}

impl From<&str> for Pattern {
    fn from(command: &str) -> Self {
        Pattern::Exact(command.to_string())
    }
}

struct Response {
    pattern: Pattern,
    stdout: String,
    status: i32,
    /// `None` means the response never runs out
    remaining: Option<usize>,
}

/// A recorded invocation
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub command: String,
    pub tokens: Vec<String>,
    pub env: HashMap<String, String>,
    pub interactive: bool,
}

/// Command runner answering from a script.
/// Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    responses: Mutex<Vec<Response>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every matching command
    pub fn define(&self, pattern: impl Into<Pattern>, stdout: &str, status: i32) -> &Self {
        self.push(pattern.into(), stdout, status, None)
    }

    /// Answer the next matching command only
    pub fn define_once(&self, pattern: impl Into<Pattern>, stdout: &str, status: i32) -> &Self {
        self.push(pattern.into(), stdout, status, Some(1))
    }

    fn push(&self, pattern: Pattern, stdout: &str, status: i32, remaining: Option<usize>) -> &Self {
        self.responses.lock().push(Response {
            pattern,
            stdout: stdout.to_string(),
            status,
            remaining,
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.command).collect()
    }

    /// First recorded call whose command text matches
    pub fn find_call(&self, pattern: impl Into<Pattern>) -> Option<RecordedCall> {
        let pattern = pattern.into();
        self.calls()
            .into_iter()
            .find(|call| pattern.matches(&call.command))
    }

    /// Number of recorded calls whose command text matches
    pub fn count(&self, pattern: impl Into<Pattern>) -> usize {
        let pattern = pattern.into();
        self.calls()
            .iter()
            .filter(|call| pattern.matches(&call.command))
            .count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        command: &CommandLine,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, CommandError> {
        let text = command.to_string();
        self.calls.lock().push(RecordedCall {
            command: text.clone(),
            tokens: command.tokens().into_iter().map(String::from).collect(),
            env: env.clone(),
            interactive: command.is_interactive(),
        });

        let mut responses = self.responses.lock();
        let response = responses
            .iter_mut()
            .find(|r| r.remaining != Some(0) && r.pattern.matches(&text));

        let Some(response) = response else {
            return Ok(CommandOutput {
                stdout: String::new(),
                status: 0,
            });
        };

        if let Some(remaining) = response.remaining.as_mut() {
            *remaining -= 1;
        }

        if response.status != 0 {
            return Err(CommandError::new(command, Some(response.status))
                .with_stdout(response.stdout.clone()));
        }

        Ok(CommandOutput {
            stdout: response.stdout.clone(),
            status: response.status,
        })
    }
}

/// Install a test subscriber so `RUST_LOG` works under `cargo test`
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("opwrap=debug")
        .with_test_writer()
        .try_init();
}
