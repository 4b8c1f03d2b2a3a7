//! 1Password CLI client
//!
//! Every lookup makes sure a session exists first, then runs
//! `op item get ... --format json`. A failed lookup is treated as a possibly
//! expired session: the client signs in again and retries the identical
//! command exactly once.
//!
//! A `Client` is meant to have a single owner. Operations that may change
//! the session take `&mut self`.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{OpError, Result};
use crate::item::Item;
use crate::selector::{Criteria, Selector};
use crate::session::{Session, WhoAmI};
use crate::settings::ClientSettings;
use crate::shell::{CommandError, CommandLine, CommandOutput, CommandRunner, ShellRunner};

pub struct Client<R = ShellRunner> {
    program: String,
    session: Session,
    runner: R,
}

impl Client<ShellRunner> {
    /// Create a client that runs the real `op` binary
    pub fn new(settings: ClientSettings) -> Result<Self> {
        Self::with_runner(settings, ShellRunner::new())
    }
}

impl<R: CommandRunner> Client<R> {
    /// Create a client on top of `runner`.
    ///
    /// Fails with [`OpError::ToolNotFound`] when `op --version` does not
    /// succeed.
    pub fn with_runner(settings: ClientSettings, runner: R) -> Result<Self> {
        let client = Self {
            program: settings.program,
            session: Session::new(settings.account, settings.vault),
            runner,
        };
        client.probe()?;
        Ok(client)
    }

    pub fn account(&self) -> &str {
        self.session.account()
    }

    pub fn vault(&self) -> &str {
        self.session.vault()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Token from the last sign-in, if any
    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Name of the environment variable carrying the session token
    pub fn session_var(&self) -> String {
        self.session.env_var()
    }

    fn command(&self) -> CommandLine {
        CommandLine::new(self.program.as_str())
    }

    fn probe(&self) -> Result<()> {
        let command = self.command().arg("--version");
        let output = self
            .runner
            .run(&command, &HashMap::new())
            .map_err(|source| OpError::ToolNotFound {
                program: self.program.clone(),
                source,
            })?;

        tracing::debug!(version = output.stdout.trim(), "Found 1Password CLI");
        Ok(())
    }

    fn run(&self, command: &CommandLine) -> std::result::Result<CommandOutput, CommandError> {
        tracing::debug!(
            command = %command,
            session = self.session.is_authenticated(),
            "Running 1Password CLI"
        );
        self.runner.run(command, &self.session.env())
    }

    /// Identity reported by `op whoami`, or `None` when not signed in
    pub fn identity(&self) -> Option<WhoAmI> {
        let command = self
            .command()
            .args(["whoami", "--format", "json", "--account", self.account()]);

        match self.run(&command) {
            Ok(output) => WhoAmI::parse(&output.stdout),
            Err(e) => {
                tracing::debug!(status = ?e.status, "whoami failed");
                None
            }
        }
    }

    /// Whether `op` reports a usable session. Never fails.
    pub fn whoami(&self) -> bool {
        let signed_in = self.identity().is_some();
        tracing::debug!(account = self.account(), signed_in, "Checked 1Password session");
        signed_in
    }

    /// Run `op signin` and keep the token it prints.
    ///
    /// On success the token is also exported into this process's
    /// environment under [`Client::session_var`], so later `op` invocations
    /// made outside this client share the session. A sign-in that prints no
    /// token (desktop-app integration) removes any previously exported one.
    pub fn signin(&mut self) -> Result<bool> {
        let command = self
            .command()
            .args(["signin", "--account", self.account(), "--raw"])
            .interactive();

        tracing::debug!(command = %command, "Signing in to 1Password");
        let output = self
            .runner
            .run(&command, &HashMap::new())
            .map_err(|source| OpError::SigninFailed {
                account: self.account().to_string(),
                source,
            })?;

        self.session.set_token(output.stdout.trim_end());

        match self.session.token() {
            Some(token) => std::env::set_var(self.session.env_var(), token),
            None => std::env::remove_var(self.session.env_var()),
        }

        tracing::info!(
            account = self.account(),
            token = self.session.is_authenticated(),
            "Signed in to 1Password"
        );
        Ok(true)
    }

    fn ensure_signed_in(&mut self) -> Result<()> {
        if !self.whoami() {
            self.signin()?;
        }
        Ok(())
    }

    /// Full `op item get` command for a selector.
    /// `vault` overrides the client's vault for title lookups.
    pub fn item_get_command(&self, selector: &Selector, vault: Option<&str>) -> CommandLine {
        let vault = vault.unwrap_or(self.vault());
        self.command()
            .args(selector.item_get_args(vault))
            .args(["--format", "json", "--account", self.account()])
    }

    /// Fetch one item.
    ///
    /// When both the lookup and its retry fail, the first attempt's
    /// [`CommandError`] is returned.
    pub fn get(&mut self, criteria: &Criteria) -> Result<Item> {
        self.ensure_signed_in()?;

        let selector = Selector::parse(criteria)?;
        let command = self.item_get_command(&selector, criteria.vault.as_deref());
        tracing::debug!(selector = %selector, "Fetching item");

        let output = match self.run(&command) {
            Ok(output) => output,
            Err(first) => {
                tracing::warn!(
                    command = %command,
                    status = ?first.status,
                    "Item lookup failed, signing in again and retrying once"
                );
                self.signin()?;
                self.run(&command).map_err(|retry| {
                    tracing::debug!(status = ?retry.status, "Retried lookup failed");
                    first
                })?
            }
        };

        decode_item(&command, &output.stdout)
    }
}

fn decode_item(command: &CommandLine, stdout: &str) -> Result<Item> {
    let document: Value = serde_json::from_str(stdout)
        .map_err(|e| OpError::invalid_response(command.to_string(), e))?;

    match document {
        Value::Object(record) => Ok(Item::new(record)),
        _ => Err(OpError::invalid_response(
            command.to_string(),
            "expected a JSON object",
        )),
    }
}

impl<R> std::fmt::Debug for Client<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("program", &self.program)
            .field("session", &self.session)
            .finish()
    }
}
