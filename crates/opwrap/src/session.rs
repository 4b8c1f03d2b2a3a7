//! Session state shared with `op` through the environment

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Prefix of the variables `op` reads session tokens from
pub const SESSION_VAR_PREFIX: &str = "OP_SESSION_";

/// Account, vault and the token of the last successful sign-in.
/// Lives only as long as the client that owns it.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    account: String,
    vault: String,
    token: Option<String>,
}

impl Session {
    pub fn new(account: impl Into<String>, vault: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            vault: vault.into(),
            token: None,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn vault(&self) -> &str {
        &self.vault
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store a token; an empty token clears it
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
    }

    /// `OP_SESSION_<shorthand>`, where the shorthand is the account up to
    /// its first dot: `my-team.1password.com` uses `OP_SESSION_my-team`.
    pub fn env_var(&self) -> String {
        let shorthand = self.account.split('.').next().unwrap_or_default();
        format!("{}{}", SESSION_VAR_PREFIX, shorthand)
    }

    /// Per-invocation environment; empty without a token
    pub fn env(&self) -> HashMap<String, String> {
        self.token
            .iter()
            .map(|token| (self.env_var(), token.clone()))
            .collect()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("vault", &self.vault)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Identity reported by `op whoami --format json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmI {
    pub user_uuid: String,
    pub account_uuid: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
}

impl WhoAmI {
    /// Parse a whoami response, requiring both identity fields to be set
    pub fn parse(stdout: &str) -> Option<Self> {
        let identity: WhoAmI = serde_json::from_str(stdout.trim()).ok()?;
        if identity.user_uuid.is_empty() || identity.account_uuid.is_empty() {
            return None;
        }
        Some(identity)
    }
}
