use serde::{Deserialize, Serialize};

/// Connection settings for a [`crate::Client`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Account shorthand, sign-in address or account UUID
    pub account: String,

    /// Vault used for title lookups unless overridden per call
    pub vault: String,

    /// Name or path of the 1Password CLI binary
    #[serde(default = "default_program")]
    pub program: String,
}

fn default_program() -> String {
    "op".to_string()
}

impl ClientSettings {
    pub fn new(account: impl Into<String>, vault: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            vault: vault.into(),
            program: default_program(),
        }
    }

    /// Use a different `op` binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}
