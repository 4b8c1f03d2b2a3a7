use thiserror::Error;

use crate::shell::CommandError;

/// Errors returned by the 1Password client and item model
#[derive(Debug, Error)]
pub enum OpError {
    /// The `op` binary could not be probed at construction time
    #[error("1Password CLI ({program}) not found")]
    ToolNotFound {
        program: String,
        #[source]
        source: CommandError,
    },

    /// Lookup criteria were missing, ambiguous or malformed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// `op signin` exited non-zero
    #[error("1Password sign-in failed for account '{account}'")]
    SigninFailed {
        account: String,
        #[source]
        source: CommandError,
    },

    /// A backend command exited non-zero or could not be spawned
    #[error(transparent)]
    CommandFailed(#[from] CommandError),

    /// Standard output was not the JSON document we expected
    #[error("Invalid JSON response from 1Password CLI ({command}): {reason}")]
    InvalidResponse { command: String, reason: String },

    /// Property access for a name that is neither a field nor a key
    #[error("Item has no property '{name}'")]
    NoSuchProperty { name: String },
}

impl OpError {
    /// Create an invalid selector error
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector(message.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(command: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing property error
    pub fn no_such_property(name: impl Into<String>) -> Self {
        Self::NoSuchProperty { name: name.into() }
    }

    /// The underlying command failure, if this error carries one
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            OpError::ToolNotFound { source, .. } | OpError::SigninFailed { source, .. } => {
                Some(source)
            }
            OpError::CommandFailed(source) => Some(source),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = OpError> = std::result::Result<T, E>;
