//! opwrap configuration management
//!
//! Settings are merged from, lowest precedence first:
//! `~/.config/opwrap/config.toml` (or `--config`), `OPWRAP_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use opwrap::ClientSettings;
use serde::{Deserialize, Serialize};

/// Environment variables read by [`OpwrapConfig::with_env`]
pub const ENV_ACCOUNT: &str = "OPWRAP_ACCOUNT";
pub const ENV_VAULT: &str = "OPWRAP_VAULT";
pub const ENV_PROGRAM: &str = "OPWRAP_PROGRAM";

/// Partially specified client settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpwrapConfig {
    /// 1Password account (shorthand, sign-in address or UUID)
    pub account: Option<String>,

    /// Default vault for title lookups
    pub vault: Option<String>,

    /// Path to the `op` binary
    pub program: Option<String>,
}

impl OpwrapConfig {
    /// Get the default config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("opwrap")
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    /// Load an explicitly requested file, or the default file if it exists
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    tracing::debug!("No config file at {:?}", path);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `OPWRAP_*` variables from `lookup`
    pub fn with_env(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let overrides = Self {
            account: lookup(ENV_ACCOUNT),
            vault: lookup(ENV_VAULT),
            program: lookup(ENV_PROGRAM),
        };
        self.merge(overrides)
    }

    /// Values set in `overrides` win; empty strings are ignored
    pub fn merge(self, overrides: Self) -> Self {
        fn pick(base: Option<String>, over: Option<String>) -> Option<String> {
            over.filter(|v| !v.is_empty()).or(base)
        }

        Self {
            account: pick(self.account, overrides.account),
            vault: pick(self.vault, overrides.vault),
            program: pick(self.program, overrides.program),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.account.as_deref().unwrap_or_default().is_empty() {
            errors.push(format!("Account is required (--account or {})", ENV_ACCOUNT));
        }

        if self.vault.as_deref().unwrap_or_default().is_empty() {
            errors.push(format!("Vault is required (--vault or {})", ENV_VAULT));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Turn a complete configuration into client settings
    pub fn into_settings(self) -> anyhow::Result<ClientSettings> {
        if let Err(errors) = self.validate() {
            anyhow::bail!("Configuration error:\n  {}", errors.join("\n  "));
        }

        let mut settings = ClientSettings::new(
            self.account.unwrap_or_default(),
            self.vault.unwrap_or_default(),
        );
        if let Some(program) = self.program {
            settings = settings.with_program(program);
        }
        Ok(settings)
    }
}
