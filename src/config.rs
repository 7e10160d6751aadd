// ⚙️ Walkthrough Configuration - Settings as Data
// Every field has a default so an empty JSON object is a valid config

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// POLICY
// ============================================================================

/// What Transfer does when no transaction has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdleTransferPolicy {
    /// Apply each UPDATE immediately (per-statement autocommit) and flag it
    /// in the log as not roll-back-able.
    #[default]
    AutoCommit,
    /// Refuse the transfer until StartTransaction has run.
    Reject,
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkthroughConfig {
    /// SQLite file holding the `accounts` table (recreated on every launch)
    pub database_path: PathBuf,

    /// Opening balance of both seeded accounts
    pub seed_balance: i64,

    /// Amount moved by a single Transfer
    pub transfer_amount: i64,

    /// Account debited by Transfer
    pub source: String,

    /// Account credited by Transfer
    pub destination: String,

    pub idle_transfer: IdleTransferPolicy,

    /// Diagnostic log file used while a TUI owns the terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for WalkthroughConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("visual_acid.db"),
            seed_balance: 1000,
            transfer_amount: 100,
            source: "Alice".to_string(),
            destination: "Bob".to_string(),
            idle_transfer: IdleTransferPolicy::AutoCommit,
            log_file: None,
        }
    }
}

impl WalkthroughConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: WalkthroughConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Same as `Default`, but pointing at another database file
    pub fn with_database<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    /// The two seeded accounts must be distinct, named, and the transfer positive
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() || self.destination.trim().is_empty() {
            anyhow::bail!("source and destination account names must not be empty");
        }
        if self.source == self.destination {
            anyhow::bail!("source and destination must be different accounts");
        }
        if self.transfer_amount <= 0 {
            anyhow::bail!("transfer_amount must be positive, got {}", self.transfer_amount);
        }
        Ok(())
    }
}
