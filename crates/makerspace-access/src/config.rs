//! Runtime configuration.
//!
//! Configuration is an explicit value handed to the ledger and the store.
//! `from_env` reads:
//!
//! - `MSA_HOME` — ledger root (default `$HOME/.makerspace`)
//! - `MSA_GRANT_VALIDITY_DAYS` — certification lifetime for newly approved
//!   grants; unset or `0` means grants never expire

use std::path::PathBuf;

use crate::error::{AccessError, Result};

const HOME_VAR: &str = "MSA_HOME";
const VALIDITY_VAR: &str = "MSA_GRANT_VALIDITY_DAYS";
const DEFAULT_DIR_NAME: &str = ".makerspace";

/// Settings shared by the CLI, the store and the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    /// Root directory of the ledger store.
    pub data_dir: PathBuf,
    /// Lifetime of a newly certified grant, in days (None = no expiry).
    pub grant_validity_days: Option<u32>,
}

impl AccessConfig {
    /// Configuration rooted at `data_dir` with non-expiring grants.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            grant_validity_days: None,
        }
    }

    /// Set the certification lifetime for approved grants.
    pub fn with_grant_validity_days(mut self, days: u32) -> Self {
        self.grant_validity_days = if days == 0 { None } else { Some(days) };
        self
    }

    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(HOME_VAR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").ok_or_else(|| {
                    AccessError::InvalidConfig(format!("neither {HOME_VAR} nor HOME is set"))
                })?;
                PathBuf::from(home).join(DEFAULT_DIR_NAME)
            }
        };

        let mut config = Self::new(data_dir);

        if let Some(raw) = lookup(VALIDITY_VAR) {
            let days: u32 = raw.trim().parse().map_err(|_| {
                AccessError::InvalidConfig(format!(
                    "{VALIDITY_VAR} must be a whole number, got '{raw}'"
                ))
            })?;
            config = config.with_grant_validity_days(days);
        }

        Ok(config)
    }

    /// Grant lifetime in microseconds, if grants expire.
    pub fn grant_validity_micros(&self) -> Option<u64> {
        self.grant_validity_days.map(crate::time::days_to_micros)
    }
}
