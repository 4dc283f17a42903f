//! Session configuration consumed once at session start.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::timeline::StepOrder;

/// Configuration error raised before any step executes.
///
/// Kept as a dedicated type (rather than a bare `anyhow!`) so callers can
/// downcast and distinguish a bad configuration from a mid-session failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Session configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to the standard study setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of contexts a participant sees (sample size N).
    pub contexts_shown: usize,

    /// Whether required-field validation is enforced throughout.
    pub require_responses: bool,

    /// Seed for the session RNG. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Pin the step order instead of flipping a coin at session start.
    /// Exists for deterministic replay; `None` means flip.
    pub forced_order: Option<StepOrder>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            contexts_shown: 6,
            require_responses: true,
            seed: None,
            forced_order: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.contexts_shown == 0 {
            return Err(ConfigError::new("contexts_shown must be >= 1"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SessionConfig::default()`.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    if !path.exists() {
        let cfg = SessionConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SessionConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
