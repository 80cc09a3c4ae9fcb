//! Configuration for the messaging facade and the desktop provider
//!
//! Settings are resolved in order of priority:
//! 1. Environment variables (`SWITCHBOARD_DB`, `SWITCHBOARD_TIMEOUT_MS`)
//! 2. An explicit JSON file, or `switchboard.json` in the config directory
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::OperationKind;

/// Config filename in the switchboard config directory
const CONFIG_FILE: &str = "switchboard.json";

/// Default provider database filename
const DEFAULT_DATABASE: &str = "mmssms.db";

const ENV_DATABASE: &str = "SWITCHBOARD_DB";
const ENV_TIMEOUT_MS: &str = "SWITCHBOARD_TIMEOUT_MS";

/// Facade settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Upper bound for a single read or mutation; unbounded when absent
    ///
    /// Sends are never bounded, since a message handed to the platform
    /// cannot be recalled.
    pub operation_timeout_ms: Option<u64>,
}

impl ManagerConfig {
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

/// Desktop provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Path of the `mmssms.db`-shaped database; relative paths resolve
    /// against the config directory
    pub database_path: PathBuf,
    /// Permissions reported as granted, e.g. `"READ_SMS"`
    pub granted_permissions: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE),
            granted_permissions: [
                OperationKind::Read,
                OperationKind::Send,
                OperationKind::Receive,
                OperationKind::Write,
            ]
            .iter()
            .map(|kind| kind.permission().to_string())
            .collect(),
        }
    }
}

impl ProviderConfig {
    /// Database path with relative paths resolved against the config directory
    pub fn resolved_database_path(&self) -> PathBuf {
        if self.database_path.is_absolute() {
            return self.database_path.clone();
        }
        match config::config_dir() {
            Some(dir) => dir.join(&self.database_path),
            None => self.database_path.clone(),
        }
    }
}

/// Complete switchboard settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    pub manager: ManagerConfig,
    pub provider: ProviderConfig,
}

impl SwitchboardConfig {
    /// Load settings from the config directory, falling back to defaults,
    /// then apply environment overrides
    pub fn load() -> Result<Self> {
        let base = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    /// Load settings from a specific JSON file, then apply environment
    /// overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let base: Self = config::load_json_file(path)?;
        base.with_env_overrides()
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse switchboard config JSON")
    }

    fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(
            std::env::var(ENV_DATABASE).ok(),
            std::env::var(ENV_TIMEOUT_MS).ok(),
        )
    }

    fn apply_overrides(mut self, database: Option<String>, timeout_ms: Option<String>) -> Result<Self> {
        if let Some(path) = database.filter(|p| !p.is_empty()) {
            self.provider.database_path = PathBuf::from(path);
        }
        if let Some(raw) = timeout_ms.filter(|t| !t.is_empty()) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of milliseconds", ENV_TIMEOUT_MS))?;
            self.manager.operation_timeout_ms = Some(ms);
        }
        Ok(self)
    }

    /// Default config file path (~/.config/switchboard/switchboard.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }
}
