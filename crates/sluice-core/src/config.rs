//! Configuration loading from `${SLUICE_HOME}/config.toml`.
//!
//! Everything is optional; a missing file yields defaults. The config
//! supplies per-host defaults that callers fold into each session's
//! [`ConversationOptions`](crate::engine::ConversationOptions).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{ConversationOptions, PermissionMode};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub defaults: SessionDefaults,
}

/// Engine launch settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Absolute path to the engine executable; probed when unset.
    pub path: Option<PathBuf>,
    /// Extra arguments appended when launching the engine.
    pub extra_args: Vec<String>,
}

/// Defaults applied to sessions that leave the corresponding option unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub permission_mode: Option<PermissionMode>,
}

impl Config {
    /// Folds host defaults into options a caller assembled per session.
    pub fn apply_defaults(&self, options: &mut ConversationOptions) {
        if options.model.is_none() {
            options.model = self.defaults.model.clone();
        }
        if options.system_prompt.is_none() {
            options.system_prompt = self.defaults.system_prompt.clone();
        }
        if let Some(mode) = self.defaults.permission_mode {
            if options.permission_mode == PermissionMode::default() {
                options.permission_mode = mode;
            }
        }
        if options.engine_path.is_none() {
            options.engine_path = self.engine.path.clone();
        }
    }
}

/// Returns the config directory: `$SLUICE_HOME`, or `~/.sluice`.
pub fn config_home() -> PathBuf {
    if let Some(home) = std::env::var_os("SLUICE_HOME") {
        return PathBuf::from(home);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sluice")
}

/// Loads `config.toml` from the config home.
pub fn load() -> Result<Config> {
    load_from(&config_home().join("config.toml"))
}

/// Loads configuration from an explicit path; a missing file is defaults.
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config at {}", path.display()))
}
