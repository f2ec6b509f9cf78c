//! Configuration system for Relaytun.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $RELAYTUN_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/relaytun/config.toml
//!   3. ~/.config/relaytun/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::wire::{
    DEFAULT_ECHO_CAPACITY, DEFAULT_ECHO_WINDOW_SECS, DEFAULT_MAX_DECOMPRESSED_LEN,
    DEFAULT_MAX_MESSAGE_LEN, DEFAULT_WHISPER_COMMAND,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    pub relay: RelayConfig,
    pub echo: EchoConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Longest relay message, in characters, including the addressing prefix.
    pub max_message_len: usize,
    /// Relay command that delivers a message to one recipient.
    pub whisper_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Seconds a sent envelope is remembered while waiting for its echo.
    pub window_secs: u64,
    /// Maximum envelopes remembered at once. Oldest are evicted first.
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upper bound on a decompressed packet, in bytes.
    pub max_decompressed_len: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            whisper_command: DEFAULT_WHISPER_COMMAND.to_string(),
        }
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_ECHO_WINDOW_SECS,
            capacity: DEFAULT_ECHO_CAPACITY,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_decompressed_len: DEFAULT_MAX_DECOMPRESSED_LEN,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("relaytun")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl TunnelConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            TunnelConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse one TOML file. Missing keys take their defaults.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("RELAYTUN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&TunnelConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply RELAYTUN_* overrides. `lookup` is `std::env::var` outside tests.
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("RELAYTUN_RELAY__MAX_MESSAGE_LEN").and_then(|v| v.parse().ok()) {
            self.relay.max_message_len = v;
        }
        if let Some(v) = lookup("RELAYTUN_RELAY__WHISPER_COMMAND") {
            self.relay.whisper_command = v;
        }
        if let Some(v) = lookup("RELAYTUN_ECHO__WINDOW_SECS").and_then(|v| v.parse().ok()) {
            self.echo.window_secs = v;
        }
        if let Some(v) = lookup("RELAYTUN_ECHO__CAPACITY").and_then(|v| v.parse().ok()) {
            self.echo.capacity = v;
        }
        if let Some(v) =
            lookup("RELAYTUN_LIMITS__MAX_DECOMPRESSED_LEN").and_then(|v| v.parse().ok())
        {
            self.limits.max_decompressed_len = v;
        }
    }
}
