//! Wallet configuration with TOML file support.

use quill_keystore::KdfParams;
use quill_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::WalletError;

/// Configuration for the wallet service.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Directory holding the key store files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Number of derivation indices scanned when looking an address up.
    #[serde(default = "default_search_window")]
    pub search_window: u32,

    /// Argon2id cost for newly written store files.
    #[serde(default)]
    pub kdf: KdfParams,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quill_data/wallet")
}

fn default_search_window() -> u32 {
    100
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WalletError> {
        let config: Self = toml::from_str(s).map_err(|e| WalletError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, WalletError> {
        toml::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// A config rooted at `data_dir`, everything else default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn log_format(&self) -> Result<LogFormat, WalletError> {
        self.log_format
            .parse()
            .map_err(|e: quill_utils::LoggingError| WalletError::Config(e.to_string()))
    }

    /// Install the global subscriber for this config. A subscriber that is
    /// already installed is left in place.
    pub fn init_logging(&self) -> Result<(), WalletError> {
        quill_utils::init_logging(self.log_format()?, &self.log_level);
        Ok(())
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.search_window == 0 {
            return Err(WalletError::Config("search_window must be at least 1".into()));
        }
        self.log_format()?;
        Ok(())
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            search_window: default_search_window(),
            kdf: KdfParams::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
