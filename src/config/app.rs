// src/config/app.rs
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::defaults::*;
use crate::consts::{
    CIPHER_KEY_LEN, CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH, MAX_KDF_ITERATIONS, MAX_KEY_LENGTH,
    MAX_SALT_SIZE,
};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// `false` turns `KeyStore::rotate` into a logged no-op
    #[serde(default, alias = "use_key_store")]
    pub use_key_store: bool,

    #[serde(default = "default_encryption_settings", alias = "encryption_settings")]
    pub encryption_settings: EncryptionSettings,
}

/// Key derivation parameters, shared read-only by every rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionSettings {
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_key_length", alias = "key_length")]
    pub key_length: usize,

    #[serde(default = "default_salt_size", alias = "salt_size")]
    pub salt_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_key_store: DEFAULT_USE_KEY_STORE,
            encryption_settings: default_encryption_settings(),
        }
    }
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        default_encryption_settings()
    }
}

impl Config {
    /// Defaults with rotation enabled
    pub fn enabled() -> Self {
        Self {
            use_key_store: true,
            ..Self::default()
        }
    }

    pub fn with_settings(mut self, settings: EncryptionSettings) -> Self {
        self.encryption_settings = settings;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CoreError> {
        let conf: Config = toml::from_str(s)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        let conf: Config = serde_json::from_str(s)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Read a config file; `.json` is parsed as JSON, anything else as TOML
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.encryption_settings.validate()
    }
}

impl EncryptionSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=MAX_KDF_ITERATIONS).contains(&self.iterations) {
            return Err(CoreError::InvalidConfig(format!(
                "iterations must be between 1 and {MAX_KDF_ITERATIONS}, got {}",
                self.iterations
            )));
        }
        if !(1..=MAX_SALT_SIZE).contains(&self.salt_size) {
            return Err(CoreError::InvalidConfig(format!(
                "saltSize must be between 1 and {MAX_SALT_SIZE} bytes, got {}",
                self.salt_size
            )));
        }
        if !(CIPHER_KEY_LEN..=MAX_KEY_LENGTH).contains(&self.key_length) {
            return Err(CoreError::InvalidConfig(format!(
                "keyLength must be between {CIPHER_KEY_LEN} and {MAX_KEY_LENGTH} bytes, got {}",
                self.key_length
            )));
        }
        Ok(())
    }
}

/// Load the config named by `VE_CONFIG` (default `keystore.toml`).
///
/// A missing file falls back to built-in defaults; an unreadable or
/// invalid one is an error.
pub fn load() -> Result<Config, CoreError> {
    let config_path =
        std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if Path::new(&config_path).exists() {
        debug!(path = %config_path, "loading config");
        Config::load_from(&config_path)
    } else {
        warn!(path = %config_path, "config file not found, using built-in defaults");
        Ok(Config::default())
    }
}
