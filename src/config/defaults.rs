// src/config/defaults.rs
use crate::config::app::EncryptionSettings;
use crate::consts::{DEFAULT_KDF_ITERATIONS, DEFAULT_KEY_LENGTH, DEFAULT_SALT_SIZE};

/// Rotation is off unless a config turns it on
pub const DEFAULT_USE_KEY_STORE: bool = false;

pub fn default_encryption_settings() -> EncryptionSettings {
    EncryptionSettings {
        iterations: DEFAULT_KDF_ITERATIONS,
        key_length: DEFAULT_KEY_LENGTH,
        salt_size: DEFAULT_SALT_SIZE,
    }
}

pub(crate) fn default_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

pub(crate) fn default_key_length() -> usize {
    DEFAULT_KEY_LENGTH
}

pub(crate) fn default_salt_size() -> usize {
    DEFAULT_SALT_SIZE
}
