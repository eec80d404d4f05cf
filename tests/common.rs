// tests/common.rs
//! Shared test utilities — logging setup and fast key stores
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use versioned_envelope::{Config, EncryptionSettings, EnvelopeCipher, KeyStore, MemoryBackend};

pub const PASSPHRASE: &str = "mySecretPassphrase";

/// Initialize test-friendly logging. Idempotent; respects RUST_LOG.
pub fn setup() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Real key/salt sizes, but few enough PBKDF2 rounds for debug builds
pub fn fast_settings() -> EncryptionSettings {
    EncryptionSettings {
        iterations: 1_000,
        ..EncryptionSettings::default()
    }
}

pub fn fast_config() -> Config {
    Config::enabled().with_settings(fast_settings())
}

pub fn fast_store() -> Arc<KeyStore<MemoryBackend>> {
    setup();
    Arc::new(KeyStore::in_memory(&fast_config()).expect("valid config"))
}

pub fn fast_cipher() -> EnvelopeCipher<MemoryBackend> {
    EnvelopeCipher::new(fast_store())
}
