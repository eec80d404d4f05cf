// src/lib.rs
//! versioned-envelope — passphrase-derived, versioned authenticated encryption
//!
//! Features:
//! - PBKDF2-HMAC-SHA512 key derivation with a fresh salt per key version
//! - Monotonic key versions behind a pluggable `KeyBackend`
//! - AES-256-GCM envelopes that name the key version that sealed them
//! - Optional SQLite persistence and JSON key manifests

pub mod aliases;
pub mod config;
pub mod consts;
pub mod core;
#[cfg(feature = "sqlite")]
pub mod db;
pub mod error;
pub mod export;

// Re-export everything users need at the crate root
pub use aliases::{DerivedKey, PlainText, Secret};
pub use config::{load as load_config, Config, EncryptionSettings};
pub use crate::core::{
    derive_key, generate_salt, key_fingerprint, Envelope, EnvelopeCipher, KeyBackend,
    KeyMaterial, KeyStore, KeyVersion, MemoryBackend, Result as CoreResult, Rotation,
};
#[cfg(feature = "sqlite")]
pub use db::SqliteBackend;
pub use error::CoreError;
pub use export::{key_manifest, write_key_manifest};
