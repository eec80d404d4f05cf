// src/error.rs
//! Public error type for the entire crate

use thiserror::Error;

use crate::core::KeyVersion;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("Key store is disabled")]
    KeyStoreDisabled,

    #[error("No encryption keys available")]
    NoKeysAvailable,

    #[error("Key version {0} does not exist")]
    UnknownKeyVersion(KeyVersion),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    // Deliberately carries no detail about which field failed
    #[error("Envelope failed authentication")]
    AuthenticationFailed,

    #[error("Key version {0} already exists")]
    VersionExists(KeyVersion),

    #[error("Refusing to retire current key version {0}")]
    RetireCurrentVersion(KeyVersion),

    #[error("Key version space exhausted")]
    VersionExhausted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),
}
