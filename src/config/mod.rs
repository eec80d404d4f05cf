// src/config/mod.rs
//! Configuration for versioned-envelope
//!
//! Typed settings with built-in defaults, loadable from TOML or JSON.
//! Key names follow the camelCase layout of existing `config.json` files;
//! snake_case spellings are accepted as aliases.

pub use app::{load, Config, EncryptionSettings};
pub use defaults::{default_encryption_settings, DEFAULT_USE_KEY_STORE};

mod app;
mod defaults;
