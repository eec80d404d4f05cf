// src/consts.rs
//! Shared constants — security parameters and wire-format sizes

/// PBKDF2-HMAC-SHA512 rounds used when the config does not override them
// ~0.1–0.3s on modern hardware in release builds
pub const DEFAULT_KDF_ITERATIONS: u32 = 215_000;

/// Derived key length in bytes. Longer than the cipher needs; see `CIPHER_KEY_LEN`.
pub const DEFAULT_KEY_LENGTH: usize = 64;

/// Salt length in bytes, fresh for every rotation
pub const DEFAULT_SALT_SIZE: usize = 64;

/// Upper bound on configured PBKDF2 rounds (~10–30s per rotation)
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Upper bound on configured derived key length
pub const MAX_KEY_LENGTH: usize = 1024;

/// Upper bound on configured salt length
pub const MAX_SALT_SIZE: usize = 1024;

/// AES-256 key size. The cipher uses this many leading bytes of the derived key.
pub const CIPHER_KEY_LEN: usize = 32;

/// Per-envelope GCM nonce length
pub const NONCE_LEN: usize = 16;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Separator between envelope fields
pub const ENVELOPE_DELIMITER: char = ':';

/// version, nonce, tag, ciphertext
pub const ENVELOPE_FIELDS: usize = 4;

/// Env var naming the config file read by `config::load`
pub const CONFIG_ENV_VAR: &str = "VE_CONFIG";

/// Config file used when `VE_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "keystore.toml";

/// BLAKE3 context string for key fingerprints
pub const FINGERPRINT_CONTEXT: &str = "versioned-envelope 2025 key fingerprint";

/// Bytes of the BLAKE3 output kept in a fingerprint
pub const FINGERPRINT_LEN: usize = 8;

/// Format tag written into exported key manifests
pub const MANIFEST_FORMAT: &str = "versioned-envelope-manifest-v1";
