//! Versioned key storage
//!
//! `KeyStore` owns the rotation policy (enabled flag, KDF settings, version
//! sequencing). Where the key material actually lives is up to a
//! `KeyBackend`: the in-memory `MemoryBackend` here, `db::SqliteBackend`, or
//! anything that proxies a KMS.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::aliases::DerivedKey;
use crate::config::{Config, EncryptionSettings};
use crate::consts::CIPHER_KEY_LEN;
use crate::error::CoreError;

use super::kdf::{derive_key, generate_salt};
use super::util::key_fingerprint;
use super::{KeyVersion, Result};

/// One derived key and the salt it was derived with
pub struct KeyMaterial {
    key: DerivedKey,
    salt: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl KeyMaterial {
    pub fn new(key: DerivedKey, salt: Vec<u8>) -> Self {
        Self::with_created_at(key, salt, Utc::now())
    }

    /// Rebuild material loaded from persistent storage
    pub fn with_created_at(key: DerivedKey, salt: Vec<u8>, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            salt,
            created_at,
        }
    }

    /// Full derived key, `key_length` bytes
    pub fn key(&self) -> &[u8] {
        self.key.as_slice()
    }

    /// The leading 32 bytes used as the AES-256 key.
    ///
    /// Material shorter than that (only reachable through a custom backend)
    /// yields the whole key and is rejected by the cipher.
    pub fn cipher_key(&self) -> &[u8] {
        let key = self.key();
        key.get(..CIPHER_KEY_LEN).unwrap_or(key)
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn fingerprint(&self) -> String {
        key_fingerprint(self.key())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("salt", &hex::encode(&self.salt))
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Storage contract for key material.
///
/// Implementations must make `put` and `put_next` atomic: a version and its
/// material become visible together, and an existing version is never
/// overwritten.
pub trait KeyBackend: Send + Sync {
    fn get(&self, version: KeyVersion) -> Result<Option<Arc<KeyMaterial>>>;

    /// Fails with `VersionExists` if `version` is already stored
    fn put(&self, version: KeyVersion, material: KeyMaterial) -> Result<()>;

    /// Store `material` as `max_version() + 1` (or 1) and return that version.
    ///
    /// Reading the maximum and inserting must be one atomic step, also
    /// against other handles on the same storage.
    fn put_next(&self, material: KeyMaterial) -> Result<KeyVersion>;

    fn max_version(&self) -> Result<Option<KeyVersion>>;

    /// All stored versions, ascending
    fn versions(&self) -> Result<Vec<KeyVersion>>;

    /// Returns `false` if the version was not present
    fn remove(&self, version: KeyVersion) -> Result<bool>;
}

/// Version that follows `current` in a store
pub fn next_version(current: Option<KeyVersion>) -> Result<KeyVersion> {
    match current {
        Some(current) => current.checked_add(1).ok_or(CoreError::VersionExhausted),
        None => Ok(1),
    }
}

/// Process-local backend over an ordered map
#[derive(Debug, Default)]
pub struct MemoryBackend {
    keys: RwLock<BTreeMap<KeyVersion, Arc<KeyMaterial>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyBackend for MemoryBackend {
    fn get(&self, version: KeyVersion) -> Result<Option<Arc<KeyMaterial>>> {
        Ok(self.keys.read().get(&version).cloned())
    }

    fn put(&self, version: KeyVersion, material: KeyMaterial) -> Result<()> {
        let mut keys = self.keys.write();
        if keys.contains_key(&version) {
            return Err(CoreError::VersionExists(version));
        }
        keys.insert(version, Arc::new(material));
        Ok(())
    }

    fn put_next(&self, material: KeyMaterial) -> Result<KeyVersion> {
        let mut keys = self.keys.write();
        let version = next_version(keys.keys().next_back().copied())?;
        keys.insert(version, Arc::new(material));
        Ok(version)
    }

    fn max_version(&self) -> Result<Option<KeyVersion>> {
        Ok(self.keys.read().keys().next_back().copied())
    }

    fn versions(&self) -> Result<Vec<KeyVersion>> {
        Ok(self.keys.read().keys().copied().collect())
    }

    fn remove(&self, version: KeyVersion) -> Result<bool> {
        Ok(self.keys.write().remove(&version).is_some())
    }
}

/// Outcome of `KeyStore::rotate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Rotation {
    /// A new key was stored under this version
    Rotated(KeyVersion),
    /// Rotation is administratively disabled; nothing changed
    Disabled,
}

impl Rotation {
    pub fn version(self) -> Option<KeyVersion> {
        match self {
            Rotation::Rotated(v) => Some(v),
            Rotation::Disabled => None,
        }
    }

    /// Treat a disabled store as an error
    pub fn into_version(self) -> Result<KeyVersion> {
        self.version().ok_or(CoreError::KeyStoreDisabled)
    }
}

/// Versioned key store: `init → many rotate/get calls → drop`.
///
/// Shared across threads behind an `Arc`. Version numbers are assigned by
/// the backend in the same atomic step as the insert, so concurrent
/// rotations never collide, even across stores sharing one database.
pub struct KeyStore<B: KeyBackend = MemoryBackend> {
    backend: B,
    settings: EncryptionSettings,
    enabled: bool,
    rotation: Mutex<()>,
}

impl KeyStore<MemoryBackend> {
    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::new(MemoryBackend::new(), config)
    }
}

impl<B: KeyBackend> KeyStore<B> {
    pub fn new(backend: B, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            settings: config.encryption_settings,
            enabled: config.use_key_store,
            rotation: Mutex::new(()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> &EncryptionSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Highest stored version, if any
    pub fn current_version(&self) -> Result<Option<KeyVersion>> {
        self.backend.max_version()
    }

    pub fn get(&self, version: KeyVersion) -> Result<Arc<KeyMaterial>> {
        self.backend
            .get(version)?
            .ok_or(CoreError::UnknownKeyVersion(version))
    }

    pub fn versions(&self) -> Result<Vec<KeyVersion>> {
        self.backend.versions()
    }

    /// Derive a key from `passphrase` with a fresh salt and store it as the
    /// next version.
    pub fn rotate(&self, passphrase: &str) -> Result<Rotation> {
        if !self.enabled {
            warn!("key store is disabled, rotation skipped");
            return Ok(Rotation::Disabled);
        }

        // Derivation is slow; keep it outside the critical section.
        let salt = generate_salt(&self.settings);
        let key = derive_key(passphrase, &salt, &self.settings)?;
        let material = KeyMaterial::new(key, salt);
        let fingerprint = material.fingerprint();

        let _guard = self.rotation.lock();
        let version = self.backend.put_next(material)?;

        info!(version, %fingerprint, "rotated encryption key");
        Ok(Rotation::Rotated(version))
    }

    /// Drop an old version's key material. Envelopes sealed under it become
    /// undecryptable (`UnknownKeyVersion`).
    pub fn retire(&self, version: KeyVersion) -> Result<()> {
        let _guard = self.rotation.lock();
        if self.backend.max_version()? == Some(version) {
            return Err(CoreError::RetireCurrentVersion(version));
        }
        if !self.backend.remove(version)? {
            return Err(CoreError::UnknownKeyVersion(version));
        }
        debug!(version, "retired key version");
        Ok(())
    }
}

impl<B: KeyBackend + fmt::Debug> fmt::Debug for KeyStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("backend", &self.backend)
            .field("settings", &self.settings)
            .field("enabled", &self.enabled)
            .finish()
    }
}
