//! Passphrase → key derivation
//!
//! PBKDF2-HMAC-SHA512 over the passphrase and a per-version random salt.
//! Pure functions; the only side effect is drawing salt from the CSPRNG.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;

use crate::aliases::DerivedKey;
use crate::config::EncryptionSettings;
use crate::error::CoreError;

use super::Result;

/// Fresh `salt_size` random bytes. Never reuse one across versions.
pub fn generate_salt(settings: &EncryptionSettings) -> Vec<u8> {
    let mut salt = vec![0u8; settings.salt_size];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Derive `key_length` bytes from `passphrase` and `salt`.
///
/// Deterministic for a given (passphrase, salt, iterations, key_length).
pub fn derive_key(
    passphrase: &str,
    salt: &[u8],
    settings: &EncryptionSettings,
) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(CoreError::InvalidInput("passphrase is required"));
    }

    let mut key = DerivedKey::new(vec![0u8; settings.key_length]);
    pbkdf2_hmac::<Sha512>(
        passphrase.as_bytes(),
        salt,
        settings.iterations,
        key.as_mut_slice(),
    );
    Ok(key)
}
