//! Authenticated envelope encryption
//!
//! Wire format: `<version>:<nonceHex>:<tagHex>:<cipherHex>`
//!
//! AES-256-GCM with a 16-byte random nonce, keyed by the first 32 bytes of
//! the derived key for `version`. The format is persisted by callers and
//! must stay stable across releases.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use rand::RngCore;
use tracing::debug;

use crate::aliases::PlainText;
use crate::consts::{ENVELOPE_DELIMITER, NONCE_LEN, TAG_LEN};
use crate::error::CoreError;

use super::store::{KeyBackend, KeyMaterial, KeyStore, MemoryBackend};
use super::util::is_ascii_digits;
use super::{KeyVersion, Result};

/// AES-256-GCM with a 128-bit nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// A decoded envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: KeyVersion,
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = ENVELOPE_DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.version,
            hex::encode(self.nonce),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl FromStr for Envelope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        EnvelopeFields::split(s)?.decode()
    }
}

/// Envelope split into fields, version parsed, hex still encoded.
///
/// Decryption looks the key up between splitting and decoding so an
/// unknown version is reported before any field-level problem.
struct EnvelopeFields<'a> {
    version: KeyVersion,
    nonce_hex: &'a str,
    tag_hex: &'a str,
    body_hex: &'a str,
}

impl<'a> EnvelopeFields<'a> {
    fn split(s: &'a str) -> Result<Self> {
        let parts: Vec<&str> = s.split(ENVELOPE_DELIMITER).collect();
        let &[version, nonce_hex, tag_hex, body_hex] = parts.as_slice() else {
            return Err(CoreError::MalformedEnvelope("expected 4 fields"));
        };

        if !is_ascii_digits(version) {
            return Err(CoreError::MalformedEnvelope("key version is not a number"));
        }
        let version = version
            .parse::<KeyVersion>()
            .map_err(|_| CoreError::MalformedEnvelope("key version out of range"))?;

        Ok(Self {
            version,
            nonce_hex,
            tag_hex,
            body_hex,
        })
    }

    fn decode(self) -> Result<Envelope> {
        Ok(Envelope {
            version: self.version,
            nonce: decode_fixed(self.nonce_hex, "invalid nonce")?,
            tag: decode_fixed(self.tag_hex, "invalid tag")?,
            ciphertext: hex::decode(self.body_hex)
                .map_err(|_| CoreError::MalformedEnvelope("invalid ciphertext"))?,
        })
    }
}

fn decode_fixed<const N: usize>(field: &str, reason: &'static str) -> Result<[u8; N]> {
    let bytes = hex::decode(field).map_err(|_| CoreError::MalformedEnvelope(reason))?;
    bytes
        .try_into()
        .map_err(|_| CoreError::MalformedEnvelope(reason))
}

fn cipher_for(material: &KeyMaterial) -> Result<Aes256Gcm16> {
    Aes256Gcm16::new_from_slice(material.cipher_key())
        .map_err(|_| CoreError::InvalidInput("key material shorter than 32 bytes"))
}

/// Encrypt `plaintext` under `material`, tagging the result with `version`
pub fn seal(version: KeyVersion, material: &KeyMaterial, plaintext: &[u8]) -> Result<Envelope> {
    let cipher = cipher_for(material)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| CoreError::InvalidInput("plaintext too long for AES-GCM"))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(Envelope {
        version,
        nonce,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Verify and decrypt. All-or-nothing: no bytes are returned on tag mismatch.
pub fn open(envelope: &Envelope, material: &KeyMaterial) -> Result<PlainText> {
    let cipher = cipher_for(material)?;

    let mut buffer = PlainText::new(envelope.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(&envelope.nonce),
            b"",
            buffer.as_mut_slice(),
            Tag::<U16>::from_slice(&envelope.tag),
        )
        .map_err(|_| {
            debug!(version = envelope.version, "envelope failed authentication");
            CoreError::AuthenticationFailed
        })?;

    Ok(buffer)
}

/// Stateless encrypt/decrypt front end over a shared `KeyStore`
pub struct EnvelopeCipher<B: KeyBackend = MemoryBackend> {
    store: Arc<KeyStore<B>>,
}

impl<B: KeyBackend> Clone for EnvelopeCipher<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<B: KeyBackend> EnvelopeCipher<B> {
    pub fn new(store: Arc<KeyStore<B>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<KeyStore<B>> {
        &self.store
    }

    /// Seal `plaintext` under the current key version
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(self.encrypt_envelope(plaintext)?.to_string())
    }

    pub fn encrypt_envelope(&self, plaintext: &str) -> Result<Envelope> {
        let version = self
            .store
            .current_version()?
            .ok_or(CoreError::NoKeysAvailable)?;
        let material = self.store.get(version)?;

        let envelope = seal(version, &material, plaintext.as_bytes())?;
        debug!(version, "sealed envelope");
        Ok(envelope)
    }

    /// Open an envelope with the key version it names.
    ///
    /// No passphrase is involved: the key is looked up, not re-derived.
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        let fields = EnvelopeFields::split(envelope)?;
        let material = self.store.get(fields.version)?;
        let envelope = fields.decode()?;

        let plaintext = open(&envelope, &material)?;
        debug!(version = envelope.version, "opened envelope");

        std::str::from_utf8(plaintext.as_slice())
            .map(str::to_owned)
            .map_err(|_| CoreError::MalformedEnvelope("plaintext is not valid UTF-8"))
    }

    /// `true` if the envelope was sealed under an older version than the current one
    pub fn needs_reencryption(&self, envelope: &str) -> Result<bool> {
        let version = EnvelopeFields::split(envelope)?.version;
        let current = self
            .store
            .current_version()?
            .ok_or(CoreError::NoKeysAvailable)?;
        Ok(version < current)
    }

    /// Decrypt under the envelope's version and re-seal under the current one
    pub fn reencrypt(&self, envelope: &str) -> Result<String> {
        let plaintext = self.decrypt(envelope)?;
        self.encrypt(&plaintext)
    }
}
