// src/aliases.rs
//! Secret buffer types used throughout versioned-envelope
//!
//! Everything here is wiped when dropped.

use zeroize::Zeroizing;

/// Owned secret, zeroized on drop
pub type Secret<T> = Zeroizing<T>;

pub type DerivedKey = Secret<Vec<u8>>; // PBKDF2 output, `key_length` bytes
pub type PlainText = Secret<Vec<u8>>; // decrypted bytes before UTF-8 validation
