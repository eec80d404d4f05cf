//! Small utility functions used across the core module
//!
//! Keep this light — if it grows, split further.

use crate::consts::{FINGERPRINT_CONTEXT, FINGERPRINT_LEN};

/// Short, non-reversible identifier of a derived key, safe to log
pub fn key_fingerprint(key: &[u8]) -> String {
    let digest = blake3::derive_key(FINGERPRINT_CONTEXT, key);
    hex::encode(&digest[..FINGERPRINT_LEN])
}

/// `true` if `s` is non-empty and made only of ASCII digits
pub(crate) fn is_ascii_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
