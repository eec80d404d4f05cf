//! Export utilities for versioned-envelope
//!
//! Manifests describe which key versions exist and when they were created.
//! They never contain key bytes, so they are safe to hand to auditors.

pub use json::{key_manifest, write_key_manifest};

pub mod json;
