use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::consts::MANIFEST_FORMAT;
use crate::core::{KeyBackend, KeyStore, KeyVersion, Result};

#[derive(Debug, Serialize)]
struct ManifestEntry {
    version: KeyVersion,
    fingerprint: String,
    salt_hex: String,
    salt_size_bytes: usize,
    key_length_bytes: usize,
    created_at: String,
}

/// Build a JSON manifest of every stored key version
pub fn key_manifest<B: KeyBackend>(store: &KeyStore<B>) -> Result<Value> {
    let mut entries = Vec::new();

    for version in store.versions()? {
        // Retired between listing and lookup
        let Some(material) = store.backend().get(version)? else {
            continue;
        };
        entries.push(ManifestEntry {
            version,
            fingerprint: material.fingerprint(),
            salt_hex: hex::encode(material.salt()),
            salt_size_bytes: material.salt().len(),
            key_length_bytes: material.key().len(),
            created_at: material
                .created_at()
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        });
    }

    let settings = store.settings();

    Ok(json!({
        "export_format": MANIFEST_FORMAT,
        "exported_at": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        "exporter_version": env!("CARGO_PKG_VERSION"),
        "key_store_enabled": store.is_enabled(),
        "current_version": store.current_version()?,
        "kdf": {
            "algorithm": "PBKDF2-HMAC-SHA512",
            "iterations": settings.iterations,
            "key_length": settings.key_length,
            "salt_size": settings.salt_size,
        },
        "total_versions": entries.len(),
        "versions": serde_json::to_value(&entries)?,
    }))
}

/// Write `key_manifest` to `path` as pretty-printed JSON
pub fn write_key_manifest<B: KeyBackend, P: AsRef<Path>>(
    store: &KeyStore<B>,
    path: P,
) -> Result<usize> {
    let manifest = key_manifest(store)?;
    let total = manifest["total_versions"].as_u64().unwrap_or_default() as usize;

    std::fs::write(path.as_ref(), serde_json::to_string_pretty(&manifest)?)?;
    info!(total, path = %path.as_ref().display(), "exported key manifest");

    Ok(total)
}
