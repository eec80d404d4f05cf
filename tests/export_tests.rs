//! tests/export_tests.rs

mod common;
use common::{fast_store, PASSPHRASE};

use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use versioned_envelope::export::{key_manifest, write_key_manifest};

#[test]
fn manifest_lists_versions_without_key_bytes() {
    let store = fast_store();
    let _ = store.rotate(PASSPHRASE).unwrap();
    let _ = store.rotate(PASSPHRASE).unwrap();

    let manifest = key_manifest(&*store).unwrap();

    assert_eq!(manifest["export_format"], "versioned-envelope-manifest-v1");
    assert!(manifest["exported_at"].as_str().unwrap().ends_with('Z'));
    assert_eq!(manifest["current_version"], 2);
    assert_eq!(manifest["total_versions"], 2);
    assert_eq!(manifest["kdf"]["iterations"], 1_000);

    let versions = manifest["versions"].as_array().unwrap();
    for (entry, expected) in versions.iter().zip(1u32..) {
        let material = store.get(expected).unwrap();
        assert_eq!(entry["version"], expected);
        assert_eq!(entry["salt_hex"], hex::encode(material.salt()));
        assert_eq!(entry["fingerprint"], material.fingerprint());
        assert_eq!(entry["key_length_bytes"], 64);
    }

    let rendered = manifest.to_string();
    for version in 1..=2 {
        let key_hex = hex::encode(store.get(version).unwrap().key());
        assert!(!rendered.contains(&key_hex));
    }
}

#[test]
fn manifest_of_empty_store() {
    let store = fast_store();
    let manifest = key_manifest(&*store).unwrap();

    assert_eq!(manifest["total_versions"], 0);
    assert!(manifest["current_version"].is_null());
    assert_eq!(manifest["key_store_enabled"], true);
}

#[test]
fn write_manifest_to_disk() {
    let store = fast_store();
    let _ = store.rotate(PASSPHRASE).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("manifest.json");

    assert_eq!(write_key_manifest(&*store, &path).unwrap(), 1);

    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["versions"][0]["version"], 1);
}
