//! tests/db_tests.rs
#![cfg(feature = "sqlite")]

mod common;
use common::{fast_config, fast_settings, setup, PASSPHRASE};

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::tempdir;
use versioned_envelope::{
    derive_key, generate_salt, CoreError, EnvelopeCipher, KeyBackend, KeyMaterial, KeyStore,
    Rotation, SqliteBackend,
};

fn sqlite_cipher(backend: SqliteBackend) -> EnvelopeCipher<SqliteBackend> {
    setup();
    EnvelopeCipher::new(Arc::new(KeyStore::new(backend, &fast_config()).unwrap()))
}

#[test]
fn envelopes_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("keys.db");

    let (old, new) = {
        let cipher = sqlite_cipher(SqliteBackend::open(&db_path).unwrap());
        assert_eq!(cipher.store().rotate(PASSPHRASE).unwrap(), Rotation::Rotated(1));
        let old = cipher.encrypt("before restart v1").unwrap();
        assert_eq!(cipher.store().rotate(PASSPHRASE).unwrap(), Rotation::Rotated(2));
        let new = cipher.encrypt("before restart v2").unwrap();
        (old, new)
    };

    let reopened = sqlite_cipher(SqliteBackend::open(&db_path).unwrap());
    assert_eq!(reopened.store().current_version().unwrap(), Some(2));
    assert_eq!(reopened.decrypt(&old).unwrap(), "before restart v1");
    assert_eq!(reopened.decrypt(&new).unwrap(), "before restart v2");

    assert_eq!(reopened.store().rotate(PASSPHRASE).unwrap(), Rotation::Rotated(3));
}

#[test]
fn stored_rows_roundtrip_key_salt_and_timestamp() {
    let backend = SqliteBackend::open_in_memory().unwrap();
    let settings = fast_settings();
    let salt = generate_salt(&settings);
    let material = KeyMaterial::new(derive_key("pw", &salt, &settings).unwrap(), salt.clone());
    let key = material.key().to_vec();
    let created_at = material.created_at();

    backend.put(1, material).unwrap();
    let loaded = backend.get(1).unwrap().unwrap();

    assert_eq!(loaded.key(), key.as_slice());
    assert_eq!(loaded.salt(), salt.as_slice());
    assert_eq!(loaded.created_at(), created_at);
    assert!(backend.get(2).unwrap().is_none());
}

#[test]
fn duplicate_version_insert_is_rejected() {
    let backend = SqliteBackend::open_in_memory().unwrap();
    let settings = fast_settings();
    let material = || {
        let salt = generate_salt(&settings);
        KeyMaterial::new(derive_key("pw", &salt, &settings).unwrap(), salt)
    };

    backend.put(1, material()).unwrap();
    assert!(matches!(
        backend.put(1, material()),
        Err(CoreError::VersionExists(1))
    ));
    assert_eq!(backend.versions().unwrap(), vec![1]);
}

#[test]
fn empty_database_has_no_versions() {
    let backend = SqliteBackend::open_in_memory().unwrap();
    assert_eq!(backend.max_version().unwrap(), None);
    assert!(backend.versions().unwrap().is_empty());
    assert!(!backend.remove(1).unwrap());
}

#[test]
fn retire_deletes_row() {
    let cipher = sqlite_cipher(SqliteBackend::open_in_memory().unwrap());
    let store = cipher.store();
    let _ = store.rotate(PASSPHRASE).unwrap();
    let old = cipher.encrypt("old").unwrap();
    let _ = store.rotate(PASSPHRASE).unwrap();

    store.retire(1).unwrap();
    assert_eq!(store.versions().unwrap(), vec![2]);
    assert!(matches!(
        cipher.decrypt(&old),
        Err(CoreError::UnknownKeyVersion(1))
    ));
}

#[test]
fn concurrent_rotations_against_sqlite() {
    let cipher = sqlite_cipher(SqliteBackend::open_in_memory().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(cipher.store());
            thread::spawn(move || store.rotate(PASSPHRASE).unwrap().into_version().unwrap())
        })
        .collect();

    let mut versions: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2, 3, 4]);
}

#[test]
fn two_handles_on_one_file_never_collide() {
    setup();
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("shared.db");
    const ROUNDS: u32 = 20;

    let stores: Vec<_> = (0..2)
        .map(|_| {
            let backend = SqliteBackend::open(&db_path).unwrap();
            Arc::new(KeyStore::new(backend, &fast_config()).unwrap())
        })
        .collect();
    let barrier = Arc::new(Barrier::new(stores.len()));

    let handles: Vec<_> = stores
        .iter()
        .map(|store| {
            let store = Arc::clone(store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                (0..ROUNDS)
                    .map(|_| {
                        barrier.wait();
                        store.rotate(PASSPHRASE).unwrap().into_version().unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut versions: Vec<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    versions.sort_unstable();

    assert_eq!(versions, (1..=2 * ROUNDS).collect::<Vec<_>>());
    assert_eq!(stores[0].versions().unwrap(), versions);
}

#[test]
fn sqlite_put_next_continues_after_explicit_put() {
    let backend = SqliteBackend::open_in_memory().unwrap();
    let settings = fast_settings();
    let material = || {
        let salt = generate_salt(&settings);
        KeyMaterial::new(derive_key("pw", &salt, &settings).unwrap(), salt)
    };

    assert_eq!(backend.put_next(material()).unwrap(), 1);
    backend.put(4, material()).unwrap();
    assert_eq!(backend.put_next(material()).unwrap(), 5);
    assert_eq!(backend.versions().unwrap(), vec![1, 4, 5]);
}
