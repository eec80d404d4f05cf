//! `KeyBackend` over the `key_versions` table

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::aliases::DerivedKey;
use crate::core::{next_version, KeyBackend, KeyMaterial, KeyVersion, Result};
use crate::error::CoreError;

use super::key_db_conn::{open_key_db, open_key_db_in_memory};

/// Persistent backend. Rows are never updated in place; the primary key
/// rejects a second insert of the same version, even from another process.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_connection(open_key_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(open_key_db_in_memory()?))
    }

    /// Wrap a connection whose schema is already initialized
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl KeyBackend for SqliteBackend {
    fn get(&self, version: KeyVersion) -> Result<Option<Arc<KeyMaterial>>> {
        let conn = self.conn.lock();
        let material = conn
            .query_row(
                "SELECT key_blob, salt_blob, created_at FROM key_versions WHERE version = ?1",
                [version],
                |row| {
                    let key: Vec<u8> = row.get(0)?;
                    let salt: Vec<u8> = row.get(1)?;
                    let created_at: DateTime<Utc> = row.get(2)?;
                    Ok(KeyMaterial::with_created_at(
                        DerivedKey::new(key),
                        salt,
                        created_at,
                    ))
                },
            )
            .optional()?;
        Ok(material.map(Arc::new))
    }

    fn put(&self, version: KeyVersion, material: KeyMaterial) -> Result<()> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO key_versions (version, key_blob, salt_blob, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                version,
                material.key(),
                material.salt(),
                material.created_at()
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(CoreError::VersionExists(version))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn put_next(&self, material: KeyMaterial) -> Result<KeyVersion> {
        let mut conn = self.conn.lock();
        // IMMEDIATE takes the write lock up front, so MAX + 1 cannot be
        // computed by two connections at once.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx.query_row("SELECT MAX(version) FROM key_versions", [], |row| {
            row.get::<_, Option<KeyVersion>>(0)
        })?;
        let version = next_version(current)?;

        tx.execute(
            "INSERT INTO key_versions (version, key_blob, salt_blob, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                version,
                material.key(),
                material.salt(),
                material.created_at()
            ],
        )?;
        tx.commit()?;

        Ok(version)
    }

    fn max_version(&self) -> Result<Option<KeyVersion>> {
        let conn = self.conn.lock();
        let max = conn.query_row("SELECT MAX(version) FROM key_versions", [], |row| {
            row.get::<_, Option<KeyVersion>>(0)
        })?;
        Ok(max)
    }

    fn versions(&self) -> Result<Vec<KeyVersion>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT version FROM key_versions ORDER BY version")?;
        let versions = stmt
            .query_map([], |row| row.get::<_, KeyVersion>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(versions)
    }

    fn remove(&self, version: KeyVersion) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM key_versions WHERE version = ?1", [version])?;
        Ok(removed > 0)
    }
}
