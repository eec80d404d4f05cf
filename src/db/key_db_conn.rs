// src/db/key_db_conn.rs
use std::{fs, path::Path, time::Duration};

use rusqlite::{Connection, Result};

/// How long a writer waits for another connection's rotation to commit
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const KEY_DB_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS key_versions (
        version    INTEGER PRIMARY KEY CHECK (version > 0),
        key_blob   BLOB NOT NULL,
        salt_blob  BLOB NOT NULL,
        created_at TEXT NOT NULL
    );
"#;

/// Open (or create) the key database at `path` and ensure the schema exists
pub fn open_key_db<P: AsRef<Path>>(path: P) -> crate::core::Result<Connection> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Scratch database that disappears with the connection
pub fn open_key_db_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(KEY_DB_SCHEMA)
}
