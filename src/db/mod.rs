//! SQLite-backed key storage
//!
//! Key material survives process restarts; envelopes sealed before a restart
//! stay decryptable as long as their version row is kept.

pub mod key_db_conn;
pub mod key_db_ops;

pub use key_db_conn::{open_key_db, open_key_db_in_memory};
pub use key_db_ops::SqliteBackend;
