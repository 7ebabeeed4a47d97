//! Database connection handling and schema setup.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

/// SQLite connection wrapper.
///
/// A single connection behind a mutex: token and speaker operations are
/// short row-level transactions with no cross-request coordination, so one
/// serialized connection is enough for a single-process deployment.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database at the given path and initializes
    /// the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Opens an in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");

        self.with_conn(|conn| {
            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS auth_token (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    secret_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    last_used_at TEXT,
                    expires_at TEXT,
                    revoked INTEGER NOT NULL DEFAULT 0
                )
                "#,
                [],
            )?;

            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS speaker_profile (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    data BLOB NOT NULL
                )
                "#,
                [],
            )?;

            Ok(())
        })
    }

    /// Runs a closure against the connection, mapping the error type.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.conn.lock().expect("database lock poisoned");
        f(&conn).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_init_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();
    }

    #[test]
    fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.db");
        Database::open(&path).unwrap();
        assert!(path.exists());
    }
}
