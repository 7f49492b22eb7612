//! Shared SQLite connection handle.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::RepositoryError;

/// Cloneable handle to a single SQLite connection.
///
/// Every statement runs while holding the connection lock, so each call
/// observes the store in a consistent state. Atomicity across statements is
/// still the caller's job.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates a SQLite database at the given path.
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: &str, busy_timeout: Duration) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        tracing::info!(target: "libreria-db", %path, "database opened");
        Self::configure(conn)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self, RepositoryError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Locks the connection for the duration of the returned guard.
    pub fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::storage(format!("connection lock poisoned: {e}")))
    }

    /// Round-trips a trivial query to check the store is reachable.
    pub fn ping(&self) -> Result<(), RepositoryError> {
        let conn = self.lock_conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_answers_ping() {
        let db = Database::open_in_memory().expect("in-memory db");
        db.ping().expect("ping");
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::open_in_memory().expect("in-memory db");
        let conn = db.lock_conn().expect("lock");
        let enabled: bool = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("pragma");
        assert!(enabled);
    }

    #[test]
    fn clones_share_one_connection() {
        let db = Database::open_in_memory().expect("in-memory db");
        let other = db.clone();
        db.lock_conn()
            .expect("lock")
            .execute_batch("CREATE TABLE shared (v INTEGER);")
            .expect("create");

        let count: i64 = other
            .lock_conn()
            .expect("lock")
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'shared'",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(count, 1);
    }
}
