//! Schema migrations contributed by modules.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;
use crate::error::RepositoryError;

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

fn ensure_bookkeeping(conn: &Connection) -> Result<(), RepositoryError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            module     TEXT NOT NULL,
            id         TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (module, id)
        );",
    )
    .map_err(|e| RepositoryError::storage(format!("failed to create schema_migrations: {e}")))
}

fn is_applied(conn: &Connection, module: &str, id: &str) -> Result<bool, RepositoryError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM schema_migrations WHERE module = ?1 AND id = ?2",
            params![module, id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Applies every migration not yet recorded in `schema_migrations`.
///
/// Migrations run in the order given. Each one runs in its own transaction
/// together with its bookkeeping row. Returns how many were applied.
pub fn run_migrations(
    db: &Database,
    migrations: &[(String, Migration)],
) -> Result<usize, RepositoryError> {
    let mut conn = db.lock_conn()?;
    ensure_bookkeeping(&conn)?;

    let mut applied = 0;
    for (module, migration) in migrations {
        if is_applied(&conn, module, migration.id)? {
            tracing::debug!(module = %module, migration = migration.id, "migration already applied");
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(migration.up).map_err(|e| {
            RepositoryError::storage(format!(
                "migration {module}/{} failed: {e}",
                migration.id
            ))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (module, id) VALUES (?1, ?2)",
            params![module, migration.id],
        )?;
        tx.commit()?;

        tracing::info!(module = %module, migration = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
