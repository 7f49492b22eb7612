//! Author persistence: the repository port and its SQLite adapter.

use async_trait::async_trait;
use libreria_db::{Database, RepositoryError};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Author, SaveAuthor};

/// Column list shared across author SELECTs.
const COLS: &str = "id, nombre, apellido, nacionalidad";

/// Data access for authors.
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// All authors in store order.
    async fn list_all(&self) -> Result<Vec<Author>, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepositoryError>;

    /// Exact-match lookup; when several authors share a name the lowest id wins.
    async fn find_by_name(&self, nombre: &str) -> Result<Option<Author>, RepositoryError>;

    /// Inserts when `id` is unset, upserts otherwise. Returns the stored row.
    async fn save(&self, author: SaveAuthor) -> Result<Author, RepositoryError>;

    /// Deletes by id. Returns false if nothing was there.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;
}

/// Maps a SQLite row selected with [`COLS`] to an `Author`.
fn row_to_author(row: &rusqlite::Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        nombre: row.get(1)?,
        apellido: row.get(2)?,
        nacionalidad: row.get(3)?,
    })
}

fn fetch(conn: &Connection, id: i64) -> Result<Option<Author>, RepositoryError> {
    let sql = format!("SELECT {COLS} FROM autores WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_author).optional()?)
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository {
    db: Database,
}

impl SqliteAuthorRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for SqliteAuthorRepository {
    async fn list_all(&self) -> Result<Vec<Author>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("SELECT {COLS} FROM autores ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let authors = stmt
            .query_map([], row_to_author)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(authors)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        fetch(&conn, id)
    }

    async fn find_by_name(&self, nombre: &str) -> Result<Option<Author>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("SELECT {COLS} FROM autores WHERE nombre = ?1 ORDER BY id LIMIT 1");
        Ok(conn
            .query_row(&sql, params![nombre], row_to_author)
            .optional()?)
    }

    async fn save(&self, author: SaveAuthor) -> Result<Author, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let id = match author.id {
            None => {
                conn.execute(
                    "INSERT INTO autores (nombre, apellido, nacionalidad) VALUES (?1, ?2, ?3)",
                    params![author.nombre, author.apellido, author.nacionalidad],
                )?;
                conn.last_insert_rowid()
            }
            Some(id) => {
                conn.execute(
                    "INSERT INTO autores (id, nombre, apellido, nacionalidad) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(id) DO UPDATE SET nombre = excluded.nombre, \
                     apellido = excluded.apellido, nacionalidad = excluded.nacionalidad",
                    params![id, author.nombre, author.apellido, author.nacionalidad],
                )?;
                id
            }
        };

        fetch(&conn, id)?
            .ok_or_else(|| RepositoryError::storage(format!("author {id} vanished after save")))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let affected = conn.execute("DELETE FROM autores WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::migrated_db;

    fn repo() -> SqliteAuthorRepository {
        SqliteAuthorRepository::new(migrated_db())
    }

    fn gabo() -> SaveAuthor {
        SaveAuthor {
            id: None,
            nombre: "Gabriel".to_string(),
            apellido: "García Márquez".to_string(),
            nacionalidad: Some("Colombiana".to_string()),
        }
    }

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let repo = repo();
        let saved = repo.save(gabo()).await.unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.nombre, "Gabriel");

        let found = repo.find_by_id(saved.id).await.unwrap();
        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn save_with_id_updates_in_place() {
        let repo = repo();
        let saved = repo.save(gabo()).await.unwrap();

        let updated = repo
            .save(SaveAuthor {
                id: Some(saved.id),
                nacionalidad: None,
                ..gabo()
            })
            .await
            .unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.nacionalidad, None);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_with_unknown_id_inserts_that_id() {
        let repo = repo();
        let saved = repo
            .save(SaveAuthor {
                id: Some(42),
                ..gabo()
            })
            .await
            .unwrap();
        assert_eq!(saved.id, 42);
    }

    #[tokio::test]
    async fn list_all_keeps_insertion_order() {
        let repo = repo();
        let first = repo.save(gabo()).await.unwrap();
        let second = repo
            .save(SaveAuthor {
                nombre: "Isabel".to_string(),
                apellido: "Allende".to_string(),
                nacionalidad: Some("Chilena".to_string()),
                ..gabo()
            })
            .await
            .unwrap();

        let ids: Vec<i64> = repo.list_all().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn find_by_name_returns_lowest_id_on_ties() {
        let repo = repo();
        let first = repo.save(gabo()).await.unwrap();
        repo.save(SaveAuthor {
            apellido: "Mistral".to_string(),
            ..gabo()
        })
        .await
        .unwrap();

        let found = repo.find_by_name("Gabriel").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(repo.find_by_name("Jorge Luis").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_then_find_is_empty() {
        let repo = repo();
        let saved = repo.save(gabo()).await.unwrap();

        assert!(repo.delete(saved.id).await.unwrap());
        assert!(repo.find_by_id(saved.id).await.unwrap().is_none());
        assert!(!repo.delete(saved.id).await.unwrap());
    }

    #[tokio::test]
    async fn overlong_name_is_rejected_by_the_store() {
        let repo = repo();
        let err = repo
            .save(SaveAuthor {
                nombre: "x".repeat(101),
                ..gabo()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid { .. }));

        let err = repo
            .save(SaveAuthor {
                nacionalidad: Some("x".repeat(51)),
                ..gabo()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid { .. }));
    }
}
