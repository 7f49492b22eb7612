//! Book persistence: the repository port and its SQLite adapter.
//!
//! Reads come in two flavours. Plain reads return [`BookRecord`] with the raw
//! `autor_id`; the `*_with_author` variants resolve the author in the same
//! query through a `LEFT JOIN`.

use async_trait::async_trait;
use libreria_db::{Database, RepositoryError};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Book, BookRecord, SaveBook};
use crate::modules::autores::models::Author;

/// Column list for plain `libros` reads.
const COLS: &str = "id, titulo, isbn, stock, autor_id";

/// `libros` joined with its author; column order matches [`row_to_book`].
const JOINED_SELECT: &str = "\
    SELECT l.id, l.titulo, l.isbn, l.stock, \
           a.id, a.nombre, a.apellido, a.nacionalidad \
    FROM libros l LEFT JOIN autores a ON a.id = l.autor_id";

/// Data access for books.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<BookRecord>, RepositoryError>;

    async fn list_all_with_author(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<BookRecord>, RepositoryError>;

    async fn find_by_id_with_author(&self, id: i64) -> Result<Option<Book>, RepositoryError>;

    /// Exact-match lookup; when several books share a title the lowest id wins.
    async fn find_by_title(&self, titulo: &str) -> Result<Option<BookRecord>, RepositoryError>;

    async fn find_by_title_with_author(&self, titulo: &str)
        -> Result<Option<Book>, RepositoryError>;

    /// Inserts when `id` is unset, upserts otherwise. Returns the stored row
    /// with its author resolved.
    async fn save(&self, book: SaveBook) -> Result<Book, RepositoryError>;

    /// Deletes by id. Returns false if nothing was there.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Takes one copy out of stock if any is left.
    ///
    /// Returns the number of rows changed: 1 on success, 0 when the book is
    /// missing or its stock is already 0. Must be a single conditional write.
    async fn decrement_stock(&self, id: i64) -> Result<usize, RepositoryError>;
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookRecord> {
    Ok(BookRecord {
        id: row.get(0)?,
        titulo: row.get(1)?,
        isbn: row.get(2)?,
        stock: row.get(3)?,
        autor_id: row.get(4)?,
    })
}

fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    // A NULL author id means the join found nothing.
    let autor = match row.get::<_, Option<i64>>(4)? {
        Some(id) => Some(Author {
            id,
            nombre: row.get(5)?,
            apellido: row.get(6)?,
            nacionalidad: row.get(7)?,
        }),
        None => None,
    };

    Ok(Book {
        id: row.get(0)?,
        titulo: row.get(1)?,
        isbn: row.get(2)?,
        stock: row.get(3)?,
        autor,
    })
}

fn fetch_with_author(conn: &Connection, id: i64) -> Result<Option<Book>, RepositoryError> {
    let sql = format!("{JOINED_SELECT} WHERE l.id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_book).optional()?)
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository {
    db: Database,
}

impl SqliteBookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn list_all(&self) -> Result<Vec<BookRecord>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("SELECT {COLS} FROM libros ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let books = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    async fn list_all_with_author(&self) -> Result<Vec<Book>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("{JOINED_SELECT} ORDER BY l.id");
        let mut stmt = conn.prepare(&sql)?;
        let books = stmt
            .query_map([], row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<BookRecord>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("SELECT {COLS} FROM libros WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_record).optional()?)
    }

    async fn find_by_id_with_author(&self, id: i64) -> Result<Option<Book>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        fetch_with_author(&conn, id)
    }

    async fn find_by_title(&self, titulo: &str) -> Result<Option<BookRecord>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("SELECT {COLS} FROM libros WHERE titulo = ?1 ORDER BY id LIMIT 1");
        Ok(conn
            .query_row(&sql, params![titulo], row_to_record)
            .optional()?)
    }

    async fn find_by_title_with_author(
        &self,
        titulo: &str,
    ) -> Result<Option<Book>, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let sql = format!("{JOINED_SELECT} WHERE l.titulo = ?1 ORDER BY l.id LIMIT 1");
        Ok(conn
            .query_row(&sql, params![titulo], row_to_book)
            .optional()?)
    }

    async fn save(&self, book: SaveBook) -> Result<Book, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let id = match book.id {
            None => {
                conn.execute(
                    "INSERT INTO libros (titulo, isbn, stock, autor_id) VALUES (?1, ?2, ?3, ?4)",
                    params![book.titulo, book.isbn, book.stock, book.autor_id],
                )?;
                conn.last_insert_rowid()
            }
            Some(id) => {
                conn.execute(
                    "INSERT INTO libros (id, titulo, isbn, stock, autor_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(id) DO UPDATE SET titulo = excluded.titulo, \
                     isbn = excluded.isbn, stock = excluded.stock, autor_id = excluded.autor_id",
                    params![id, book.titulo, book.isbn, book.stock, book.autor_id],
                )?;
                id
            }
        };

        fetch_with_author(&conn, id)?
            .ok_or_else(|| RepositoryError::storage(format!("book {id} vanished after save")))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let affected = conn.execute("DELETE FROM libros WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    async fn decrement_stock(&self, id: i64) -> Result<usize, RepositoryError> {
        let conn = self.db.lock_conn()?;
        let affected = conn.execute(
            "UPDATE libros SET stock = stock - 1 WHERE id = ?1 AND stock > 0",
            params![id],
        )?;
        tracing::debug!(book_id = id, affected, "stock decrement");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::autores::models::SaveAuthor;
    use crate::modules::autores::repository::{AuthorRepository, SqliteAuthorRepository};
    use crate::modules::testing::migrated_db;

    struct Fixture {
        authors: SqliteAuthorRepository,
        books: SqliteBookRepository,
    }

    fn fixture() -> Fixture {
        let db = migrated_db();
        Fixture {
            authors: SqliteAuthorRepository::new(db.clone()),
            books: SqliteBookRepository::new(db),
        }
    }

    async fn gabo(f: &Fixture) -> Author {
        f.authors
            .save(SaveAuthor {
                id: None,
                nombre: "Gabriel".to_string(),
                apellido: "García Márquez".to_string(),
                nacionalidad: Some("Colombiana".to_string()),
            })
            .await
            .unwrap()
    }

    fn cien_anos(autor_id: Option<i64>, stock: i32) -> SaveBook {
        SaveBook {
            id: None,
            titulo: "Cien años de soledad".to_string(),
            isbn: "978-84-376-0494-7".to_string(),
            stock,
            autor_id,
        }
    }

    #[tokio::test]
    async fn save_then_find_round_trips_with_and_without_author() {
        let f = fixture();
        let autor = gabo(&f).await;
        let saved = f.books.save(cien_anos(Some(autor.id), 10)).await.unwrap();

        assert_eq!(saved.autor, Some(autor.clone()));
        assert_eq!(
            f.books.find_by_id_with_author(saved.id).await.unwrap(),
            Some(saved.clone())
        );
        assert_eq!(
            f.books.find_by_id(saved.id).await.unwrap(),
            Some(BookRecord {
                id: saved.id,
                titulo: saved.titulo.clone(),
                isbn: saved.isbn.clone(),
                stock: 10,
                autor_id: Some(autor.id),
            })
        );
    }

    #[tokio::test]
    async fn book_without_author_has_no_autor() {
        let f = fixture();
        let saved = f.books.save(cien_anos(None, 1)).await.unwrap();
        assert_eq!(saved.autor, None);

        let listed = f.books.list_all_with_author().await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn title_lookups_match_exactly() {
        let f = fixture();
        let autor = gabo(&f).await;
        let saved = f.books.save(cien_anos(Some(autor.id), 3)).await.unwrap();

        let eager = f
            .books
            .find_by_title_with_author("Cien años de soledad")
            .await
            .unwrap();
        assert_eq!(eager, Some(saved.clone()));

        let plain = f.books.find_by_title("Cien años de soledad").await.unwrap();
        assert_eq!(plain.map(|b| b.id), Some(saved.id));

        assert!(f.books.find_by_title("Cien años").await.unwrap().is_none());
        assert!(f
            .books
            .find_by_title_with_author("El otoño del patriarca")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_variants_agree_on_order() {
        let f = fixture();
        let first = f.books.save(cien_anos(None, 1)).await.unwrap();
        let second = f
            .books
            .save(SaveBook {
                titulo: "Rayuela".to_string(),
                isbn: "978-84-204-3747-1".to_string(),
                ..cien_anos(None, 2)
            })
            .await
            .unwrap();

        let plain: Vec<i64> = f.books.list_all().await.unwrap().iter().map(|b| b.id).collect();
        let eager: Vec<i64> = f
            .books
            .list_all_with_author()
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(plain, vec![first.id, second.id]);
        assert_eq!(eager, plain);
    }

    #[tokio::test]
    async fn save_with_id_replaces_fields() {
        let f = fixture();
        let autor = gabo(&f).await;
        let saved = f.books.save(cien_anos(None, 1)).await.unwrap();

        let updated = f
            .books
            .save(SaveBook {
                id: Some(saved.id),
                ..cien_anos(Some(autor.id), 7)
            })
            .await
            .unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.stock, 7);
        assert_eq!(updated.autor, Some(autor));
    }

    #[tokio::test]
    async fn decrement_stops_at_zero() {
        let f = fixture();
        let saved = f.books.save(cien_anos(None, 2)).await.unwrap();

        assert_eq!(f.books.decrement_stock(saved.id).await.unwrap(), 1);
        assert_eq!(f.books.decrement_stock(saved.id).await.unwrap(), 1);
        assert_eq!(f.books.decrement_stock(saved.id).await.unwrap(), 0);

        let record = f.books.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(record.stock, 0);
    }

    #[tokio::test]
    async fn ten_copies_sell_ten_times_then_refuse() {
        let f = fixture();
        let autor = gabo(&f).await;
        let saved = f.books.save(cien_anos(Some(autor.id), 10)).await.unwrap();

        for _ in 0..10 {
            assert_eq!(f.books.decrement_stock(saved.id).await.unwrap(), 1);
        }
        assert_eq!(f.books.decrement_stock(saved.id).await.unwrap(), 0);

        let book = f.books.find_by_id_with_author(saved.id).await.unwrap().unwrap();
        assert_eq!(book.stock, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decrements_never_oversell() {
        let f = fixture();
        let saved = f.books.save(cien_anos(None, 5)).await.unwrap();
        let books = std::sync::Arc::new(f.books);

        let mut handles = Vec::new();
        for _ in 0..12 {
            let books = books.clone();
            handles.push(tokio::spawn(async move {
                books.decrement_stock(saved.id).await.unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            successes += handle.await.unwrap();
        }

        assert_eq!(successes, 5);
        let record = books.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(record.stock, 0);
    }

    #[tokio::test]
    async fn decrement_on_missing_book_changes_nothing() {
        let f = fixture();
        assert_eq!(f.books.decrement_stock(999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_then_find_is_empty() {
        let f = fixture();
        let saved = f.books.save(cien_anos(None, 1)).await.unwrap();

        assert!(f.books.delete(saved.id).await.unwrap());
        assert!(f.books.find_by_id(saved.id).await.unwrap().is_none());
        assert!(!f.books.delete(saved.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_isbn_is_a_conflict() {
        let f = fixture();
        f.books.save(cien_anos(None, 1)).await.unwrap();
        let err = f
            .books
            .save(SaveBook {
                titulo: "Otra edición".to_string(),
                ..cien_anos(None, 1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn unknown_author_is_a_conflict() {
        let f = fixture();
        let err = f.books.save(cien_anos(Some(404), 1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn negative_stock_is_rejected_by_the_store() {
        let f = fixture();
        let err = f.books.save(cien_anos(None, -1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid { .. }));
    }

    #[tokio::test]
    async fn overlong_title_is_rejected_by_the_store() {
        let f = fixture();
        let err = f
            .books
            .save(SaveBook {
                titulo: "x".repeat(151),
                ..cien_anos(None, 1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid { .. }));
    }

    #[tokio::test]
    async fn isbn_length_is_not_capped() {
        let f = fixture();
        let isbn = "ISBN 978-84-376-0494-7";
        assert_eq!(isbn.len(), 22);

        let saved = f
            .books
            .save(SaveBook {
                isbn: isbn.to_string(),
                ..cien_anos(None, 1)
            })
            .await
            .unwrap();
        assert_eq!(saved.isbn, isbn);
    }

    #[tokio::test]
    async fn referenced_author_cannot_be_deleted() {
        let f = fixture();
        let autor = gabo(&f).await;
        f.books.save(cien_anos(Some(autor.id), 1)).await.unwrap();

        let err = f.authors.delete(autor.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
        assert!(f.authors.find_by_id(autor.id).await.unwrap().is_some());
    }
}
