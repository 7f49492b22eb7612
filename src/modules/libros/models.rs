use serde::{Deserialize, Serialize};

use crate::modules::autores::models::Author;

/// A book with its author resolved, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier
    pub id: i64,
    /// Title, at most 150 characters
    pub titulo: String,
    /// Unique ISBN
    pub isbn: String,
    /// Copies on hand, never negative
    pub stock: i32,
    /// Author, if the book references one
    pub autor: Option<Author>,
}

/// A `libros` row without the author join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: i64,
    pub titulo: String,
    pub isbn: String,
    pub stock: i32,
    pub autor_id: Option<i64>,
}

/// Fields written by [`BookRepository::save`](super::repository::BookRepository::save).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveBook {
    pub id: Option<i64>,
    pub titulo: String,
    pub isbn: String,
    pub stock: i32,
    pub autor_id: Option<i64>,
}

/// Author reference inside a book payload; only the id is read.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRef {
    pub id: i64,
}

/// Request body for creating or replacing a book.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    pub titulo: Option<String>,
    pub isbn: Option<String>,
    pub stock: Option<i32>,
    pub autor: Option<AuthorRef>,
}
