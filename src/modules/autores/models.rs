use serde::{Deserialize, Serialize};

/// An author as stored in `autores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Store-assigned identifier
    pub id: i64,
    /// Given name, at most 100 characters
    pub nombre: String,
    /// Surname, at most 100 characters
    pub apellido: String,
    /// Nationality, at most 50 characters
    #[serde(default)]
    pub nacionalidad: Option<String>,
}

/// Fields written by [`AuthorRepository::save`](super::repository::AuthorRepository::save).
///
/// Without an `id` the store assigns one; with an `id` the row is upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAuthor {
    pub id: Option<i64>,
    pub nombre: String,
    pub apellido: String,
    pub nacionalidad: Option<String>,
}

/// Request body for creating or replacing an author.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorPayload {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub nacionalidad: Option<String>,
}
