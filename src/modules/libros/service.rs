use std::sync::Arc;

use libreria_db::RepositoryError;

use super::models::{Book, SaveBook};
use super::repository::BookRepository;

/// Book operations exposed to the HTTP layer.
///
/// Reads go through the author-resolving repository variants so responses
/// always carry the full author.
#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> Result<Vec<Book>, RepositoryError> {
        self.repository.list_all_with_author().await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Book>, RepositoryError> {
        self.repository.find_by_id_with_author(id).await
    }

    pub async fn find_by_title(&self, titulo: &str) -> Result<Option<Book>, RepositoryError> {
        self.repository.find_by_title_with_author(titulo).await
    }

    /// Existence check that skips the author join.
    pub async fn exists(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.repository.find_by_id(id).await?.is_some())
    }

    pub async fn save(&self, book: SaveBook) -> Result<Book, RepositoryError> {
        self.repository.save(book).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        self.repository.delete(id).await
    }

    /// True when a copy was taken out of stock.
    pub async fn decrement_stock(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.repository.decrement_stock(id).await? > 0)
    }
}
