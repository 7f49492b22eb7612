use std::sync::Arc;

use libreria_db::RepositoryError;

use super::models::{Author, SaveAuthor};
use super::repository::AuthorRepository;

/// Author operations exposed to the HTTP layer.
#[derive(Clone)]
pub struct AuthorService {
    repository: Arc<dyn AuthorRepository>,
}

impl AuthorService {
    pub fn new(repository: Arc<dyn AuthorRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> Result<Vec<Author>, RepositoryError> {
        self.repository.list_all().await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Author>, RepositoryError> {
        self.repository.find_by_id(id).await
    }

    pub async fn find_by_name(&self, nombre: &str) -> Result<Option<Author>, RepositoryError> {
        self.repository.find_by_name(nombre).await
    }

    pub async fn save(&self, author: SaveAuthor) -> Result<Author, RepositoryError> {
        self.repository.save(author).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        self.repository.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::autores::repository::SqliteAuthorRepository;
    use crate::modules::testing::migrated_db;

    fn service() -> AuthorService {
        AuthorService::new(Arc::new(SqliteAuthorRepository::new(migrated_db())))
    }

    fn borges() -> SaveAuthor {
        SaveAuthor {
            id: None,
            nombre: "Jorge Luis".to_string(),
            apellido: "Borges".to_string(),
            nacionalidad: Some("Argentina".to_string()),
        }
    }

    #[tokio::test]
    async fn lookups_on_missing_rows_are_empty_not_errors() {
        let service = service();
        assert!(service.list_all().await.unwrap().is_empty());
        assert!(service.find_by_id(1).await.unwrap().is_none());
        assert!(service.find_by_name("Nadie").await.unwrap().is_none());
        assert!(!service.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn saved_author_is_found_by_id_and_name() {
        let service = service();
        let saved = service.save(borges()).await.unwrap();

        assert_eq!(service.find_by_id(saved.id).await.unwrap(), Some(saved.clone()));
        assert_eq!(
            service.find_by_name("Jorge Luis").await.unwrap(),
            Some(saved)
        );
    }
}
