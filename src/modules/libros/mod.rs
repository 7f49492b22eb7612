pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, put},
    Router,
};
use libreria_db::Database;
use libreria_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::SqliteBookRepository;
use service::BookService;

/// Books module: CRUD over `libros` plus the stock decrement
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "libros"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_books).post(handlers::create_book))
            .route(
                "/{id}",
                get(handlers::get_book)
                    .put(handlers::update_book)
                    .delete(handlers::delete_book),
            )
            .route("/titulo/{titulo}", get(handlers::get_book_by_title))
            .route("/decrementar-stock/{id}", put(handlers::decrement_stock))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_ref = json!({ "$ref": "#/components/schemas/Book" });
        let payload_ref = json!({ "$ref": "#/components/schemas/BookPayload" });
        let error_ref = json!({ "$ref": "#/components/schemas/ErrorResponse" });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "description": "Book identifier",
            "schema": { "type": "integer", "format": "int64" }
        });
        let error = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": error_ref.clone() } }
            })
        };
        let found = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": book_ref.clone() } }
            })
        };
        let body = json!({
            "required": true,
            "content": { "application/json": { "schema": payload_ref } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List all books with their authors",
                        "tags": ["Libros"],
                        "responses": {
                            "200": {
                                "description": "Books in store order",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": book_ref }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Libros"],
                        "requestBody": body,
                        "responses": {
                            "201": found("Book created"),
                            "400": error("titulo or isbn missing, negative stock, or titulo over 150 characters"),
                            "409": error("Duplicate isbn or unknown author")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by id",
                        "tags": ["Libros"],
                        "parameters": [id_param],
                        "responses": {
                            "200": found("Book found"),
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Libros"],
                        "parameters": [id_param],
                        "requestBody": body,
                        "responses": {
                            "200": found("Book updated"),
                            "400": error("titulo or isbn missing, negative stock, or titulo over 150 characters"),
                            "404": error("Book not found"),
                            "409": error("Duplicate isbn or unknown author")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Libros"],
                        "parameters": [id_param],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "404": error("Book not found")
                        }
                    }
                },
                "/titulo/{titulo}": {
                    "get": {
                        "summary": "Get a book by exact title",
                        "tags": ["Libros"],
                        "parameters": [{
                            "name": "titulo",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": found("Book found"),
                            "404": error("No book with that title")
                        }
                    }
                },
                "/decrementar-stock/{id}": {
                    "put": {
                        "summary": "Sell one copy",
                        "description": "Atomically lowers stock by one when stock is positive.",
                        "tags": ["Libros"],
                        "parameters": [id_param],
                        "responses": {
                            "200": found("Stock decremented"),
                            "400": error("Stock already 0 (code out_of_stock)"),
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "titulo": { "type": "string", "maxLength": 150 },
                            "isbn": { "type": "string", "minLength": 1 },
                            "stock": { "type": "integer", "minimum": 0 },
                            "autor": {
                                "oneOf": [
                                    { "$ref": "#/components/schemas/Author" },
                                    { "type": "null" }
                                ]
                            }
                        },
                        "required": ["id", "titulo", "isbn", "stock"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "titulo": { "type": "string", "maxLength": 150 },
                            "isbn": { "type": "string", "minLength": 1 },
                            "stock": { "type": "integer", "minimum": 0, "default": 0 },
                            "autor": {
                                "type": "object",
                                "properties": { "id": { "type": "integer", "format": "int64" } },
                                "required": ["id"]
                            }
                        },
                        "required": ["titulo", "isbn"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_init",
                up: r#"
                CREATE TABLE IF NOT EXISTS libros (
                    id       INTEGER PRIMARY KEY AUTOINCREMENT,
                    titulo   TEXT NOT NULL CHECK (length(titulo) BETWEEN 1 AND 150),
                    isbn     TEXT NOT NULL CHECK (length(isbn) >= 1),
                    stock    INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
                    autor_id INTEGER REFERENCES autores(id) ON DELETE RESTRICT
                );
                CREATE INDEX IF NOT EXISTS idx_libros_titulo ON libros(titulo);
                CREATE INDEX IF NOT EXISTS idx_libros_autor_id ON libros(autor_id);
                "#,
            },
            Migration {
                id: "002_isbn_unique",
                up: "CREATE UNIQUE INDEX IF NOT EXISTS libros_isbn_unique ON libros(isbn);",
            },
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by the given store
pub fn create_module(db: &Database) -> Arc<dyn Module> {
    let repository = Arc::new(SqliteBookRepository::new(db.clone()));
    Arc::new(BooksModule::new(BookService::new(repository)))
}
