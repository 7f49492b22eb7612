pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use libreria_db::Database;
use libreria_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::SqliteAuthorRepository;
use service::AuthorService;

/// Authors module: CRUD over `autores`
pub struct AuthorsModule {
    service: AuthorService,
}

impl AuthorsModule {
    pub fn new(service: AuthorService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "autores"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(handlers::list_authors).post(handlers::create_author),
            )
            .route(
                "/{id}",
                get(handlers::get_author)
                    .put(handlers::update_author)
                    .delete(handlers::delete_author),
            )
            .route("/nombre/{nombre}", get(handlers::get_author_by_name))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let author_ref = json!({ "$ref": "#/components/schemas/Author" });
        let error_ref = json!({ "$ref": "#/components/schemas/ErrorResponse" });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "description": "Author identifier",
            "schema": { "type": "integer", "format": "int64" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List all authors",
                        "tags": ["Autores"],
                        "responses": {
                            "200": {
                                "description": "Authors in store order",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": author_ref }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Autores"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorPayload" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Author created",
                                "content": { "application/json": { "schema": author_ref } }
                            },
                            "400": {
                                "description": "nombre or apellido missing, or a field over its length limit",
                                "content": { "application/json": { "schema": error_ref } }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get an author by id",
                        "tags": ["Autores"],
                        "parameters": [id_param],
                        "responses": {
                            "200": {
                                "description": "Author found",
                                "content": { "application/json": { "schema": author_ref } }
                            },
                            "404": {
                                "description": "Author not found",
                                "content": { "application/json": { "schema": error_ref } }
                            }
                        }
                    },
                    "put": {
                        "summary": "Replace an author",
                        "tags": ["Autores"],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorPayload" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Author updated",
                                "content": { "application/json": { "schema": author_ref } }
                            },
                            "400": {
                                "description": "nombre or apellido missing, or a field over its length limit",
                                "content": { "application/json": { "schema": error_ref } }
                            },
                            "404": {
                                "description": "Author not found",
                                "content": { "application/json": { "schema": error_ref } }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete an author",
                        "tags": ["Autores"],
                        "parameters": [id_param],
                        "responses": {
                            "204": { "description": "Author deleted" },
                            "404": {
                                "description": "Author not found",
                                "content": { "application/json": { "schema": error_ref } }
                            },
                            "409": {
                                "description": "Books still reference this author",
                                "content": { "application/json": { "schema": error_ref } }
                            }
                        }
                    }
                },
                "/nombre/{nombre}": {
                    "get": {
                        "summary": "Get an author by exact name",
                        "tags": ["Autores"],
                        "parameters": [{
                            "name": "nombre",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "Author found",
                                "content": { "application/json": { "schema": author_ref } }
                            },
                            "404": {
                                "description": "No author with that name",
                                "content": { "application/json": { "schema": error_ref } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "nombre": { "type": "string", "maxLength": 100 },
                            "apellido": { "type": "string", "maxLength": 100 },
                            "nacionalidad": { "type": "string", "maxLength": 50 }
                        },
                        "required": ["id", "nombre", "apellido"]
                    },
                    "AuthorPayload": {
                        "type": "object",
                        "properties": {
                            "nombre": { "type": "string", "maxLength": 100 },
                            "apellido": { "type": "string", "maxLength": 100 },
                            "nacionalidad": { "type": "string", "maxLength": 50 }
                        },
                        "required": ["nombre", "apellido"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS autores (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    nombre       TEXT NOT NULL CHECK (length(nombre) BETWEEN 1 AND 100),
                    apellido     TEXT NOT NULL CHECK (length(apellido) BETWEEN 1 AND 100),
                    nacionalidad TEXT CHECK (nacionalidad IS NULL OR length(nacionalidad) <= 50)
                );
                CREATE INDEX IF NOT EXISTS idx_autores_nombre ON autores(nombre);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

/// Create the authors module backed by the given store
pub fn create_module(db: &Database) -> Arc<dyn Module> {
    let repository = Arc::new(SqliteAuthorRepository::new(db.clone()));
    Arc::new(AuthorsModule::new(AuthorService::new(repository)))
}
