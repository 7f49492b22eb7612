//! SQLite storage for the librería service.
//!
//! Holds the shared connection handle, the migration runner and the error
//! type every repository returns.

pub mod database;
pub mod error;
pub mod migrations;

pub use database::Database;
pub use error::RepositoryError;
pub use migrations::{run_migrations, Migration};
