//! Librería application library
//!
//! Author and book modules for the bookstore inventory, plus the bootstrap
//! that wires them to the store and the HTTP server.

// The OpenAPI fragments are large `json!` literals.
#![recursion_limit = "256"]

pub mod app;
pub mod modules;

pub use app::{bootstrap, build_registry, run};
