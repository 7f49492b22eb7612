pub mod autores;
pub mod libros;

use libreria_db::Database;
use libreria_kernel::ModuleRegistry;

/// Register all project modules with the registry.
///
/// `autores` goes first so its routes and lifecycle hooks precede `libros`.
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register(autores::create_module(db));
    registry.register(libros::create_module(db));
}
