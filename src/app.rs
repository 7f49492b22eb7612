//! Application bootstrap: store, module registry and server lifecycle.

use anyhow::Context;
use libreria_db::Database;
use libreria_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry holding every module, wired to the given store.
pub fn build_registry(db: &Database) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, db);
    registry
}

/// Open the configured SQLite store and check it answers.
pub fn open_database(settings: &Settings) -> anyhow::Result<Database> {
    let db = Database::open(&settings.database.path, settings.database.busy_timeout())
        .with_context(|| format!("failed to open database at {}", settings.database.path))?;
    db.ping().context("database did not answer ping")?;
    Ok(db)
}

/// Apply pending migrations without starting anything. Returns how many ran.
pub fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let db = open_database(settings)?;
    let registry = build_registry(&db);
    registry.migrate(&db)
}

/// Open the store, then init, migrate and start every module.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<(Database, ModuleRegistry)> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "libreria bootstrap starting"
    );

    let db = open_database(settings)?;
    let registry = build_registry(&db);
    let ctx = InitCtx {
        settings,
        db: &db,
    };

    registry.init_modules(&ctx).await?;
    let applied = registry.migrate(&db)?;
    tracing::info!(applied, "migrations up to date");
    registry.start_modules(&ctx).await?;

    tracing::info!("libreria bootstrap complete");
    Ok((db, registry))
}

/// Bootstrap, serve HTTP until shutdown, then stop modules in reverse order.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let (_db, registry) = bootstrap(&settings).await?;

    let served = libreria_http::start_server(&registry, &settings.server).await;
    registry.stop_modules().await?;
    served
}
