//! `libreria` command-line entrypoint.

use anyhow::Context;
use clap::{Parser, Subcommand};
use libreria_db::Database;
use libreria_kernel::settings::Settings;

/// Librería inventory service: authors, books and stock.
#[derive(Debug, Parser)]
#[command(name = "libreria", version, about)]
struct Cli {
    /// SQLite path, overriding `database.path` from configuration.
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bootstrap every module and serve the HTTP API.
    Serve {
        /// Port to listen on, overriding `server.port`.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending migrations and exit.
    Migrate,
    /// Print the merged OpenAPI document as JSON.
    Openapi,
}

fn load_settings(database: Option<String>) -> anyhow::Result<Settings> {
    let mut settings = Settings::load().context("failed to load Librería settings")?;
    if let Some(path) = database {
        settings.database.path = path;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut settings = load_settings(cli.database)?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            libreria_telemetry::init(&settings.telemetry)?;
            libreria_app::run(settings).await
        }
        Commands::Migrate => {
            let settings = load_settings(cli.database)?;
            libreria_telemetry::init(&settings.telemetry)?;
            let applied = libreria_app::app::migrate(&settings)?;
            tracing::info!(applied, db = %settings.database.path, "migrations finished");
            println!("applied {applied} migrations");
            Ok(())
        }
        Commands::Openapi => {
            // No telemetry here: stdout carries the document.
            let db = Database::open_in_memory().context("failed to open scratch database")?;
            let registry = libreria_app::build_registry(&db);
            let document = libreria_http::openapi::document(&registry);
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
    }
}
