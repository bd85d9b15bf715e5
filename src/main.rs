//! # Farmer Registry Main Entry Point
//!
//! `serve` (default), `migrate` and `seed [--demo]` subcommands.

use anyhow::Context;
use clap::{Parser, Subcommand};
use farmer_registry::{
    config::{AppConfig, ConfigLoader},
    db, seeds,
    server::run_server,
    telemetry,
};

#[derive(Parser)]
#[command(name = "farmer-registry")]
#[command(about = "Farmer registry API service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations, seed the configured admin and serve the API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Seed the configured admin account
    Seed {
        /// Also insert one demo farmer per kind and applicant status
        #[arg(long)]
        demo: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;
    telemetry::init_tracing(&config).context("Failed to initialize telemetry")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => {
            let db = db::init_pool(&config).await?;
            db::run_migrations(&db).await
        }
        Commands::Seed { demo } => {
            let db = db::init_pool(&config).await?;
            db::run_migrations(&db).await?;
            seeds::seed_admin(&db, &config).await?;
            if demo {
                let created = seeds::seed_demo(&db).await?;
                tracing::info!(created, "Demo farmers seeded");
            }
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;
    seeds::seed_admin(&db, &config).await?;
    run_server(config, db).await
}
