//! gallery-seed - import painting rows from a JSON export

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gallery_common::config::GalleryConfig;
use gallery_common::db::init_database_pool;
use gallery_server::seed::import_json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gallery-seed")]
#[command(about = "Import painting rows into the gallery database")]
#[command(version)]
struct Args {
    /// JSON file holding an array of painting rows
    #[arg(env = "GALLERY_SEED_JSON", default_value = "./data/images.json")]
    json: PathBuf,

    /// SQLite database path (defaults to the configured one)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, env = "GALLERY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let database_path = match args.database {
        Some(path) => path,
        None => {
            GalleryConfig::load(args.config.as_deref())
                .context("Failed to load configuration")?
                .database_path
        }
    };
    info!("Database path: {}", database_path.display());

    let pool = init_database_pool(&database_path)
        .await
        .context("Failed to open database")?;
    let report = import_json(&pool, &args.json)
        .await
        .with_context(|| format!("Failed to import {}", args.json.display()))?;

    info!(
        "Seed complete: {} inserted, {} skipped",
        report.inserted, report.skipped
    );
    Ok(())
}
