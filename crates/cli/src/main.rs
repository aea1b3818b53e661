use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use catalog_app::ingest::{compile_sources, Pipeline, Source};
use catalog_db::MemoryStore;
use catalog_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "catalog", version, about = "Book catalog service and scraper")]
struct Cli {
    /// Directory holding base.toml and the per-environment overlays.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to apply (local, staging, production).
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service with the daily scrape.
    Serve,

    /// Scrape every configured source once and print the run report.
    Crawl,

    /// Validate and list the configured scrape sources.
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli).context("failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve => catalog_app::serve(&settings).await,
        Commands::Crawl => crawl(&settings).await,
        Commands::Sources => list_sources(&settings),
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    match (&cli.config_dir, &cli.env) {
        (None, None) => Settings::load(),
        (dir, env) => {
            let dir = match dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir()?.join("config"),
            };
            Settings::load_from(&dir, env.as_deref().unwrap_or("local"))
        }
    }
}

async fn crawl(settings: &Settings) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::from_settings(&settings.scraper, store.clone())?;
    let report = pipeline.run().await;

    tracing::info!(
        scraped = report.total_scraped(),
        failed_sources = report.failed_sources(),
        pending = store.len().await,
        "crawl finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn list_sources(settings: &Settings) -> anyhow::Result<()> {
    let sources = compile_sources(&settings.scraper.sources)?;
    let described: Vec<_> = sources.iter().map(Source::describe).collect();
    println!("{}", serde_json::to_string_pretty(&described)?);
    Ok(())
}
