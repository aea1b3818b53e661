//! Book catalog application: moderated listing plus scrape ingestion.

pub mod ingest;
pub mod moderation;
pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use catalog_db::{CatalogStore, MemoryStore};
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use ingest::Pipeline;
use moderation::ModerationQueue;

/// Validate settings and register every module against one shared store.
pub fn build_registry(
    settings: &Settings,
    store: Arc<dyn CatalogStore>,
) -> anyhow::Result<ModuleRegistry> {
    let pipeline = Pipeline::from_settings(&settings.scraper, store.clone())?;
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, ModerationQueue::new(store), pipeline)?;
    Ok(registry)
}

/// Run the HTTP service with the daily scrape until a shutdown signal.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let store: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
    let registry = build_registry(settings, store)?;
    let ctx = InitCtx { settings };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = catalog_http::start_server(&registry, settings).await;
    let stopped = registry.stop_all().await;

    served.context("catalog service failed")?;
    stopped
}
