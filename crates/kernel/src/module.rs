use async_trait::async_trait;
use axum::Router;

/// Context handed to modules during initialization and start-up
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Lifecycle contract every catalog module implements
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module, also its URL segment
    fn name(&self) -> &'static str;

    /// Called once during application startup, before any module is started
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes are mounted under `/api/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` + `components`) merged into the served document
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background work (schedules, timers)
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop background work; called in reverse registration order on shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
