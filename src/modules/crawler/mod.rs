use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use catalog_http::error::AppError;
use catalog_kernel::{InitCtx, Module};
use serde_json::json;
use tokio::sync::Mutex;

use crate::ingest::source::SourceDescription;
use crate::ingest::{DailySchedule, DailyTime, Orchestrator, Pipeline, RunReport, Source};

#[derive(Clone)]
struct CrawlerState {
    orchestrator: Arc<Orchestrator>,
    sources: Arc<[Source]>,
}

impl CrawlerState {
    /// The run lives on its own task: dropping the caller (a timed out or
    /// disconnected request) leaves it to finish.
    async fn run(&self, trigger: &'static str) -> anyhow::Result<RunReport> {
        tracing::info!(trigger, "scrape run requested");
        let state = self.clone();
        tokio::spawn(async move { state.orchestrator.run(&state.sources).await })
            .await
            .context("scrape run aborted")
    }
}

/// Manual and scheduled scrape triggers
pub struct CrawlerModule {
    state: CrawlerState,
    daily_at: DailyTime,
    schedule_enabled: bool,
    schedule: Mutex<Option<DailySchedule>>,
}

impl CrawlerModule {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            state: CrawlerState {
                orchestrator: pipeline.orchestrator,
                sources: pipeline.sources,
            },
            daily_at: pipeline.daily_at,
            schedule_enabled: pipeline.schedule_enabled,
            schedule: Mutex::new(None),
        }
    }

    pub async fn is_scheduled(&self) -> bool {
        self.schedule.lock().await.is_some()
    }
}

#[async_trait]
impl Module for CrawlerModule {
    fn name(&self) -> &'static str {
        "crawler"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/run", post(run_now))
            .route("/sources", get(list_sources))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/run": {
                    "post": {
                        "summary": "Scrape every configured source now",
                        "tags": ["Crawler"],
                        "responses": {
                            "200": {
                                "description": "Per-source run report",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/RunReport" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/sources": {
                    "get": {
                        "summary": "List configured scrape sources",
                        "tags": ["Crawler"],
                        "responses": { "200": { "description": "Configured sources" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RunReport": {
                        "type": "object",
                        "properties": {
                            "started_at": { "type": "string", "format": "date-time" },
                            "finished_at": { "type": "string", "format": "date-time" },
                            "sources": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "source": { "type": "string" },
                                        "url": { "type": "string" },
                                        "extracted": { "type": "integer" },
                                        "in_scope": { "type": "integer" },
                                        "duplicates": { "type": "integer" },
                                        "skipped": { "type": "integer" },
                                        "failed": { "type": "integer" },
                                        "scraped": { "type": "integer" },
                                        "error": { "type": "string", "nullable": true }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if !self.schedule_enabled {
            tracing::info!("daily scrape disabled");
            return Ok(());
        }
        if self.state.sources.is_empty() {
            tracing::warn!("no scrape sources configured, daily scrape not started");
            return Ok(());
        }

        let state = self.state.clone();
        let schedule = DailySchedule::start(self.daily_at, move || {
            let state = state.clone();
            async move {
                if let Err(err) = state.run("schedule").await {
                    tracing::error!(error = %err, "scheduled scrape failed");
                }
            }
        })
        .await?;

        *self.schedule.lock().await = Some(schedule);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if let Some(schedule) = self.schedule.lock().await.take() {
            schedule.shutdown().await?;
        }
        Ok(())
    }
}

async fn run_now(State(state): State<CrawlerState>) -> Result<Json<RunReport>, AppError> {
    let report = state.run("manual").await.map_err(AppError::Internal)?;
    Ok(Json(report))
}

async fn list_sources(State(state): State<CrawlerState>) -> Json<Vec<SourceDescription>> {
    Json(state.sources.iter().map(Source::describe).collect())
}

pub fn create_module(pipeline: Pipeline) -> Arc<dyn Module> {
    Arc::new(CrawlerModule::new(pipeline))
}
