//! Scrape ingestion: fetch a listing page, extract candidates, keep the
//! in-scope ones, drop duplicates, and queue the rest for moderation.

pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod orchestrator;
pub mod schedule;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use catalog_db::CatalogStore;
use catalog_kernel::settings::ScraperSettings;

pub use extract::{extract, RawCandidate, ReleaseDate};
pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use filter::{TopicalFilter, DEFAULT_KEYWORDS};
pub use orchestrator::{Orchestrator, RunReport, SourceReport};
pub use schedule::{DailySchedule, DailyTime};
pub use source::{compile_sources, Source};

/// Everything needed to run scrapes, validated from settings.
pub struct Pipeline {
    pub orchestrator: Arc<Orchestrator>,
    pub sources: Arc<[Source]>,
    pub daily_at: DailyTime,
    pub schedule_enabled: bool,
}

impl Pipeline {
    /// Validate the scraper settings and wire an HTTP-backed orchestrator.
    pub fn from_settings(
        settings: &ScraperSettings,
        store: Arc<dyn CatalogStore>,
    ) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(
            Duration::from_millis(settings.fetch_timeout_ms),
            &settings.user_agent,
        )?;
        Self::with_fetcher(settings, store, Arc::new(fetcher))
    }

    pub fn with_fetcher(
        settings: &ScraperSettings,
        store: Arc<dyn CatalogStore>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> anyhow::Result<Self> {
        let sources = compile_sources(&settings.sources).context("invalid scraper source")?;
        let daily_at: DailyTime = settings.daily_at.parse()?;
        let filter = match &settings.keywords {
            Some(keywords) => TopicalFilter::new(keywords),
            None => TopicalFilter::default(),
        };

        tracing::info!(
            sources = sources.len(),
            keywords = filter.keywords().len(),
            schedule = %daily_at,
            schedule_enabled = settings.schedule_enabled,
            "scrape pipeline configured"
        );

        Ok(Self {
            orchestrator: Arc::new(Orchestrator::new(fetcher, store, filter)),
            sources: sources.into(),
            daily_at,
            schedule_enabled: settings.schedule_enabled,
        })
    }

    /// One run over every configured source.
    pub async fn run(&self) -> RunReport {
        self.orchestrator.run(&self.sources).await
    }
}
