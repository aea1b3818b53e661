use std::sync::Arc;

use catalog_db::CatalogStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::dedup::is_duplicate;
use super::extract::{extract, RawCandidate};
use super::fetch::PageFetcher;
use super::filter::TopicalFilter;
use super::source::Source;
use crate::moderation::ModerationQueue;

/// Outcome of one source within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub url: String,
    /// Entry containers found on the page.
    pub extracted: usize,
    /// Candidates that passed the topical filter.
    pub in_scope: usize,
    pub duplicates: usize,
    /// In-scope candidates without a title.
    pub skipped: usize,
    /// Candidates the store refused.
    pub failed: usize,
    /// Newly persisted pending entries.
    pub scraped: usize,
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: &Source) -> Self {
        Self {
            source: source.name.clone(),
            url: source.url.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn total_scraped(&self) -> usize {
        self.sources.iter().map(|report| report.scraped).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|report| report.error.is_some())
            .count()
    }
}

enum Outcome {
    Persisted,
    Duplicate,
}

/// Drives fetch, extract, filter, dedup and enqueue for each configured source.
pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    queue: ModerationQueue,
    filter: TopicalFilter,
    run_lock: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn CatalogStore>,
        filter: TopicalFilter,
    ) -> Self {
        Self {
            fetcher,
            queue: ModerationQueue::new(store),
            filter,
            run_lock: Mutex::new(()),
        }
    }

    pub fn filter(&self) -> &TopicalFilter {
        &self.filter
    }

    /// Process every source in order and report on each.
    ///
    /// Never fails: a broken source only shows up as that source's `error`.
    /// Concurrent calls queue up behind one another so their dedup checks
    /// cannot interleave.
    pub async fn run(&self, sources: &[Source]) -> RunReport {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();
        tracing::info!(sources = sources.len(), "scrape run started");

        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            reports.push(self.run_source(source).await);
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            sources: reports,
        };
        tracing::info!(
            scraped = report.total_scraped(),
            failed_sources = report.failed_sources(),
            "scrape run finished"
        );
        report
    }

    async fn run_source(&self, source: &Source) -> SourceReport {
        let mut report = SourceReport::new(source);

        let html = match self.fetcher.fetch(&source.url).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(source = %source.name, error = %err, "source fetch failed");
                report.error = Some(err.to_string());
                return report;
            }
        };

        let candidates = extract(&html, &source.url, &source.locators, &source.name);
        report.extracted = candidates.len();

        for candidate in candidates {
            if !self.filter.is_in_scope(&candidate) {
                continue;
            }
            report.in_scope += 1;

            if candidate.title.is_empty() {
                report.skipped += 1;
                continue;
            }

            let title = candidate.title.clone();
            match self.persist(candidate).await {
                Ok(Outcome::Persisted) => report.scraped += 1,
                Ok(Outcome::Duplicate) => report.duplicates += 1,
                Err(err) => {
                    tracing::warn!(
                        source = %source.name,
                        title = %title,
                        error = %err,
                        "failed to persist candidate"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            source = %source.name,
            extracted = report.extracted,
            in_scope = report.in_scope,
            scraped = report.scraped,
            duplicates = report.duplicates,
            "source scraped"
        );
        report
    }

    async fn persist(&self, candidate: RawCandidate) -> catalog_db::Result<Outcome> {
        if is_duplicate(&candidate, self.queue.store()).await? {
            return Ok(Outcome::Duplicate);
        }
        self.queue.enqueue(candidate.into_draft()).await?;
        Ok(Outcome::Persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fetch::testing::StaticFetcher;
    use crate::ingest::source::sample_settings;
    use async_trait::async_trait;
    use catalog_db::{
        CatalogEntry, DbError, EntryDraft, EntryFilter, MemoryStore, Status,
    };
    use uuid::Uuid;

    const SOURCE_A: &str = "https://a.example.com/new-books";
    const SOURCE_B: &str = "https://b.example.com/new-books";

    fn entry_html(title: &str, author: &str, blurb: &str) -> String {
        format!(
            r#"<div class="book-entry">
                 <span class="title">{title}</span>
                 <span class="author">{author}</span>
                 <p class="description">{blurb}</p>
                 <span class="date">2024-01-15</span>
               </div>"#
        )
    }

    fn page(entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(title, author, blurb)| entry_html(title, author, blurb))
            .collect();
        format!("<html><body>{body}</body></html>")
    }

    fn source(name: &str, url: &str) -> Source {
        Source::from_settings(&sample_settings(name, url)).unwrap()
    }

    fn orchestrator(fetcher: StaticFetcher, store: Arc<dyn CatalogStore>) -> Orchestrator {
        Orchestrator::new(Arc::new(fetcher), store, TopicalFilter::default())
    }

    #[tokio::test]
    async fn network_failure_is_reported_and_skipped() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default()
            .with_unreachable(SOURCE_A)
            .with_page(SOURCE_B, &page(&[("Jewish Folk Tales", "Nathan Ausubel", "")]));
        let orchestrator = orchestrator(fetcher, store.clone());

        let report = orchestrator
            .run(&[source("Publisher A", SOURCE_A), source("Publisher B", SOURCE_B)])
            .await;

        let a = &report.sources[0];
        let error = a.error.as_deref().unwrap();
        assert!(error.starts_with("request to"), "{error}");
        assert!(error.contains(SOURCE_A), "{error}");
        assert_eq!((a.extracted, a.scraped), (0, 0));

        assert_eq!(report.sources[1].scraped, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn failing_source_does_not_stop_the_others() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default().with_page(
            SOURCE_B,
            &page(&[
                ("Jewish Folk Tales", "Nathan Ausubel", ""),
                ("A Hebrew Primer", "Ruth Levi", ""),
                ("Bread", "Sam Baker", "Recipes from a Yiddish kitchen"),
            ]),
        );
        let orchestrator = orchestrator(fetcher, store.clone());

        let report = orchestrator
            .run(&[source("Publisher A", SOURCE_A), source("Publisher B", SOURCE_B)])
            .await;

        assert_eq!(report.sources.len(), 2);
        let a = &report.sources[0];
        assert_eq!(a.source, "Publisher A");
        assert!(a.error.as_deref().unwrap().contains("503"));
        assert_eq!(a.scraped, 0);

        let b = &report.sources[1];
        assert_eq!(b.error, None);
        assert_eq!(b.scraped, 3);
        assert_eq!(report.failed_sources(), 1);

        let pending = store
            .find(&EntryFilter::with_status(Status::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 3);
        assert!(pending.iter().all(|entry| entry.publisher == "Publisher B"));
    }

    #[tokio::test]
    async fn out_of_scope_candidates_are_dropped() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default().with_page(
            SOURCE_A,
            &page(&[
                ("Introduction to Zionist Thought", "Walter Laqueur", ""),
                ("Gardening for Beginners", "Pat Green", ""),
            ]),
        );
        let orchestrator = orchestrator(fetcher, store.clone());

        let report = orchestrator.run(&[source("Sample Publisher", SOURCE_A)]).await;

        assert_eq!(report.sources[0].extracted, 2);
        assert_eq!(report.sources[0].in_scope, 1);
        let all = store.find(&EntryFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Introduction to Zionist Thought");
        assert_eq!(all[0].status, Status::Pending);
        assert_eq!(
            all[0].release_date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[tokio::test]
    async fn second_run_persists_nothing_new() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default().with_page(
            SOURCE_A,
            &page(&[
                ("The Talmud: A Biography", "Harry Freedman", ""),
                ("Holocaust Testimonies", "Lawrence Langer", ""),
            ]),
        );
        let orchestrator = orchestrator(fetcher, store.clone());
        let sources = [source("Sample Publisher", SOURCE_A)];

        let first = orchestrator.run(&sources).await;
        assert_eq!(first.total_scraped(), 2);

        let second = orchestrator.run(&sources).await;
        assert_eq!(second.total_scraped(), 0);
        assert_eq!(second.sources[0].duplicates, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn existing_approved_entry_blocks_rescrape() {
        let existing = CatalogEntry::pending(EntryDraft {
            title: "Jewish Folk Tales".to_string(),
            author: "Nathan Ausubel".to_string(),
            ..EntryDraft::default()
        });
        let id = existing.id;
        let store = Arc::new(MemoryStore::with_entries([existing]));
        store.update_status(id, Status::Approved).await.unwrap();

        let fetcher = StaticFetcher::default()
            .with_page(SOURCE_A, &page(&[("Jewish Folk Tales", "Nathan Ausubel", "")]));
        let report = orchestrator(fetcher, store.clone())
            .run(&[source("Sample Publisher", SOURCE_A)])
            .await;

        assert_eq!(report.sources[0].duplicates, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn repeated_entry_within_one_page_is_stored_once() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default().with_page(
            SOURCE_A,
            &page(&[
                ("Jewish Folk Tales", "Nathan Ausubel", ""),
                ("Jewish Folk Tales", "Nathan Ausubel", ""),
            ]),
        );
        let report = orchestrator(fetcher, store.clone())
            .run(&[source("Sample Publisher", SOURCE_A)])
            .await;

        assert_eq!(report.sources[0].scraped, 1);
        assert_eq!(report.sources[0].duplicates, 1);
    }

    #[tokio::test]
    async fn untitled_candidates_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default()
            .with_page(SOURCE_A, &page(&[("", "Anon", "Notes on Jewish liturgy")]));
        let report = orchestrator(fetcher, store.clone())
            .run(&[source("Sample Publisher", SOURCE_A)])
            .await;

        assert_eq!(report.sources[0].in_scope, 1);
        assert_eq!(report.sources[0].skipped, 1);
        assert!(store.is_empty().await);
    }

    /// Refuses inserts for one title, otherwise delegates to a memory store.
    struct FlakyStore {
        inner: MemoryStore,
        reject_title: &'static str,
    }

    #[async_trait]
    impl CatalogStore for FlakyStore {
        async fn find_one(
            &self,
            title: &str,
            author: &str,
        ) -> catalog_db::Result<Option<CatalogEntry>> {
            self.inner.find_one(title, author).await
        }

        async fn insert(&self, entry: CatalogEntry) -> catalog_db::Result<()> {
            if entry.title == self.reject_title {
                return Err(DbError::Backend("write rejected".to_string()));
            }
            self.inner.insert(entry).await
        }

        async fn update_status(&self, id: Uuid, status: Status) -> catalog_db::Result<CatalogEntry> {
            self.inner.update_status(id, status).await
        }

        async fn find(&self, filter: &EntryFilter) -> catalog_db::Result<Vec<CatalogEntry>> {
            self.inner.find(filter).await
        }
    }

    #[tokio::test]
    async fn store_failure_skips_only_that_candidate() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            reject_title: "Kabbalah Explained",
        });
        let fetcher = StaticFetcher::default().with_page(
            SOURCE_A,
            &page(&[
                ("Kabbalah Explained", "Moshe Idel", ""),
                ("Midrash and Memory", "Judith Baskin", ""),
            ]),
        );
        let report = orchestrator(fetcher, store.clone())
            .run(&[source("Sample Publisher", SOURCE_A)])
            .await;

        assert_eq!(report.sources[0].failed, 1);
        assert_eq!(report.sources[0].scraped, 1);
        assert_eq!(store.inner.len().await, 1);
    }

    #[tokio::test]
    async fn custom_keywords_drive_the_filter() {
        let store = Arc::new(MemoryStore::new());
        let fetcher = StaticFetcher::default().with_page(
            SOURCE_A,
            &page(&[
                ("Gardening for Beginners", "Pat Green", ""),
                ("Jewish Folk Tales", "Nathan Ausubel", ""),
            ]),
        );
        let orchestrator =
            Orchestrator::new(Arc::new(fetcher), store.clone(), TopicalFilter::new(["garden"]));

        let report = orchestrator.run(&[source("Sample Publisher", SOURCE_A)]).await;
        assert_eq!(report.total_scraped(), 1);
        let all = store.find(&EntryFilter::default()).await.unwrap();
        assert_eq!(all[0].title, "Gardening for Beginners");
    }
}
