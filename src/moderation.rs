//! Moderation queue: every new entry lands here as pending and only an
//! explicit approval makes it publicly visible.

use std::sync::Arc;

use catalog_db::{CatalogEntry, CatalogStore, EntryDraft, EntryFilter, Status};
use uuid::Uuid;

#[derive(Clone)]
pub struct ModerationQueue {
    store: Arc<dyn CatalogStore>,
}

impl ModerationQueue {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    /// Queue a new entry for review. Scraped candidates and public submissions
    /// both come through here.
    pub async fn enqueue(&self, draft: EntryDraft) -> catalog_db::Result<CatalogEntry> {
        let entry = CatalogEntry::pending(draft);
        self.store.insert(entry.clone()).await?;
        Ok(entry)
    }

    pub async fn pending(&self) -> catalog_db::Result<Vec<CatalogEntry>> {
        self.store
            .find(&EntryFilter::with_status(Status::Pending))
            .await
    }

    /// Flip a pending entry to approved. Approving twice is harmless.
    pub async fn approve(&self, id: Uuid) -> catalog_db::Result<CatalogEntry> {
        let entry = self.store.update_status(id, Status::Approved).await?;
        tracing::info!(id = %entry.id, title = %entry.title, "entry approved");
        Ok(entry)
    }

    /// Public listing. Whatever status the caller asked for, only approved
    /// entries come back.
    pub async fn approved(&self, filter: EntryFilter) -> catalog_db::Result<Vec<CatalogEntry>> {
        let filter = EntryFilter {
            status: Some(Status::Approved),
            ..filter
        };
        self.store.find(&filter).await
    }
}
