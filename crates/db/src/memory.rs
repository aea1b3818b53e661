//! In-memory catalog store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::models::{CatalogEntry, EntryFilter, Status};
use crate::store::CatalogStore;

/// Entries kept in a `Vec` behind a [`RwLock`], in insertion order.
///
/// Every trait method takes the lock exactly once, which gives each
/// operation document-level atomicity and nothing more.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<CatalogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with entries, mostly for tests and seeding.
    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_one(&self, title: &str, author: &str) -> Result<Option<CatalogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|entry| entry.has_identity(title, author))
            .cloned())
    }

    async fn insert(&self, entry: CatalogEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(DbError::Conflict { id: entry.id });
        }
        tracing::debug!(id = %entry.id, title = %entry.title, status = %entry.status, "entry inserted");
        entries.push(entry);
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: Status) -> Result<CatalogEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(DbError::NotFound { id })?;

        if !entry.status.can_transition_to(status) {
            return Err(DbError::InvalidTransition {
                from: entry.status,
                to: status,
            });
        }

        entry.status = status;
        Ok(entry.clone())
    }

    async fn find(&self, filter: &EntryFilter) -> Result<Vec<CatalogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }
}
