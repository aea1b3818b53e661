use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CatalogEntry, EntryFilter, Status};

/// Persistence contract for catalog entries.
///
/// The scraper and the HTTP handlers share one handle to the same store, so
/// implementations must make each individual operation atomic. No
/// cross-operation isolation is expected.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look an entry up by its exact (title, author) identity, any status.
    async fn find_one(&self, title: &str, author: &str) -> Result<Option<CatalogEntry>>;

    /// Persist a new entry. Fails with `Conflict` if the id is taken.
    async fn insert(&self, entry: CatalogEntry) -> Result<()>;

    /// Change an entry's status, returning the updated entry.
    async fn update_status(&self, id: Uuid, status: Status) -> Result<CatalogEntry>;

    /// Entries matching `filter`, in insertion order.
    async fn find(&self, filter: &EntryFilter) -> Result<Vec<CatalogEntry>>;
}
