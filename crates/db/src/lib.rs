//! Catalog persistence: the entry model, the [`CatalogStore`] contract that
//! the HTTP handlers and the scraper share, and an in-memory implementation.

pub mod error;
pub mod memory;
pub mod models;
pub mod store;

pub use error::{DbError, Result};
pub use memory::MemoryStore;
pub use models::{CatalogEntry, EntryDraft, EntryFilter, Status};
pub use store::CatalogStore;
