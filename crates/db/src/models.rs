use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Moderation state of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
}

impl Status {
    /// `pending -> approved` is the only real transition. Setting the current
    /// status again is a no-op and allowed.
    pub fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, _) | (Status::Approved, Status::Approved)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything about a book except its identity and moderation state.
///
/// Scraped candidates and public submissions both become an `EntryDraft`
/// before they are queued, so the two paths produce identical pending entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: BTreeSet<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub blurb: String,
    #[serde(default)]
    pub cover_url: Option<Url>,
}

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: BTreeSet<String>,
    pub publisher: String,
    pub release_date: Option<NaiveDate>,
    pub blurb: String,
    pub cover_url: Option<Url>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// New entries always start out pending.
    pub fn pending(draft: EntryDraft) -> Self {
        let EntryDraft {
            title,
            author,
            genre,
            publisher,
            release_date,
            blurb,
            cover_url,
        } = draft;

        Self {
            id: Uuid::now_v7(),
            title,
            author,
            genre,
            publisher,
            release_date,
            blurb,
            cover_url,
            status: Status::Pending,
            created_at: Utc::now(),
        }
    }

    /// Dedup identity: exact, case-sensitive title and author.
    pub fn has_identity(&self, title: &str, author: &str) -> bool {
        self.title == title && self.author == author
    }
}

/// Query criteria for [`crate::CatalogStore::find`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub status: Option<Status>,
    /// Case-insensitive substring of the title.
    pub title_contains: Option<String>,
    /// Exact genre tag.
    pub genre: Option<String>,
    /// Exact publisher name.
    pub publisher: Option<String>,
}

impl EntryFilter {
    pub fn with_status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if self.status.is_some_and(|status| status != entry.status) {
            return false;
        }
        if let Some(needle) = &self.title_contains {
            if !entry
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !entry.genre.contains(genre) {
                return false;
            }
        }
        if let Some(publisher) = &self.publisher {
            if &entry.publisher != publisher {
                return false;
            }
        }
        true
    }
}
