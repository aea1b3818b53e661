use catalog_db::{CatalogEntry, EntryDraft, EntryFilter};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Public submission body. Any `status` a client sends is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub publisher: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub blurb: String,
    #[serde(default)]
    pub cover_url: Option<Url>,
}

impl SubmitBook {
    /// Field-level problems, empty when the submission is acceptable.
    pub fn validate(&self) -> Vec<serde_json::Value> {
        let mut problems = Vec::new();
        if self.title.trim().is_empty() {
            problems.push(serde_json::json!({"field": "title", "error": "required"}));
        }
        problems
    }

    pub fn into_draft(self) -> EntryDraft {
        EntryDraft {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self
                .genre
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            publisher: self.publisher.trim().to_string(),
            release_date: self.release_date,
            blurb: self.blurb.trim().to_string(),
            cover_url: self.cover_url,
        }
    }
}

/// Query string of the public listing. Empty parameters are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
}

impl BookQuery {
    pub fn into_filter(self) -> EntryFilter {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        EntryFilter {
            status: None,
            title_contains: non_empty(self.search),
            genre: non_empty(self.genre),
            publisher: non_empty(self.publisher),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproveResponse {
    pub message: &'static str,
    pub book: CatalogEntry,
}
