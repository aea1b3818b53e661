//! Turns a listing page into raw candidates using a source's locators.
//!
//! Text fields take the text of every sub-match, joined by a single space.
//!
//! Extraction is lenient: a missing field becomes an empty string, a missing
//! cover becomes `None`, and an unreadable date becomes
//! [`ReleaseDate::Invalid`]. Nothing here can fail; fetching the page is the
//! caller's problem.

use catalog_db::EntryDraft;
use chrono::{DateTime, Datelike, NaiveDate};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use super::source::LocatorSet;

/// Formats tried in order. `%B` also accepts abbreviated month names.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%m/%d/%Y",
];

/// Release date as read from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseDate {
    Parsed(NaiveDate),
    /// Raw text that could not be read as a date (empty when nothing matched).
    Invalid(String),
}

impl ReleaseDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ReleaseDate::Parsed(date) => Some(*date),
            ReleaseDate::Invalid(_) => None,
        }
    }
}

/// One listing entry straight off the page, not yet filtered or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub author: String,
    pub blurb: String,
    pub cover_url: Option<Url>,
    pub release_date: ReleaseDate,
    /// Publisher label of the source the candidate came from.
    pub publisher: String,
}

impl RawCandidate {
    pub fn into_draft(self) -> EntryDraft {
        EntryDraft {
            release_date: self.release_date.date(),
            title: self.title,
            author: self.author,
            blurb: self.blurb,
            cover_url: self.cover_url,
            publisher: self.publisher,
            genre: Default::default(),
        }
    }
}

/// Produce one candidate per `entry` match in `html`.
///
/// Relative cover URLs are resolved against `page_url`.
pub fn extract(
    html: &str,
    page_url: &Url,
    locators: &LocatorSet,
    source_name: &str,
) -> Vec<RawCandidate> {
    let document = Html::parse_document(html);

    document
        .select(&locators.entry)
        .map(|entry| RawCandidate {
            title: joined_text(entry, &locators.title),
            author: joined_text(entry, &locators.author),
            blurb: joined_text(entry, &locators.blurb),
            cover_url: cover_url(entry, &locators.cover, page_url),
            release_date: parse_release_date(&joined_text(entry, &locators.date)),
            publisher: source_name.to_string(),
        })
        .collect()
}

/// Text of every match with whitespace runs collapsed, or `""`.
fn joined_text(entry: ElementRef<'_>, selector: &Selector) -> String {
    entry
        .select(selector)
        .flat_map(|element| element.text())
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn cover_url(entry: ElementRef<'_>, selector: &Selector, page_url: &Url) -> Option<Url> {
    let src = entry.select(selector).next()?.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    page_url.join(src).ok()
}

/// Best-effort date parsing; never fails.
pub fn parse_release_date(text: &str) -> ReleaseDate {
    let text = text.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return ReleaseDate::Parsed(datetime.date_naive());
    }

    // "March 2024" carries no day; pin it to the first of the month. Tried
    // first since "%B %d %Y" would read it as day 20, year 24.
    let month_year = NaiveDate::parse_from_str(&format!("1 {text}"), "%d %B %Y");
    let mut parsed = month_year.into_iter().chain(
        DATE_FORMATS
            .iter()
            .filter_map(|format| NaiveDate::parse_from_str(text, format).ok()),
    );

    // chrono's %Y accepts short years; only four-digit years are real dates here.
    match parsed.find(|date| date.year() >= 1000) {
        Some(date) => ReleaseDate::Parsed(date),
        None => ReleaseDate::Invalid(text.to_string()),
    }
}
