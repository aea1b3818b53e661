//! Strongly typed scrape sources, compiled from settings at startup.

use std::collections::HashSet;

use catalog_kernel::settings::{LocatorSettings, SourceSettings};
use scraper::Selector;
use serde::Serialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("source name must not be empty")]
    EmptyName,

    #[error("source '{name}' is configured twice")]
    DuplicateName { name: String },

    #[error("source '{name}': invalid url '{url}': {message}")]
    InvalidUrl {
        name: String,
        url: String,
        message: String,
    },

    #[error("source '{name}': invalid {field} selector '{selector}': {message}")]
    InvalidSelector {
        name: String,
        field: &'static str,
        selector: String,
        message: String,
    },
}

/// Compiled CSS selectors for every field of a listing entry.
#[derive(Debug, Clone)]
pub struct LocatorSet {
    pub entry: Selector,
    pub title: Selector,
    pub author: Selector,
    pub blurb: Selector,
    pub cover: Selector,
    pub date: Selector,
}

impl LocatorSet {
    pub fn compile(source: &str, raw: &LocatorSettings) -> Result<Self, SourceError> {
        let compile = |field: &'static str, selector: &str| {
            Selector::parse(selector).map_err(|err| SourceError::InvalidSelector {
                name: source.to_string(),
                field,
                selector: selector.to_string(),
                message: err.to_string(),
            })
        };

        Ok(Self {
            entry: compile("entry", &raw.entry)?,
            title: compile("title", &raw.title)?,
            author: compile("author", &raw.author)?,
            blurb: compile("blurb", &raw.blurb)?,
            cover: compile("cover", &raw.cover)?,
            date: compile("date", &raw.date)?,
        })
    }
}

/// One site to scrape. `name` doubles as the publisher label.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub url: Url,
    pub locators: LocatorSet,
    raw_locators: LocatorSettings,
}

impl Source {
    pub fn from_settings(settings: &SourceSettings) -> Result<Self, SourceError> {
        let name = settings.name.trim();
        if name.is_empty() {
            return Err(SourceError::EmptyName);
        }

        let url = Url::parse(&settings.url).map_err(|err| SourceError::InvalidUrl {
            name: name.to_string(),
            url: settings.url.clone(),
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::InvalidUrl {
                name: name.to_string(),
                url: settings.url.clone(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Self {
            name: name.to_string(),
            url,
            locators: LocatorSet::compile(name, &settings.locators)?,
            raw_locators: settings.locators.clone(),
        })
    }

    /// Serializable view for listings.
    pub fn describe(&self) -> SourceDescription {
        SourceDescription {
            name: self.name.clone(),
            url: self.url.to_string(),
            locators: self.raw_locators.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDescription {
    pub name: String,
    pub url: String,
    pub locators: LocatorSettings,
}

/// Validate every configured source, rejecting duplicates by name.
pub fn compile_sources(settings: &[SourceSettings]) -> Result<Vec<Source>, SourceError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(settings.len());

    for raw in settings {
        let source = Source::from_settings(raw)?;
        if !seen.insert(source.name.clone()) {
            return Err(SourceError::DuplicateName {
                name: source.name,
            });
        }
        sources.push(source);
    }

    Ok(sources)
}

#[cfg(test)]
pub(crate) fn sample_settings(name: &str, url: &str) -> SourceSettings {
    SourceSettings {
        name: name.to_string(),
        url: url.to_string(),
        locators: LocatorSettings {
            entry: ".book-entry".to_string(),
            title: ".title".to_string(),
            author: ".author".to_string(),
            blurb: ".description".to_string(),
            cover: "img".to_string(),
            date: ".date".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_source_compiles() {
        let source =
            Source::from_settings(&sample_settings("Sample Publisher", "https://example.com/new"))
                .unwrap();
        assert_eq!(source.name, "Sample Publisher");
        assert_eq!(source.url.as_str(), "https://example.com/new");
        assert_eq!(source.describe().locators.entry, ".book-entry");
    }

    #[test]
    fn bad_selector_names_the_field() {
        let mut settings = sample_settings("Broken", "https://example.com");
        settings.locators.author = "[[nope".to_string();

        match Source::from_settings(&settings).unwrap_err() {
            SourceError::InvalidSelector { name, field, .. } => {
                assert_eq!(name, "Broken");
                assert_eq!(field, "author");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn url_must_be_http() {
        let err = Source::from_settings(&sample_settings("Local", "file:///etc/passwd")).unwrap_err();
        assert!(matches!(err, SourceError::InvalidUrl { .. }));

        let err = Source::from_settings(&sample_settings("Relative", "/books")).unwrap_err();
        assert!(matches!(err, SourceError::InvalidUrl { .. }));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Source::from_settings(&sample_settings("  ", "https://example.com")).unwrap_err();
        assert_eq!(err, SourceError::EmptyName);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let settings = vec![
            sample_settings("Twice", "https://a.example.com"),
            sample_settings("Twice", "https://b.example.com"),
        ];
        assert_eq!(
            compile_sources(&settings).unwrap_err(),
            SourceError::DuplicateName {
                name: "Twice".to_string()
            }
        );
    }
}
