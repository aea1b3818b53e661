//! Keyword-based topical filter.

use super::extract::RawCandidate;

/// Stock keyword set. Several entries are stems ("zionis", "antisemit",
/// "sephard") so they match their inflected forms.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "jewish",
    "jews",
    "judaism",
    "judaic",
    "hebrew",
    "yiddish",
    "israel",
    "zionis",
    "antisemit",
    "holocaust",
    "rabbi",
    "talmud",
    "midrash",
    "kabbalah",
    "sephard",
    "ashkenaz",
    "synagogue",
];

/// Case-insensitive substring match of a keyword list against a candidate's
/// title, blurb and publisher. Not word-boundary aware, so "israeli" matches
/// "israel" and so does any unrelated word that happens to contain it.
#[derive(Debug, Clone)]
pub struct TopicalFilter {
    keywords: Vec<String>,
}

impl TopicalFilter {
    /// Keywords are lowercased; blank ones are dropped since they would match
    /// everything.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_in_scope(&self, candidate: &RawCandidate) -> bool {
        self.matches_text(&format!(
            "{} {} {}",
            candidate.title, candidate.blurb, candidate.publisher
        ))
    }

    fn matches_text(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| haystack.contains(keyword.as_str()))
    }
}

impl Default for TopicalFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}
