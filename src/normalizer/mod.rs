use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;

use crate::app::{QuireError, Result};

/// Feed dialect, decided by sniffing the raw bytes rather than trusting any
/// declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

/// One normalized article extracted from a feed document. Both `title` and
/// `body` are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub title: String,
    pub body: String,
    pub published: Option<DateTime<Utc>>,
    pub format: FeedFormat,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Extracts entries from a raw feed document.
    ///
    /// Unrecognized or empty input yields no entries. A document that sniffs
    /// as RSS or Atom but is not well-formed fails with `FeedParse`.
    pub fn parse(&self, body: &[u8]) -> Result<Vec<ParsedEntry>> {
        let Some(format) = detect_format(body) else {
            return Ok(Vec::new());
        };

        let feed = parser::parse(body).map_err(|e| QuireError::FeedParse(e.to_string()))?;

        let entries = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let (title, body, published) = match format {
                    FeedFormat::Rss => rss_fields(entry),
                    FeedFormat::Atom => atom_fields(entry),
                };
                normalize_entry(&title, &body, published, format)
            })
            .collect();

        Ok(entries)
    }
}

/// RSS needs both the root and channel markers, Atom both the feed and entry
/// markers. RSS wins when a document somehow carries all four.
pub fn detect_format(body: &[u8]) -> Option<FeedFormat> {
    if contains(body, b"<rss") && contains(body, b"<channel") {
        Some(FeedFormat::Rss)
    } else if contains(body, b"<feed") && contains(body, b"<entry") {
        Some(FeedFormat::Atom)
    } else {
        None
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// title / description / pubDate
fn rss_fields(entry: Entry) -> (String, String, Option<DateTime<Utc>>) {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let body = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    (title, body, entry.published.or(entry.updated))
}

// title / content / updated
fn atom_fields(entry: Entry) -> (String, String, Option<DateTime<Utc>>) {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let body = entry.content.and_then(|c| c.body).unwrap_or_default();
    (title, body, entry.updated.or(entry.published))
}

/// Trims, strips markup from the body and applies the title/body fallbacks.
/// Entries with neither a title nor a body are dropped.
fn normalize_entry(
    title: &str,
    body: &str,
    published: Option<DateTime<Utc>>,
    format: FeedFormat,
) -> Option<ParsedEntry> {
    let title = title.trim();
    let stripped = strip_markup(body);
    let body = stripped.trim();

    if title.is_empty() && body.is_empty() {
        return None;
    }

    let title = if title.is_empty() { body } else { title };
    let body = if body.is_empty() { title } else { body };

    Some(ParsedEntry {
        title: title.to_string(),
        body: body.to_string(),
        published,
        format,
    })
}

/// Single-pass tag stripper.
///
/// Every `<` enters skip mode and every `>` leaves it; neither bracket is
/// copied. No entity decoding is done, and stray or nested brackets can
/// desynchronize the state.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;

    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}
