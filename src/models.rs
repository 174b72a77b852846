//! Data models for fetched articles and the composed digest.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Category`]: The closed set of topical buckets the digest is organized by
//! - [`Article`]: A normalized news item, optionally carrying its summary
//! - [`CategoryDigest`]: Articles grouped by category in enumerated order
//! - [`DigestMessage`]: The subject and plain-text body handed to delivery
//!
//! Everything here is created fresh for a single run and discarded afterwards.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A topical bucket used both for fetching and for sectioning the digest.
///
/// The declaration order is the enumerated order: [`CategoryDigest`] iterates
/// categories in this order, which is also the order they are fetched in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Technology,
    Science,
    Health,
    Entertainment,
    Sports,
}

impl Category {
    /// The lowercase name used on the wire and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Health => "health",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
        }
    }

    /// Categories fetched when nothing else is configured.
    pub fn defaults() -> Vec<Category> {
        vec![
            Category::Business,
            Category::Technology,
            Category::Science,
            Category::Health,
            Category::Entertainment,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized news item.
///
/// Produced by the fetcher (or the built-in fallback set) and enriched with a
/// `summary` by the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Headline. Never empty once an article leaves the fetcher.
    pub title: String,
    /// Short description supplied by the source; may be empty.
    pub description: String,
    /// Body text, capped at 1000 characters plus an ellipsis.
    pub content: String,
    /// Source identifier, `"Unknown"` when the API omitted it.
    pub source: String,
    /// Link to the full story; may be empty.
    pub url: String,
    /// Publication timestamp exactly as the source formatted it.
    pub published_at: String,
    /// First category the source assigned, or `"general"`.
    pub category: String,
    /// Synopsis written by the summarizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Article {
    /// Text shown under the headline: the summary when present, else the description.
    pub fn synopsis(&self) -> &str {
        match self.summary.as_deref() {
            Some(summary) if !summary.trim().is_empty() => summary,
            _ => &self.description,
        }
    }
}

/// Articles grouped by category, iterated in enumerated [`Category`] order.
///
/// A category mapped to an empty list and an absent category both mean
/// "nothing to show".
pub type CategoryDigest = BTreeMap<Category, Vec<Article>>;

/// Total number of articles across every category of a digest.
pub fn total_articles(digest: &CategoryDigest) -> usize {
    digest.values().map(Vec::len).sum()
}

/// The composed email: a dated subject line and a plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestMessage {
    pub subject: String,
    pub body: String,
}
