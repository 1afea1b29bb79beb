//! Concept list view: every concept, or those matching a search

use serde::Serialize;

use crate::content::{ConceptSummary, ContentRegistry};
use crate::helpers::concept_path;

/// Case-insensitive substring match of `query` in `title`.
/// An empty query matches everything.
pub fn title_matches(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.to_lowercase())
}

/// Result of filtering the concept list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub query: String,
    pub entries: Vec<ConceptSummary>,
    /// Number of matches before any display limit
    pub matched: usize,
}

impl Listing {
    /// Nothing matched; rendered as an explicit "No concepts found" state
    pub fn no_matches(&self) -> bool {
        self.matched == 0
    }

    /// Keep at most `limit` entries for display
    pub fn limit(mut self, limit: usize) -> Self {
        self.entries.truncate(limit);
        self
    }

    /// Entries with their page paths, for `concepts.json` and `/api/concepts`
    pub fn index(&self, root: &str) -> Vec<IndexEntry> {
        self.entries
            .iter()
            .map(|entry| IndexEntry {
                slug: entry.slug.clone(),
                title: entry.title.clone(),
                path: concept_path(root, &entry.slug),
            })
            .collect()
    }
}

/// One concept in the JSON search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub slug: String,
    pub title: String,
    pub path: String,
}

/// All concepts in registry order
#[derive(Debug, Clone, Default)]
pub struct ConceptListView {
    concepts: Vec<ConceptSummary>,
}

impl ConceptListView {
    pub fn new(registry: &ContentRegistry) -> Self {
        Self {
            concepts: registry.summaries(),
        }
    }

    pub fn all(&self) -> &[ConceptSummary] {
        &self.concepts
    }

    pub fn filter(&self, query: &str) -> Listing {
        let entries: Vec<ConceptSummary> = self
            .concepts
            .iter()
            .filter(|concept| title_matches(&concept.title, query))
            .cloned()
            .collect();

        Listing {
            query: query.to_string(),
            matched: entries.len(),
            entries,
        }
    }
}
