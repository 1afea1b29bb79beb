//! Concept detail view
//!
//! `loading -> {ready | not_found | load_error}`, entered fresh on every
//! slug change. Each navigation hands out a [`Ticket`]; results settled with
//! an older ticket are dropped so a slow load for a previous slug can never
//! replace the content of the current one.

use std::sync::Arc;

use crate::content::{CompiledConcept, ConceptError, ContentRegistry};

#[derive(Debug, Clone)]
pub enum DetailState {
    Loading,
    Ready(Arc<CompiledConcept>),
    NotFound,
    LoadError(String),
}

impl DetailState {
    pub fn name(&self) -> &'static str {
        match self {
            DetailState::Loading => "loading",
            DetailState::Ready(_) => "ready",
            DetailState::NotFound => "not_found",
            DetailState::LoadError(_) => "load_error",
        }
    }
}

/// Identifies one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    slug: String,
}

impl Ticket {
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

#[derive(Debug, Clone)]
pub struct ConceptDetailView {
    slug: Option<String>,
    generation: u64,
    state: DetailState,
}

impl Default for ConceptDetailView {
    fn default() -> Self {
        Self::new()
    }
}

impl ConceptDetailView {
    pub fn new() -> Self {
        Self {
            slug: None,
            generation: 0,
            state: DetailState::Loading,
        }
    }

    /// Resolve `slug` against the registry in one go
    pub async fn open(registry: &ContentRegistry, slug: &str) -> Self {
        let mut view = Self::new();
        let ticket = view.navigate(slug);
        let result = registry.load(ticket.slug()).await;
        view.settle(&ticket, result);
        view
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Switch to `slug`; any load still in flight becomes stale
    pub fn navigate(&mut self, slug: &str) -> Ticket {
        self.generation += 1;
        self.slug = Some(slug.to_string());
        self.state = DetailState::Loading;

        Ticket {
            generation: self.generation,
            slug: slug.to_string(),
        }
    }

    /// Apply a load result. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn settle(
        &mut self,
        ticket: &Ticket,
        result: Result<Arc<CompiledConcept>, ConceptError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale result for {} (now showing {:?})",
                ticket.slug,
                self.slug
            );
            return false;
        }

        self.state = match result {
            Ok(concept) => DetailState::Ready(concept),
            Err(ConceptError::NotFound { .. }) => DetailState::NotFound,
            Err(err @ ConceptError::LoadFailure { .. }) => {
                let message = match std::error::Error::source(&err) {
                    Some(cause) => format!("{}: {}", err, cause),
                    None => err.to_string(),
                };
                DetailState::LoadError(message)
            }
        };
        true
    }
}
