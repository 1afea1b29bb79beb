//! Content error types

use thiserror::Error;

/// Why a concept's loader failed to produce content
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("failed to read {origin}: {message}")]
    Read { origin: String, message: String },

    #[error("compiling {origin} did not complete: {message}")]
    Task { origin: String, message: String },
}

/// Outcome of resolving a slug that did not yield content
#[derive(Debug, Clone, Error)]
pub enum ConceptError {
    #[error("concept not found: {slug}")]
    NotFound { slug: String },

    #[error("failed to load concept {slug}")]
    LoadFailure {
        slug: String,
        #[source]
        source: LoadError,
    },
}

impl ConceptError {
    pub fn slug(&self) -> &str {
        match self {
            ConceptError::NotFound { slug } | ConceptError::LoadFailure { slug, .. } => slug,
        }
    }
}

/// Errors building a content registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate concept slug: {0}")]
    DuplicateSlug(String),

    #[error("invalid concept slug: {0:?}")]
    InvalidSlug(String),

    #[error("invalid content pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
