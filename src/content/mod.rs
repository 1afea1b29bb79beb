//! Content module - concept documents, front-matter and the registry

pub mod concept;
mod error;
mod frontmatter;
mod markdown;
pub mod registry;

pub use concept::{derive_title, CompiledConcept, ConceptSummary};
pub use error::{ConceptError, LoadError, RegistryError};
pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use registry::{ConceptSource, ContentRegistry, EmbeddedSource, FileSource};
