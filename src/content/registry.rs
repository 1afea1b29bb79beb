//! Content registry: an explicit table from slug to a memoized loader
//!
//! The table is built either from code via [`RegistryBuilder`] or by
//! scanning a content directory once with [`ContentRegistry::scan`]. Either
//! way the set of slugs is fixed for the registry's lifetime; bodies are
//! compiled on first load and kept.

use indexmap::IndexMap;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::concept::{derive_title, is_valid_slug, slug_from_path};
use super::error::{ConceptError, LoadError, RegistryError};
use super::{CompiledConcept, ConceptSummary, FrontMatter, MarkdownRenderer};

/// Where a concept's source text comes from
pub trait ConceptSource: Send + Sync {
    /// Read the raw document, front-matter included
    fn read(&self) -> io::Result<String>;

    /// Human-readable origin for logs and error messages
    fn origin(&self) -> String;
}

/// A concept document on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl ConceptSource for FileSource {
    fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

/// A concept document compiled into the binary or built in memory
#[derive(Debug, Clone)]
pub struct EmbeddedSource {
    name: String,
    text: Cow<'static, str>,
}

impl EmbeddedSource {
    pub fn new(name: &str, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.to_string(),
            text: text.into(),
        }
    }
}

impl ConceptSource for EmbeddedSource {
    fn read(&self) -> io::Result<String> {
        Ok(self.text.to_string())
    }

    fn origin(&self) -> String {
        format!("embedded:{}", self.name)
    }
}

/// Loads and compiles one concept, at most once per successful load
pub struct ConceptLoader {
    slug: String,
    source: Arc<dyn ConceptSource>,
    renderer: Arc<MarkdownRenderer>,
    compiled: OnceCell<Arc<CompiledConcept>>,
}

impl ConceptLoader {
    fn new(slug: String, source: Arc<dyn ConceptSource>, renderer: Arc<MarkdownRenderer>) -> Self {
        Self {
            slug,
            source,
            renderer,
            compiled: OnceCell::new(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn origin(&self) -> String {
        self.source.origin()
    }

    /// Whether a successful load has been cached
    pub fn is_loaded(&self) -> bool {
        self.compiled.initialized()
    }

    /// Return the compiled concept, reading and rendering it on first use.
    ///
    /// Failures are not cached; the next call reads the source again.
    pub async fn load(&self) -> Result<Arc<CompiledConcept>, LoadError> {
        self.compiled
            .get_or_try_init(|| self.compile())
            .await
            .cloned()
    }

    async fn compile(&self) -> Result<Arc<CompiledConcept>, LoadError> {
        let slug = self.slug.clone();
        let source = Arc::clone(&self.source);
        let renderer = Arc::clone(&self.renderer);

        tracing::debug!("Compiling concept {} from {}", slug, source.origin());

        tokio::task::spawn_blocking(move || compile_concept(slug, source.as_ref(), &renderer))
            .await
            .map_err(|e| LoadError::Task {
                origin: self.source.origin(),
                message: e.to_string(),
            })?
    }
}

fn compile_concept(
    slug: String,
    source: &dyn ConceptSource,
    renderer: &MarkdownRenderer,
) -> Result<Arc<CompiledConcept>, LoadError> {
    let raw = source.read().map_err(|e| LoadError::Read {
        origin: source.origin(),
        message: e.to_string(),
    })?;

    let (front_matter, body) = FrontMatter::parse(&raw);
    let html = renderer.render(body);

    Ok(Arc::new(CompiledConcept {
        title: derive_title(&slug),
        slug,
        front_matter,
        html,
    }))
}

/// Ordered slug → loader table
pub struct ContentRegistry {
    entries: IndexMap<String, ConceptLoader>,
}

impl ContentRegistry {
    /// Start an explicit table
    pub fn builder(renderer: Arc<MarkdownRenderer>) -> RegistryBuilder {
        RegistryBuilder {
            renderer,
            entries: IndexMap::new(),
        }
    }

    /// Build the table from the concept documents directly inside `dir`.
    ///
    /// Entries are ordered by file name. A missing directory gives an empty
    /// registry; files whose stem is not a valid slug are skipped.
    pub fn scan(dir: &Path, renderer: Arc<MarkdownRenderer>) -> Result<Self, RegistryError> {
        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/')
        );
        let paths = glob::glob(&pattern).map_err(|source| RegistryError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut builder = Self::builder(renderer);
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Skipping unreadable content entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Some(slug) = slug_from_path(&path) else {
                continue;
            };
            if !is_valid_slug(&slug) {
                tracing::warn!("Skipping {:?}: {:?} is not a URL-safe slug", path, slug);
                continue;
            }
            tracing::debug!("Registered concept {} from {:?}", slug, path);
            builder = builder.register(&slug, FileSource::new(path))?;
        }

        let registry = builder.build();
        tracing::info!("Found {} concepts in {:?}", registry.len(), dir);
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    /// Slugs in registration order
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Listing entries in registration order
    pub fn summaries(&self) -> Vec<ConceptSummary> {
        self.slugs().map(ConceptSummary::new).collect()
    }

    pub fn get(&self, slug: &str) -> Option<&ConceptLoader> {
        self.entries.get(slug)
    }

    /// Resolve a slug to its compiled content
    pub async fn load(&self, slug: &str) -> Result<Arc<CompiledConcept>, ConceptError> {
        let loader = self.get(slug).ok_or_else(|| ConceptError::NotFound {
            slug: slug.to_string(),
        })?;

        loader.load().await.map_err(|source| {
            tracing::warn!("Failed to load concept {}: {}", slug, source);
            ConceptError::LoadFailure {
                slug: slug.to_string(),
                source,
            }
        })
    }
}

/// Builder for an explicit [`ContentRegistry`]
pub struct RegistryBuilder {
    renderer: Arc<MarkdownRenderer>,
    entries: IndexMap<String, ConceptLoader>,
}

impl RegistryBuilder {
    /// Add a concept; slugs must be URL-safe and unique
    pub fn register<S>(mut self, slug: &str, source: S) -> Result<Self, RegistryError>
    where
        S: ConceptSource + 'static,
    {
        if !is_valid_slug(slug) {
            return Err(RegistryError::InvalidSlug(slug.to_string()));
        }
        if self.entries.contains_key(slug) {
            return Err(RegistryError::DuplicateSlug(slug.to_string()));
        }

        let loader = ConceptLoader::new(
            slug.to_string(),
            Arc::new(source),
            Arc::clone(&self.renderer),
        );
        self.entries.insert(slug.to_string(), loader);
        Ok(self)
    }

    pub fn build(self) -> ContentRegistry {
        ContentRegistry {
            entries: self.entries,
        }
    }
}
