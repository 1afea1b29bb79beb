//! dev-notebook: a small notebook of programming concepts
//!
//! Concept documents are Markdown files with optional front-matter. They are
//! collected into a [`content::ContentRegistry`], listed and searched on the
//! home page, and rendered one per page under `/concepts/{slug}`, either by
//! the built-in server or as a static export.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod server;
pub mod templates;
pub mod view;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::site::CONFIG_FILE;
use content::{ContentRegistry, MarkdownRenderer};

/// The main notebook application
#[derive(Clone)]
pub struct Notebook {
    /// Notebook configuration
    pub config: config::NotebookConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding concept documents
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Extra static files served under /static
    pub static_dir: PathBuf,
}

impl Notebook {
    /// Create a new Notebook instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::NotebookConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} found, using defaults", CONFIG_FILE);
            config::NotebookConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            public_dir,
            static_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    /// Markdown renderer configured for this notebook
    pub fn renderer(&self) -> Arc<MarkdownRenderer> {
        Arc::new(MarkdownRenderer::from_config(&self.config.highlight))
    }

    /// Scan the content directory into a registry
    pub fn registry(&self) -> Result<ContentRegistry> {
        Ok(ContentRegistry::scan(&self.content_dir, self.renderer())?)
    }

    /// Export the static site
    pub async fn build(&self) -> Result<commands::build::BuildReport> {
        commands::build::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        assert_eq!(notebook.config.title, "Dev Notebook");
        assert_eq!(notebook.content_dir, dir.path().join("content/concepts"));
        assert!(notebook.registry().unwrap().is_empty());
    }

    #[test]
    fn test_new_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "content_dir: notes\npublic_dir: out\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/traits.md"), "# Traits").unwrap();

        let notebook = Notebook::new(dir.path()).unwrap();
        assert_eq!(notebook.public_dir, dir.path().join("out"));
        let registry = notebook.registry().unwrap();
        assert!(registry.contains("traits"));
    }
}
