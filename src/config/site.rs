//! Notebook configuration (notebook.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Name of the configuration file at the notebook root
pub const CONFIG_FILE: &str = "notebook.yml";

/// Main notebook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    pub static_dir: String,

    // Home page
    pub featured_limit: usize,

    // Footer
    #[serde(default)]
    pub footer_links: Vec<FooterLink>,

    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            title: "Dev Notebook".to_string(),
            description: "Your personal developer notebook where you can find and document \
                          various programming concepts and tutorials."
                .to_string(),
            author: String::new(),

            root: "/".to_string(),

            content_dir: "content/concepts".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            featured_limit: 5,

            footer_links: Vec::new(),
            highlight: HighlightConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl NotebookConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: NotebookConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// A link shown in the footer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub name: String,
    pub url: String,
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}
