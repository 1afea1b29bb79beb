//! Create a new concept document

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::concept::is_valid_slug;
use crate::Notebook;

/// Create `<content_dir>/<slug>.md`; the slug defaults to the slugified title
pub fn create_concept(notebook: &Notebook, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(slug) => slug.to_string(),
        None => slug::slugify(title),
    };
    if !is_valid_slug(&slug) {
        anyhow::bail!("Cannot derive a URL-safe slug from {:?}", slug);
    }

    fs::create_dir_all(&notebook.content_dir)?;
    let file_path = notebook.content_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let content = format!(
        "---\ntitle: {}\ndate: {}\ntags: []\n---\n\n# {}\n",
        serde_yaml::to_string(title)?.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S"),
        title
    );
    fs::write(&file_path, content)?;

    tracing::info!("Created: {:?}", file_path);
    Ok(file_path)
}
