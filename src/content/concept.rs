//! Concept model: slugs, derived titles and compiled content

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

use super::FrontMatter;

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap();
}

/// File extensions recognized as concept documents
pub const CONCEPT_EXTENSIONS: &[&str] = &["md", "markdown", "mdx"];

/// Whether `slug` can be used as a `/concepts/{slug}` path segment
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Display title for a slug: `use-effect` becomes `use effect`
pub fn derive_title(slug: &str) -> String {
    slug.replace('-', " ")
}

/// The slug of a concept document is its file stem
pub fn slug_from_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !CONCEPT_EXTENSIONS.contains(&ext) {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// A listing entry: everything known about a concept without loading it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptSummary {
    pub slug: String,
    pub title: String,
}

impl ConceptSummary {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: derive_title(slug),
        }
    }
}

/// A concept whose body has been compiled to HTML
#[derive(Debug, Clone, Serialize)]
pub struct CompiledConcept {
    pub slug: String,
    /// Derived from the slug, same as in listings
    pub title: String,
    pub front_matter: FrontMatter,
    pub html: String,
}

impl CompiledConcept {
    /// Title for the page header: front-matter title when present
    pub fn heading(&self) -> &str {
        self.front_matter.title.as_deref().unwrap_or(&self.title)
    }

    /// Front-matter date formatted for display
    pub fn display_date(&self) -> Option<String> {
        self.front_matter
            .parse_date()
            .map(|date| date.format("%B %d, %Y").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("use-effect"), "use effect");
        assert_eq!(derive_title("closures"), "closures");
        assert_eq!(derive_title("a-b-c"), "a b c");
    }

    #[test]
    fn test_slug_from_path() {
        assert_eq!(
            slug_from_path(&PathBuf::from("content/concepts/use-state.md")),
            Some("use-state".to_string())
        );
        assert_eq!(
            slug_from_path(&PathBuf::from("content/concepts/UseEffect.mdx")),
            Some("UseEffect".to_string())
        );
        assert_eq!(slug_from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(slug_from_path(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("use-state"));
        assert!(is_valid_slug("rust_traits.v2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("a/b"));
    }

    #[test]
    fn test_heading_prefers_front_matter() {
        let mut concept = CompiledConcept {
            slug: "use-state".to_string(),
            title: derive_title("use-state"),
            front_matter: FrontMatter::default(),
            html: String::new(),
        };
        assert_eq!(concept.heading(), "use state");

        concept.front_matter.title = Some("The useState Hook".to_string());
        assert_eq!(concept.heading(), "The useState Hook");
    }
}
