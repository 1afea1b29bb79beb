//! List notebook concepts

use anyhow::Result;

use crate::view::{ConceptListView, Listing};
use crate::Notebook;

/// Concepts whose title matches `search` (all of them when `None`)
pub fn collect(notebook: &Notebook, search: Option<&str>) -> Result<Listing> {
    let registry = notebook.registry()?;
    Ok(ConceptListView::new(&registry).filter(search.unwrap_or("")))
}

/// Print concepts, optionally filtered
pub fn run(notebook: &Notebook, search: Option<&str>) -> Result<()> {
    let listing = collect(notebook, search)?;

    if listing.no_matches() {
        println!("No concepts found");
        return Ok(());
    }

    println!("Concepts ({}):", listing.matched);
    for entry in &listing.entries {
        println!("  {} - {}", entry.slug, entry.title);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_filters() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        fs::create_dir_all(&notebook.content_dir).unwrap();
        fs::write(notebook.content_dir.join("use-state.md"), "# a").unwrap();
        fs::write(notebook.content_dir.join("use-effect.md"), "# b").unwrap();

        assert_eq!(collect(&notebook, None).unwrap().matched, 2);

        let listing = collect(&notebook, Some("State")).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].slug, "use-state");

        assert!(collect(&notebook, Some("zzz")).unwrap().no_matches());
    }
}
