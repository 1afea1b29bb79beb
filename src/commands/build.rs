//! Export the notebook as static files

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::helpers::url_for;
use crate::templates::STYLESHEET;
use crate::view::{ConceptDetailView, ConceptListView, PageKind, RouteQuery, Shell};
use crate::Notebook;

/// Summary of one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub concepts: usize,
    pub failed: Vec<String>,
}

/// Export the whole notebook into the public directory
pub async fn run(notebook: &Notebook) -> Result<BuildReport> {
    let start = Instant::now();

    let registry = notebook.registry()?;
    let shell = Shell::new(&notebook.config)?;
    let root = &notebook.config.root;
    let out = &notebook.public_dir;
    let query = RouteQuery::default();

    fs::create_dir_all(out)?;

    let home = shell.home(&registry, &query);
    write_file(&out.join("index.html"), &home.html)?;

    let mut report = BuildReport::default();
    for slug in registry.slugs() {
        let view = ConceptDetailView::open(&registry, slug).await;
        let page = shell.concept(&registry, &view, &query);
        if page.kind != PageKind::Concept {
            tracing::warn!("Concept {} exported as an error page", slug);
            report.failed.push(slug.to_string());
        }
        write_file(&out.join("concepts").join(slug).join("index.html"), &page.html)?;
        report.concepts += 1;
    }

    let not_found = shell.not_found(&registry, &url_for(root, "404.html"), &query);
    write_file(&out.join("404.html"), &not_found.html)?;

    write_file(&out.join("assets/notebook.css"), STYLESHEET)?;

    let index = ConceptListView::new(&registry).filter("").index(root);
    write_file(&out.join("concepts.json"), &serde_json::to_string_pretty(&index)?)?;

    copy_static(&notebook.static_dir, &out.join("static"))?;

    tracing::info!(
        "Exported {} concepts in {:.2}s",
        report.concepts,
        start.elapsed().as_secs_f64()
    );
    if !report.failed.is_empty() {
        tracing::warn!("{} concepts failed to load", report.failed.len());
    }

    Ok(report)
}

/// Re-export whenever content, static files or configuration change
pub async fn watch(notebook: &Notebook) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    // Bursts of events within 500ms are delivered as one batch
    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |res: DebounceEventResult| {
            let _ = tx.send(res);
        },
    )?;

    {
        let watcher = debouncer.watcher();
        if notebook.content_dir.exists() {
            watcher.watch(&notebook.content_dir, notify::RecursiveMode::Recursive)?;
        }
        if notebook.static_dir.exists() {
            watcher.watch(&notebook.static_dir, notify::RecursiveMode::Recursive)?;
        }
        let config_path = notebook.config_path();
        if config_path.exists() {
            watcher.watch(&config_path, notify::RecursiveMode::NonRecursive)?;
        }
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    while let Some(res) = rx.recv().await {
        match res {
            Ok(events) if events.is_empty() => continue,
            Ok(_) => {
                tracing::info!("File changed, exporting...");
                let result = match Notebook::new(&notebook.base_dir) {
                    Ok(reloaded) => run(&reloaded).await.map(|_| ()),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    tracing::error!("Export failed: {:#}", e);
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

fn copy_static(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(from)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let relative = entry.path().strip_prefix(from)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_notebook(dir: &Path) -> Notebook {
        crate::commands::init::init_notebook(dir).unwrap();
        fs::write(dir.join("static/logo.svg"), "<svg/>").unwrap();
        Notebook::new(dir).unwrap()
    }

    #[tokio::test]
    async fn test_build_exports_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = sample_notebook(dir.path());

        let report = run(&notebook).await.unwrap();
        assert_eq!(report.concepts, 2);
        assert!(report.failed.is_empty());

        let out = &notebook.public_dir;
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("<h3>use state</h3>"));
        assert!(index.contains("<h3>use effect</h3>"));

        let page = fs::read_to_string(out.join("concepts/use-effect/index.html")).unwrap();
        assert!(page.contains("Dependencies"));

        let not_found = fs::read_to_string(out.join("404.html")).unwrap();
        assert!(not_found.contains("404 - Page Not Found"));

        assert!(out.join("assets/notebook.css").exists());
        assert_eq!(
            fs::read_to_string(out.join("static/logo.svg")).unwrap(),
            "<svg/>"
        );
    }

    async fn wait_for(path: &Path) -> bool {
        for _ in 0..100 {
            if path.exists() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_watch_exports_edits_saved_right_after_an_export() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = sample_notebook(dir.path());
        run(&notebook).await.unwrap();

        let watched = notebook.clone();
        let task = tokio::spawn(async move { watch(&watched).await });
        tokio::time::sleep(Duration::from_millis(300)).await;

        let concepts = &notebook.content_dir;
        let out = notebook.public_dir.join("concepts");

        fs::write(concepts.join("closures.md"), "# Closures").unwrap();
        assert!(wait_for(&out.join("closures/index.html")).await);

        // Saved immediately after the previous export finished
        fs::write(concepts.join("traits.md"), "# Traits").unwrap();
        assert!(wait_for(&out.join("traits/index.html")).await);

        task.abort();
    }

    #[tokio::test]
    async fn test_build_writes_search_index() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = sample_notebook(dir.path());
        run(&notebook).await.unwrap();

        let json = fs::read_to_string(notebook.public_dir.join("concepts.json")).unwrap();
        let index: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(index[0]["slug"], "use-effect");
        assert_eq!(index[1]["title"], "use state");
        assert_eq!(index[1]["path"], "/concepts/use-state");
    }
}
