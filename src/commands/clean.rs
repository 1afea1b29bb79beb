//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Notebook;

/// Remove the exported site
pub fn run(notebook: &Notebook) -> Result<()> {
    if notebook.public_dir.exists() {
        fs::remove_dir_all(&notebook.public_dir)?;
        tracing::info!("Deleted: {:?}", notebook.public_dir);
    }

    Ok(())
}
