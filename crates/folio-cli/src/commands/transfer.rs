//! Export and import command handlers

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use folio_core::{DocumentStore, KeyValueStore};

use crate::output::Output;

/// Export every document as a JSON array, to a file or stdout
pub fn export<S: KeyValueStore>(
    store: &DocumentStore<S>,
    path: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let json = store
        .storage()
        .export_all_documents()
        .context("Failed to export documents")?;

    match path {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            let count = store.storage().get_all_documents().len();
            output.success(&format!("Exported {} document(s) to {}", count, path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Import documents from a JSON export
///
/// Bad records are skipped; the command fails only when nothing imports.
pub fn import<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    path: PathBuf,
    output: &Output,
) -> Result<()> {
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read import file: {:?}", path))?;

    let report = store.storage().import_documents(&json);
    store.load_documents()?;

    if report.success == 0 && report.failed > 0 {
        bail!(
            "Import failed: no documents could be read from {}",
            path.display()
        );
    }

    output.print_value(
        &report,
        &format!(
            "✓ Imported {} document(s), {} failed",
            report.success, report.failed
        ),
    );
    Ok(())
}
