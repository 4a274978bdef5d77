//! Status command handler

use anyhow::{Context, Result};

use folio_core::{Config, DocumentStore, KeyValueStore};

use crate::output::{human_bytes, Output, OutputFormat};

/// Show storage usage and settings
pub fn show<S: KeyValueStore>(
    store: &DocumentStore<S>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let stats = store
        .storage()
        .storage_info()
        .context("Failed to read storage usage")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "storage": {
                        "location": config.documents_dir(),
                        "used": stats.used,
                        "available": stats.available,
                        "remaining": stats.remaining(),
                    },
                    "documentCount": stats.document_count,
                    "autosaveIntervalSecs": config.autosave_interval_secs,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.document_count);
        }
        OutputFormat::Human => {
            println!("Folio Status");
            println!("============");
            println!();
            println!("Storage:");
            println!("  Location:  {}", config.documents_dir().display());
            println!(
                "  Used:      {} of {}",
                human_bytes(stats.used),
                human_bytes(stats.available)
            );
            println!("  Remaining: {}", human_bytes(stats.remaining()));
            println!();
            println!("Autosave:");
            if config.autosave_interval_secs == 0 {
                println!("  disabled");
            } else {
                println!("  every {}s", config.autosave_interval_secs);
            }
            println!();
            println!("Documents: {}", stats.document_count);
        }
    }

    Ok(())
}
