use std::env;
use std::sync::Arc;

use anyhow::Result;

use inspections_backend::config::AppConfig;
use inspections_backend::repo::attachments::AttachmentRepository;
use inspections_backend::store::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("reindex-attachments") => reindex_attachments().await?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\nUsage: maintenance reindex-attachments");
            std::process::exit(1);
        }
        None => {
            eprintln!("Usage: maintenance reindex-attachments");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Migrates every record's attachments onto the canonical storage keys so
/// reads no longer depend on the legacy fallback layouts.
async fn reindex_attachments() -> Result<()> {
    let config = AppConfig::from_env()?;
    let store = Arc::new(FileStore::open(&config.data_path)?);
    let attachments = AttachmentRepository::new(store);

    let (records, total) = attachments.reindex().await?;
    if records == 0 {
        println!("No attachments found.");
        return Ok(());
    }

    println!("Reindexed {total} attachments across {records} records.");
    Ok(())
}
