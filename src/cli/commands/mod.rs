use anyhow::{Context, Result};
use clearwhistle::{
    ClearWhistleConfig, Collaborators, ContentStore, DemoCodeVerifier, DemoEmailVerifier,
    FsContentStore, LedgerAnchor, MemoryContentStore, StorageBackend,
};
use std::sync::Arc;

pub mod ledger;
pub mod show;
pub mod submit;
pub mod verify;

pub async fn open_store(config: &ClearWhistleConfig) -> Result<Arc<dyn ContentStore>> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryContentStore::new())),
        StorageBackend::Filesystem => {
            let store = FsContentStore::open(&config.storage.data_dir)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open content store at {}",
                        config.storage.data_dir.display()
                    )
                })?;
            Ok(Arc::new(store))
        }
    }
}

pub async fn open_ledger(config: &ClearWhistleConfig) -> Result<LedgerAnchor> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(LedgerAnchor::in_memory()),
        StorageBackend::Filesystem => {
            let path = config.ledger_path();
            LedgerAnchor::open(&path)
                .await
                .with_context(|| format!("Failed to open ledger at {}", path.display()))
        }
    }
}

/// Demo verifiers in front of the configured store and ledger
pub async fn open_collaborators(config: &ClearWhistleConfig) -> Result<Collaborators> {
    Ok(Collaborators::new(
        Arc::new(DemoEmailVerifier::new()),
        Arc::new(DemoCodeVerifier::new(config.verification.demo_code.clone())),
        open_store(config).await?,
        Arc::new(open_ledger(config).await?),
    ))
}

pub async fn show_how_to_submit() -> Result<()> {
    println!("🕊️  ClearWhistle - Anonymous Organizational Reporting");
    println!();
    println!("To submit a report:");
    println!("  📝 clearwhistle submit --org-type company --org-name Acme \\");
    println!("       --email you@acme.com --code 123456 \\");
    println!("       --report-type ethics --title 'Title' --details 'What happened'");
    println!();
    println!("After submitting:");
    println!("  🔍 clearwhistle verify <CID>   # Check a report is stored and anchored");
    println!("  📄 clearwhistle show <CID>     # Print a stored report");
    println!("  ⛓️  clearwhistle ledger         # List anchored reports");
    println!();
    println!("💡 Your organizational email is only used for verification and is never stored.");
    Ok(())
}
