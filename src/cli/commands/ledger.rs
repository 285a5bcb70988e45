use anyhow::Result;
use clearwhistle::ClearWhistleConfig;

use super::open_ledger;

pub struct LedgerCommand {
    pub json: bool,
}

impl LedgerCommand {
    pub async fn execute(&self, config: &ClearWhistleConfig) -> Result<()> {
        // Opening re-verifies the whole chain and fails on tampering.
        let ledger = open_ledger(config).await?;
        ledger.verify().await?;
        let entries = ledger.entries().await;

        if self.json {
            let output = serde_json::json!({
                "verified": true,
                "count": entries.len(),
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("⛓️  CLEARWHISTLE LEDGER");
        println!("==========================");
        if entries.is_empty() {
            println!("📋 No reports anchored yet");
            return Ok(());
        }

        for entry in &entries {
            println!("#{} {}", entry.index, entry.content_id);
            println!("   🔗 {}", entry.reference);
            println!("   🕒 {}", entry.anchored_at.to_rfc3339());
        }
        println!();
        println!("✅ Chain verified ({} entries)", entries.len());
        Ok(())
    }
}
