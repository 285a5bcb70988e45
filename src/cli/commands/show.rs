use anyhow::{Context, Result};
use clearwhistle::{ClearWhistleConfig, ContentId};

use super::open_store;

pub struct ShowCommand {
    pub content_id: String,
    pub json: bool,
}

impl ShowCommand {
    pub async fn execute(&self, config: &ClearWhistleConfig) -> Result<()> {
        let store = open_store(config).await?;
        let content_id = ContentId(self.content_id.trim().to_string());
        let payload = store
            .retrieve(&content_id)
            .await
            .with_context(|| format!("Failed to load report {content_id}"))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        println!("📄 {}", payload.report_title);
        println!("==========================");
        println!(
            "  🏢 {} ({})",
            payload.organization_name,
            payload.organization_type.label()
        );
        println!("  🏷️  {}", payload.report_type.label());
        println!("  🕒 {}", payload.timestamp.to_rfc3339());
        if payload.organization_verified {
            println!("  ✅ Organization email verified");
        } else {
            println!("  ⚠️  Organization email not verified");
        }
        if let Some(evidence) = &payload.evidence {
            println!("  📎 {} ({} bytes)", evidence.filename, evidence.size());
        }
        println!();
        println!("{}", payload.report_details);
        Ok(())
    }
}
