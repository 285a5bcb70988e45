use anyhow::{bail, Result};
use clearwhistle::{verify_submission, ClearWhistleConfig, ContentId, SubmissionVerification};

use super::{open_ledger, open_store};

pub struct VerifyCommand {
    pub content_id: String,
    pub json: bool,
}

impl VerifyCommand {
    pub async fn execute(&self, config: &ClearWhistleConfig) -> Result<()> {
        let store = open_store(config).await?;
        let ledger = open_ledger(config).await?;
        let content_id = ContentId(self.content_id.trim().to_string());

        let outcome = verify_submission(store.as_ref(), &ledger, &content_id).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("🔍 Verifying {}", content_id);
            println!();
            match &outcome {
                SubmissionVerification::Verified { entry, payload } => {
                    println!("✅ Verified");
                    println!("  📋 {} ({})", payload.report_title, payload.report_type.label());
                    println!("  ⛓️  Ledger entry #{}: {}", entry.index, entry.reference);
                    println!("  🕒 Anchored: {}", entry.anchored_at.to_rfc3339());
                }
                SubmissionVerification::NotAnchored { payload } => {
                    println!("⚠️  Stored but not anchored");
                    println!("  📋 {}", payload.report_title);
                }
                SubmissionVerification::Missing { entry } => {
                    println!("❌ No stored report for this content ID");
                    if let Some(entry) = entry {
                        println!(
                            "  ⛓️  Anchored as ledger entry #{}, but the content is gone",
                            entry.index
                        );
                    }
                }
            }
        }

        if !outcome.is_verified() {
            bail!("submission {} is {}", content_id, outcome.status());
        }
        Ok(())
    }
}
