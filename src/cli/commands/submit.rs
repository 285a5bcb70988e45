use anyhow::{Context, Result};
use clearwhistle::{
    submission_metrics, ClearWhistleConfig, Evidence, OrganizationType, ReportType,
    SubmissionWorkflow, WorkflowError, WorkflowSettings,
};
use std::path::{Path, PathBuf};

use super::open_collaborators;

pub struct SubmitCommand {
    pub organization_type: OrganizationType,
    pub organization_name: String,
    pub email: String,
    pub code: String,
    pub report_type: ReportType,
    pub title: String,
    pub details: String,
    pub evidence: Option<PathBuf>,
    pub json: bool,
}

impl SubmitCommand {
    pub async fn execute(self, config: &ClearWhistleConfig) -> Result<()> {
        let evidence = match &self.evidence {
            Some(path) => Some(read_evidence(path).await?),
            None => None,
        };

        let collaborators = open_collaborators(config).await?;
        let mut workflow =
            SubmissionWorkflow::new(collaborators, WorkflowSettings::from_config(config));

        self.progress("🏢 Checking organization details... ");
        workflow.edit_org_info(
            Some(self.organization_type),
            self.organization_name.clone(),
            self.email.clone(),
        )?;
        self.step(workflow.begin_email_verification().await)?;

        self.progress("🔑 Verifying code... ");
        self.step(workflow.submit_code(&self.code).await)?;

        self.progress("📤 Storing and anchoring report... ");
        workflow.edit_report(
            Some(self.report_type),
            self.title.clone(),
            self.details.clone(),
            evidence,
        )?;
        let record = self.step(workflow.submit_report().await)?;
        submission_metrics().log_stats();

        let url = config.storage.content_url(record.content_id().as_str());
        if self.json {
            let output = serde_json::json!({
                "contentId": record.content_id(),
                "anchorReference": record.anchor_reference(),
                "submittedAt": record.submitted_at(),
                "contentUrl": url,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!();
        println!("✅ Report submitted anonymously");
        println!("  📦 Content ID: {}", record.content_id());
        println!("  ⛓️  Anchor: {}", record.anchor_reference());
        println!("  🕒 Submitted: {}", record.submitted_at().to_rfc3339());
        println!("  🔗 {}", url);
        println!();
        println!(
            "💡 Keep the content ID: 'clearwhistle verify {}' confirms it later.",
            record.content_id()
        );
        Ok(())
    }

    fn progress(&self, message: &str) {
        if !self.json {
            print!("{message}");
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
    }

    fn step<T>(&self, result: Result<T, WorkflowError>) -> Result<T> {
        match result {
            Ok(value) => {
                if !self.json {
                    println!("✅");
                }
                Ok(value)
            }
            Err(e) => {
                if !self.json {
                    println!("❌ {}", e.user_message());
                }
                Err(e.into())
            }
        }
    }
}

async fn read_evidence(path: &Path) -> Result<Evidence> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read evidence file {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "evidence".to_string());

    let evidence = Evidence::new(filename, bytes);
    Ok(match content_type_for(path) {
        Some(content_type) => evidence.with_content_type(content_type),
        None => evidence,
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("memo.PDF")), Some("application/pdf"));
        assert_eq!(content_type_for(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("archive.xyz")), None);
        assert_eq!(content_type_for(Path::new("README")), None);
    }
}
