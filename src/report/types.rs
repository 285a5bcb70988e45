// Core types for report drafts and submission records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validation::ValidationError;

/// Kind of organization the reporter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    Company,
    School,
    Government,
    Nonprofit,
}

impl OrganizationType {
    pub const ALL: [OrganizationType; 4] = [
        OrganizationType::Company,
        OrganizationType::School,
        OrganizationType::Government,
        OrganizationType::Nonprofit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Company => "company",
            OrganizationType::School => "school",
            OrganizationType::Government => "government",
            OrganizationType::Nonprofit => "nonprofit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrganizationType::Company => "Company",
            OrganizationType::School => "School",
            OrganizationType::Government => "Government",
            OrganizationType::Nonprofit => "Non-profit",
        }
    }
}

impl fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| {
                t.as_str() == normalized
                    || (normalized == "non-profit" && *t == OrganizationType::Nonprofit)
            })
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: "organization type",
                value: s.to_string(),
            })
    }
}

/// Category of misconduct being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Financial,
    Harassment,
    Safety,
    Ethics,
    Other,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Financial,
        ReportType::Harassment,
        ReportType::Safety,
        ReportType::Ethics,
        ReportType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Financial => "financial",
            ReportType::Harassment => "harassment",
            ReportType::Safety => "safety",
            ReportType::Ethics => "ethics",
            ReportType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Financial => "Financial Misconduct",
            ReportType::Harassment => "Harassment or Discrimination",
            ReportType::Safety => "Safety Violations",
            ReportType::Ethics => "Ethical Violations",
            ReportType::Other => "Other",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownVariant {
                field: "report type",
                value: s.to_string(),
            })
    }
}

/// Optional file attached to a report
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
}

impl Evidence {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// Attachments can be large; keep Debug output to metadata.
impl fmt::Debug for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evidence")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

/// In-progress submission owned by a single workflow instance
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ReportDraft {
    pub organization_type: Option<OrganizationType>,
    pub organization_name: String,
    pub organization_email: String,
    pub report_type: Option<ReportType>,
    pub report_title: String,
    pub report_details: String,
    pub evidence: Option<Evidence>,
}

impl ReportDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the storage payload. The organizational email is never part of it.
    pub fn to_payload(
        &self,
        timestamp: DateTime<Utc>,
        organization_verified: bool,
    ) -> Result<ReportPayload, ValidationError> {
        let organization_type = self
            .organization_type
            .ok_or(ValidationError::EmptyField("organization type"))?;
        let report_type = self
            .report_type
            .ok_or(ValidationError::EmptyField("report type"))?;

        Ok(ReportPayload {
            organization_type,
            organization_name: self.organization_name.clone(),
            report_type,
            report_title: self.report_title.clone(),
            report_details: self.report_details.clone(),
            evidence: self.evidence.clone(),
            timestamp,
            organization_verified,
        })
    }
}

// The email must not leak through debug logging.
impl fmt::Debug for ReportDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportDraft")
            .field("organization_type", &self.organization_type)
            .field("organization_name", &self.organization_name)
            .field("organization_email", &"<redacted>")
            .field("report_type", &self.report_type)
            .field("report_title", &self.report_title)
            .field("report_details_len", &self.report_details.len())
            .field("evidence", &self.evidence)
            .finish()
    }
}

/// Report content handed to the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub organization_type: OrganizationType,
    pub organization_name: String,
    pub report_type: ReportType,
    pub report_title: String,
    pub report_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    pub timestamp: DateTime<Utc>,
    pub organization_verified: bool,
}

impl ReportPayload {
    /// Canonical bytes used for content addressing.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Whether the organizational email has been confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    CodeSent,
    Verified,
}

impl VerificationStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }
}

/// Opaque identifier of stored report content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        ContentId(value.to_string())
    }
}

/// Opaque reference to an anchored ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorReference(pub String);

impl AnchorReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnchorReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    content_id: ContentId,
    anchor_reference: AnchorReference,
    submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub(crate) fn new(
        content_id: ContentId,
        anchor_reference: AnchorReference,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            content_id,
            anchor_reference,
            submitted_at,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn anchor_reference(&self) -> &AnchorReference {
        &self.anchor_reference
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_type_parsing() {
        assert_eq!("company".parse::<OrganizationType>().unwrap(), OrganizationType::Company);
        assert_eq!(" School ".parse::<OrganizationType>().unwrap(), OrganizationType::School);
        assert_eq!("non-profit".parse::<OrganizationType>().unwrap(), OrganizationType::Nonprofit);
        assert!("church".parse::<OrganizationType>().is_err());
    }

    #[test]
    fn test_report_type_labels() {
        assert_eq!(ReportType::Ethics.label(), "Ethical Violations");
        assert_eq!("FINANCIAL".parse::<ReportType>().unwrap(), ReportType::Financial);
        assert!("gossip".parse::<ReportType>().is_err());
    }

    #[test]
    fn test_payload_excludes_email() {
        let draft = ReportDraft {
            organization_type: Some(OrganizationType::Company),
            organization_name: "Acme".to_string(),
            organization_email: "a@acme.com".to_string(),
            report_type: Some(ReportType::Ethics),
            report_title: "Title".to_string(),
            report_details: "Details".to_string(),
            evidence: None,
        };

        let payload = draft.to_payload(Utc::now(), true).unwrap();
        let json = String::from_utf8(payload.canonical_bytes().unwrap()).unwrap();

        assert!(!json.contains("a@acme.com"));
        assert!(json.contains("\"organizationVerified\":true"));
        assert!(json.contains("\"reportType\":\"ethics\""));
    }

    #[test]
    fn test_draft_debug_redacts_email() {
        let draft = ReportDraft {
            organization_email: "whistle@corp.example".to_string(),
            ..Default::default()
        };

        let debug = format!("{draft:?}");
        assert!(!debug.contains("whistle@corp.example"));
    }

    #[test]
    fn test_evidence_round_trips_through_payload_json() {
        let evidence = Evidence::new("memo.pdf", vec![0xde, 0xad, 0xbe, 0xef])
            .with_content_type("application/pdf");
        let json = serde_json::to_string(&evidence).unwrap();
        assert!(json.contains("deadbeef"));

        let back: Evidence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, evidence);
        assert_eq!(back.size(), 4);
    }
}
