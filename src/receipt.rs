//! Receipt verification for past submissions
//!
//! Given a content identifier, confirm that the stored report still matches
//! it and that the ledger holds an entry anchoring it.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::collaborators::{Anchor, AnchorEntry, AnchoringError, ContentStore, StorageError};
use crate::report::{ContentId, ReportPayload};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Anchoring(#[from] AnchoringError),
}

/// Outcome of checking one content identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum SubmissionVerification {
    /// Stored and anchored
    Verified {
        entry: AnchorEntry,
        payload: ReportPayload,
    },
    /// Stored, but no ledger entry commits to it
    NotAnchored { payload: ReportPayload },
    /// Nothing stored under this identifier
    Missing { entry: Option<AnchorEntry> },
}

impl SubmissionVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, SubmissionVerification::Verified { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            SubmissionVerification::Verified { .. } => "verified",
            SubmissionVerification::NotAnchored { .. } => "not-anchored",
            SubmissionVerification::Missing { .. } => "missing",
        }
    }
}

/// Look up `content_id` in both the store and the ledger
///
/// Content whose bytes no longer hash to `content_id` is an error, not a
/// `Missing` result.
pub async fn verify_submission(
    store: &dyn ContentStore,
    anchor: &dyn Anchor,
    content_id: &ContentId,
) -> Result<SubmissionVerification, ReceiptError> {
    let entry = anchor.lookup(content_id).await?;

    let payload = match store.retrieve(content_id).await {
        Ok(payload) => payload,
        Err(StorageError::NotFound(_)) => {
            warn!(
                content_id = %content_id,
                anchored = entry.is_some(),
                "No stored content for identifier"
            );
            return Ok(SubmissionVerification::Missing { entry });
        }
        Err(e) => return Err(e.into()),
    };

    let outcome = match entry {
        Some(entry) => SubmissionVerification::Verified { entry, payload },
        None => SubmissionVerification::NotAnchored { payload },
    };
    info!(content_id = %content_id, status = outcome.status(), "Checked submission receipt");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::anchor::MockAnchor;
    use crate::collaborators::{content_id_for, LedgerAnchor, MemoryContentStore};
    use crate::report::{OrganizationType, ReportType};
    use chrono::Utc;

    fn payload() -> ReportPayload {
        ReportPayload {
            organization_type: OrganizationType::Government,
            organization_name: "Parks Department".to_string(),
            report_type: ReportType::Safety,
            report_title: "Broken railings".to_string(),
            report_details: "Railings on the north bridge are loose".to_string(),
            evidence: None,
            timestamp: Utc::now(),
            organization_verified: true,
        }
    }

    #[tokio::test]
    async fn test_stored_and_anchored_is_verified() {
        let store = MemoryContentStore::new();
        let ledger = LedgerAnchor::in_memory();
        let stored = payload();
        let cid = store.upload(&stored).await.unwrap();
        let receipt = ledger.anchor(&cid).await.unwrap();

        let outcome = verify_submission(&store, &ledger, &cid).await.unwrap();
        match outcome {
            SubmissionVerification::Verified { entry, payload } => {
                assert_eq!(entry.reference, receipt.reference);
                assert_eq!(payload, stored);
            }
            other => panic!("expected verified, got {}", other.status()),
        }
    }

    #[tokio::test]
    async fn test_unanchored_upload() {
        let store = MemoryContentStore::new();
        let ledger = LedgerAnchor::in_memory();
        let cid = store.upload(&payload()).await.unwrap();

        let outcome = verify_submission(&store, &ledger, &cid).await.unwrap();
        assert_eq!(outcome.status(), "not-anchored");
        assert!(!outcome.is_verified());
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_missing() {
        let store = MemoryContentStore::new();
        let ledger = LedgerAnchor::in_memory();
        let cid = content_id_for(b"never uploaded");

        let outcome = verify_submission(&store, &ledger, &cid).await.unwrap();
        assert_eq!(outcome, SubmissionVerification::Missing { entry: None });
    }

    #[tokio::test]
    async fn test_anchoring_failure_propagates() {
        let store = MemoryContentStore::new();
        let mut anchor = MockAnchor::new();
        anchor.expect_lookup().returning(|_| {
            Err(AnchoringError::Unavailable {
                message: "node unreachable".to_string(),
            })
        });

        let cid = content_id_for(b"anything");
        let err = verify_submission(&store, &anchor, &cid).await.unwrap_err();
        assert!(matches!(err, ReceiptError::Anchoring(_)));
    }
}
