// Filesystem store and persisted ledger behavior across process restarts

use chrono::Utc;
use clearwhistle::{
    verify_submission, Anchor, AnchoringError, Collaborators, ContentStore, DemoCodeVerifier,
    DemoEmailVerifier, FsContentStore, LedgerAnchor, OrganizationType, ReportPayload, ReportType,
    SubmissionVerification, SubmissionWorkflow, WorkflowSettings,
};
use std::sync::Arc;
use tempfile::TempDir;

fn payload(title: &str) -> ReportPayload {
    ReportPayload {
        organization_type: OrganizationType::School,
        organization_name: "Lincoln High".to_string(),
        report_type: ReportType::Harassment,
        report_title: title.to_string(),
        report_details: "Repeated incidents after class".to_string(),
        evidence: None,
        timestamp: Utc::now(),
        organization_verified: true,
    }
}

#[tokio::test]
async fn test_submission_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("ledger.jsonl");

    let record = {
        let store = FsContentStore::open(dir.path()).await.unwrap();
        let ledger = LedgerAnchor::open(&ledger_path).await.unwrap();
        let collaborators = Collaborators::new(
            Arc::new(DemoEmailVerifier::new()),
            Arc::new(DemoCodeVerifier::default()),
            Arc::new(store),
            Arc::new(ledger),
        );
        let mut workflow = SubmissionWorkflow::new(collaborators, WorkflowSettings::default());
        workflow
            .edit_org_info(Some(OrganizationType::Government), "City Hall", "clerk@city.gov")
            .unwrap();
        workflow.begin_email_verification().await.unwrap();
        workflow.submit_code("123456").await.unwrap();
        workflow
            .edit_report(Some(ReportType::Financial), "Budget diversion", "Details", None)
            .unwrap();
        workflow.submit_report().await.unwrap()
    };

    let store = FsContentStore::open(dir.path()).await.unwrap();
    let ledger = LedgerAnchor::open(&ledger_path).await.unwrap();
    let outcome = verify_submission(&store, &ledger, record.content_id())
        .await
        .unwrap();

    match outcome {
        SubmissionVerification::Verified { entry, payload } => {
            assert_eq!(&entry.reference, record.anchor_reference());
            assert_eq!(payload.report_title, "Budget diversion");
        }
        other => panic!("expected verified submission, got {}", other.status()),
    }
}

#[tokio::test]
async fn test_ledger_appends_in_order_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("ledger.jsonl");
    let store = FsContentStore::open(dir.path()).await.unwrap();

    let first = store.upload(&payload("first")).await.unwrap();
    let second = store.upload(&payload("second")).await.unwrap();

    {
        let ledger = LedgerAnchor::open(&path).await.unwrap();
        ledger.anchor(&first).await.unwrap();
    }
    let ledger = LedgerAnchor::open(&path).await.unwrap();
    let receipt = ledger.anchor(&second).await.unwrap();

    assert_eq!(receipt.index, 1);
    assert_eq!(ledger.count().await.unwrap(), 2);
    let entries = ledger.entries().await;
    assert_eq!(entries[1].previous_reference, entries[0].reference);
    ledger.verify().await.unwrap();
}

#[tokio::test]
async fn test_edited_ledger_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let store = FsContentStore::open(dir.path()).await.unwrap();
    let original = store.upload(&payload("original")).await.unwrap();
    let substitute = store.upload(&payload("substitute")).await.unwrap();

    {
        let ledger = LedgerAnchor::open(&path).await.unwrap();
        ledger.anchor(&original).await.unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::write(
        &path,
        contents.replace(original.as_str(), substitute.as_str()),
    )
    .unwrap();

    let err = LedgerAnchor::open(&path).await.unwrap_err();
    assert!(matches!(err, AnchoringError::ChainBroken { index: 0, .. }));
}

#[tokio::test]
async fn test_deleted_object_reported_missing() {
    let dir = TempDir::new().unwrap();
    let store = FsContentStore::open(dir.path()).await.unwrap();
    let ledger = LedgerAnchor::in_memory();
    let cid = store.upload(&payload("gone")).await.unwrap();
    ledger.anchor(&cid).await.unwrap();

    std::fs::remove_file(dir.path().join("objects").join(format!("{}.json", cid))).unwrap();

    let outcome = verify_submission(&store, &ledger, &cid).await.unwrap();
    match outcome {
        SubmissionVerification::Missing { entry } => assert!(entry.is_some()),
        other => panic!("expected missing content, got {}", other.status()),
    }
}
