//! Recording collaborators for integration tests
//!
//! Each fake forwards to the real local implementation and appends what it was
//! asked to do to a shared call log, so tests can assert on call order and on
//! calls that must never happen.
#![allow(dead_code)]

use async_trait::async_trait;
use clearwhistle::{
    Anchor, AnchorEntry, AnchorReceipt, AnchoringError, CodeVerifier, Collaborators, ContentId,
    ContentStore, DemoCodeVerifier, DemoEmailVerifier, EmailVerifier, LedgerAnchor,
    MemoryContentStore, OrganizationType, ReportPayload, ReportType, StorageError,
    SubmissionWorkflow, VerificationError, WorkflowSettings,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BeginVerification,
    CheckCode { code: String },
    Upload { content_id: Option<ContentId> },
    Anchor { content_id: ContentId },
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| matches(c)).count()
    }
}

/// Fails the next `n` calls, then succeeds
#[derive(Debug, Clone, Default)]
pub struct FailNext(Arc<AtomicUsize>);

impl FailNext {
    pub fn set(&self, n: usize) {
        self.0.store(n, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

pub struct RecordingEmailVerifier {
    pub log: CallLog,
    pub failures: FailNext,
    inner: DemoEmailVerifier,
}

#[async_trait]
impl EmailVerifier for RecordingEmailVerifier {
    async fn begin_verification(&self, email: &str) -> Result<(), VerificationError> {
        self.log.push(Call::BeginVerification);
        if self.failures.take() {
            return Err(VerificationError::ServiceUnavailable {
                message: "mail relay unreachable".to_string(),
            });
        }
        self.inner.begin_verification(email).await
    }
}

pub struct RecordingCodeVerifier {
    pub log: CallLog,
    inner: DemoCodeVerifier,
}

#[async_trait]
impl CodeVerifier for RecordingCodeVerifier {
    async fn check_code(&self, email: &str, code: &str) -> Result<bool, VerificationError> {
        self.log.push(Call::CheckCode {
            code: code.to_string(),
        });
        self.inner.check_code(email, code).await
    }
}

pub struct RecordingStore {
    pub log: CallLog,
    pub failures: FailNext,
    pub inner: Arc<MemoryContentStore>,
}

#[async_trait]
impl ContentStore for RecordingStore {
    async fn upload(&self, payload: &ReportPayload) -> Result<ContentId, StorageError> {
        if self.failures.take() {
            self.log.push(Call::Upload { content_id: None });
            return Err(StorageError::Unavailable {
                message: "gateway returned 503".to_string(),
            });
        }
        let content_id = self.inner.upload(payload).await?;
        self.log.push(Call::Upload {
            content_id: Some(content_id.clone()),
        });
        Ok(content_id)
    }

    async fn retrieve(&self, content_id: &ContentId) -> Result<ReportPayload, StorageError> {
        self.inner.retrieve(content_id).await
    }
}

pub struct RecordingAnchor {
    pub log: CallLog,
    pub failures: FailNext,
    pub inner: Arc<LedgerAnchor>,
}

#[async_trait]
impl Anchor for RecordingAnchor {
    async fn anchor(&self, content_id: &ContentId) -> Result<AnchorReceipt, AnchoringError> {
        self.log.push(Call::Anchor {
            content_id: content_id.clone(),
        });
        if self.failures.take() {
            return Err(AnchoringError::Unavailable {
                message: "ledger node unreachable".to_string(),
            });
        }
        self.inner.anchor(content_id).await
    }

    async fn lookup(&self, content_id: &ContentId) -> Result<Option<AnchorEntry>, AnchoringError> {
        self.inner.lookup(content_id).await
    }

    async fn entry(&self, index: u64) -> Result<Option<AnchorEntry>, AnchoringError> {
        self.inner.entry(index).await
    }

    async fn count(&self) -> Result<u64, AnchoringError> {
        self.inner.count().await
    }
}

/// Handles onto the recording collaborators behind a workflow
pub struct Harness {
    pub log: CallLog,
    pub email_failures: FailNext,
    pub upload_failures: FailNext,
    pub anchor_failures: FailNext,
    pub store: Arc<MemoryContentStore>,
    pub ledger: Arc<LedgerAnchor>,
    pub collaborators: Collaborators,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::default();
        let email_failures = FailNext::default();
        let upload_failures = FailNext::default();
        let anchor_failures = FailNext::default();
        let store = Arc::new(MemoryContentStore::new());
        let ledger = Arc::new(LedgerAnchor::in_memory());

        let collaborators = Collaborators::new(
            Arc::new(RecordingEmailVerifier {
                log: log.clone(),
                failures: email_failures.clone(),
                inner: DemoEmailVerifier::new(),
            }),
            Arc::new(RecordingCodeVerifier {
                log: log.clone(),
                inner: DemoCodeVerifier::default(),
            }),
            Arc::new(RecordingStore {
                log: log.clone(),
                failures: upload_failures.clone(),
                inner: Arc::clone(&store),
            }),
            Arc::new(RecordingAnchor {
                log: log.clone(),
                failures: anchor_failures.clone(),
                inner: Arc::clone(&ledger),
            }),
        );

        Self {
            log,
            email_failures,
            upload_failures,
            anchor_failures,
            store,
            ledger,
            collaborators,
        }
    }

    pub fn workflow(&self) -> SubmissionWorkflow {
        self.workflow_with(WorkflowSettings::default())
    }

    pub fn workflow_with(&self, settings: WorkflowSettings) -> SubmissionWorkflow {
        SubmissionWorkflow::new(self.collaborators.clone(), settings)
    }
}

/// Drive a fresh workflow up to the report details stage
pub async fn verified_workflow(harness: &Harness) -> SubmissionWorkflow {
    let mut workflow = harness.workflow();
    workflow
        .edit_org_info(Some(OrganizationType::Company), "Acme", "a@acme.com")
        .unwrap();
    workflow.begin_email_verification().await.unwrap();
    workflow.submit_code("123456").await.unwrap();
    workflow
        .edit_report(Some(ReportType::Ethics), "Title", "Details", None)
        .unwrap();
    workflow
}
