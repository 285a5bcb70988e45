// ClearWhistle Library - Anonymous Organizational Report Submission
// This exposes the core components for testing and integration

pub mod collaborators;
pub mod config;
pub mod observability;
pub mod receipt;
pub mod report;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use collaborators::{
    Anchor, AnchorEntry, AnchorReceipt, AnchoringError, CodeVerifier, Collaborators,
    ContentStore, DemoCodeVerifier, DemoEmailVerifier, EmailVerifier, FsContentStore,
    LedgerAnchor, MemoryContentStore, StorageError, VerificationError,
};
pub use crate::config::{config, init_config, ClearWhistleConfig, StorageBackend};
pub use observability::{submission_metrics, OperationTimer, SubmissionMetrics};
pub use receipt::{verify_submission, ReceiptError, SubmissionVerification};
pub use report::{
    AnchorReference, ContentId, Evidence, OrganizationType, ReportDraft, ReportPayload,
    ReportType, SubmissionRecord, ValidationError, VerificationStatus,
};
pub use telemetry::{create_submission_span, generate_correlation_id, init_telemetry};
pub use workflow::{SubmissionWorkflow, WorkflowError, WorkflowSettings, WorkflowStage};
