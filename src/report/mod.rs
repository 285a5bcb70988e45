// Report data model and local validation

pub mod types;
pub mod validation;

pub use types::{
    AnchorReference, ContentId, Evidence, OrganizationType, ReportDraft, ReportPayload, ReportType,
    SubmissionRecord, VerificationStatus,
};
pub use validation::{ValidationError, DEFAULT_CODE_LENGTH, DEFAULT_MAX_EVIDENCE_BYTES};
