//! Async driver for the submission wizard
//!
//! Checks each stage's guard locally, calls the collaborators with explicit
//! deadlines, and feeds the outcomes to the state machine. Every operation
//! takes `&mut self`, so a workflow instance never has two collaborator calls
//! in flight.

use chrono::Utc;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use statig::prelude::*;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{info, warn, Instrument};

use super::error::WorkflowError;
use super::state_machine::{SubmissionContext, WorkflowEvent, WorkflowStage};
use crate::collaborators::{within, Collaborators, VerificationError};
use crate::config::ClearWhistleConfig;
use crate::observability::{submission_metrics, OperationTimer};
use crate::report::validation::validate_code;
use crate::report::{
    Evidence, OrganizationType, ReportDraft, ReportPayload, ReportType, SubmissionRecord,
    ValidationError, VerificationStatus, DEFAULT_CODE_LENGTH, DEFAULT_MAX_EVIDENCE_BYTES,
};
use crate::telemetry::{create_submission_span, generate_correlation_id};

/// Limits and deadlines for one workflow instance
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub code_length: usize,
    pub max_evidence_bytes: usize,
    pub code_attempts_per_minute: Option<NonZeroU32>,
    pub verification_timeout: Duration,
    pub storage_timeout: Duration,
    pub anchoring_timeout: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            max_evidence_bytes: DEFAULT_MAX_EVIDENCE_BYTES,
            code_attempts_per_minute: None,
            verification_timeout: Duration::from_secs(10),
            storage_timeout: Duration::from_secs(30),
            anchoring_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &ClearWhistleConfig) -> Self {
        Self {
            code_length: config.verification.code_length,
            max_evidence_bytes: config.storage.max_evidence_bytes,
            code_attempts_per_minute: config
                .verification
                .code_attempts_per_minute
                .and_then(NonZeroU32::new),
            verification_timeout: config.verification.call_timeout(),
            storage_timeout: config.storage.call_timeout(),
            anchoring_timeout: config.anchoring.call_timeout(),
        }
    }
}

/// One reporter's pass through the submission wizard
pub struct SubmissionWorkflow {
    machine: StateMachine<SubmissionContext>,
    collaborators: Collaborators,
    settings: WorkflowSettings,
    code_limiter: Option<DefaultDirectRateLimiter>,
    // Reused on retry so a resubmission uploads byte-identical content.
    pending_payload: Option<ReportPayload>,
    last_error: Option<String>,
    correlation_id: String,
    span: tracing::Span,
}

impl SubmissionWorkflow {
    pub fn new(collaborators: Collaborators, settings: WorkflowSettings) -> Self {
        let correlation_id = generate_correlation_id();
        let span = create_submission_span(&correlation_id);
        let code_limiter = settings
            .code_attempts_per_minute
            .map(|n| RateLimiter::direct(Quota::per_minute(n)));

        Self {
            machine: SubmissionContext::new(settings.max_evidence_bytes).state_machine(),
            collaborators,
            settings,
            code_limiter,
            pending_payload: None,
            last_error: None,
            correlation_id,
            span,
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        self.machine.inner().stage()
    }

    pub fn draft(&self) -> &ReportDraft {
        self.machine.inner().draft()
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.machine.inner().verification()
    }

    pub fn record(&self) -> Option<&SubmissionRecord> {
        self.machine.inner().record()
    }

    /// Message for the most recent failure, cleared by the next operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn edit_org_info(
        &mut self,
        organization_type: Option<OrganizationType>,
        organization_name: impl Into<String>,
        organization_email: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.last_error = None;
        self.require_stage(WorkflowStage::OrgInfo, "edit organization info")?;
        self.machine.handle(&WorkflowEvent::EditOrgInfo {
            organization_type,
            organization_name: organization_name.into(),
            organization_email: organization_email.into(),
        });
        Ok(())
    }

    /// `OrgInfo -> EmailVerificationPending -> CodeEntry`
    pub async fn begin_email_verification(&mut self) -> Result<(), WorkflowError> {
        self.last_error = None;
        self.require_stage(WorkflowStage::OrgInfo, "verify email")?;
        let guard = self.machine.inner().check_org_info();
        if let Err(e) = guard {
            return Err(self.fail(e.into()));
        }

        self.machine.handle(&WorkflowEvent::EmailSubmitted);
        submission_metrics().record_verification_started();

        let email = self.draft().organization_email.clone();
        let timer = OperationTimer::new("begin_verification");
        let result = within(
            self.settings.verification_timeout,
            "begin_verification",
            self.collaborators.email.begin_verification(&email),
        )
        .instrument(self.span.clone())
        .await;
        timer.finish();

        match result {
            Ok(()) => {
                self.machine.handle(&WorkflowEvent::EmailAccepted);
                Ok(())
            }
            Err(VerificationError::EmailFormat) => {
                self.machine.handle(&WorkflowEvent::EmailFailed);
                Err(self.fail(ValidationError::InvalidEmail.into()))
            }
            Err(e) => {
                self.machine.handle(&WorkflowEvent::EmailFailed);
                Err(self.fail(WorkflowError::EmailVerification(e)))
            }
        }
    }

    /// `CodeEntry -> ReportDetails`
    pub async fn submit_code(&mut self, code: &str) -> Result<(), WorkflowError> {
        self.last_error = None;
        self.require_stage(WorkflowStage::CodeEntry, "verify code")?;
        self.machine.handle(&WorkflowEvent::CodeEntered {
            code: code.to_string(),
        });

        if let Err(e) = validate_code(code, self.settings.code_length) {
            return Err(self.fail(e.into()));
        }
        if let Some(limiter) = &self.code_limiter {
            if limiter.check().is_err() {
                let limited = WorkflowError::CodeVerification(VerificationError::RateLimited);
                return Err(self.fail(limited));
            }
        }

        let email = self.draft().organization_email.clone();
        let timer = OperationTimer::new("check_code");
        let result = within(
            self.settings.verification_timeout,
            "check_code",
            self.collaborators.code.check_code(&email, code),
        )
        .instrument(self.span.clone())
        .await;
        timer.finish();

        match result {
            Ok(true) => {
                submission_metrics().record_code_check(true);
                self.machine.handle(&WorkflowEvent::CodeAccepted);
                Ok(())
            }
            Ok(false) => {
                submission_metrics().record_code_check(false);
                self.machine.handle(&WorkflowEvent::CodeRejected);
                Err(self.fail(WorkflowError::InvalidCode))
            }
            Err(e) => Err(self.fail(WorkflowError::CodeVerification(e))),
        }
    }

    pub fn edit_report(
        &mut self,
        report_type: Option<ReportType>,
        report_title: impl Into<String>,
        report_details: impl Into<String>,
        evidence: Option<Evidence>,
    ) -> Result<(), WorkflowError> {
        self.last_error = None;
        self.require_stage(WorkflowStage::ReportDetails, "edit report")?;

        let report_title = report_title.into();
        let report_details = report_details.into();
        let draft = self.draft();
        let unchanged = draft.report_type == report_type
            && draft.report_title == report_title
            && draft.report_details == report_details
            && draft.evidence == evidence;
        if !unchanged {
            self.pending_payload = None;
        }

        self.machine.handle(&WorkflowEvent::EditReport {
            report_type,
            report_title,
            report_details,
            evidence,
        });
        Ok(())
    }

    /// `ReportDetails -> Submitted`: upload, then anchor, then record
    ///
    /// Both collaborator calls must succeed. On any failure the workflow stays
    /// on `ReportDetails` with the draft intact and no record is created.
    pub async fn submit_report(&mut self) -> Result<SubmissionRecord, WorkflowError> {
        self.last_error = None;
        self.require_stage(WorkflowStage::ReportDetails, "submit report")?;
        let guard = self.machine.inner().check_report();
        if let Err(e) = guard {
            return Err(self.fail(e.into()));
        }

        let payload = match self.pending_payload.clone() {
            Some(payload) => payload,
            None => {
                let verified = self.verification_status().is_verified();
                let built = self.draft().to_payload(Utc::now(), verified);
                match built {
                    Ok(payload) => payload,
                    Err(e) => return Err(self.fail(e.into())),
                }
            }
        };
        self.pending_payload = Some(payload.clone());

        let timer = OperationTimer::new("upload");
        let uploaded = within(
            self.settings.storage_timeout,
            "upload",
            self.collaborators.store.upload(&payload),
        )
        .instrument(self.span.clone())
        .await;
        timer.finish();
        let content_id = match uploaded {
            Ok(content_id) => content_id,
            Err(e) => return Err(self.fail(e.into())),
        };
        submission_metrics().record_upload();

        let timer = OperationTimer::new("anchor");
        let anchored = within(
            self.settings.anchoring_timeout,
            "anchor",
            self.collaborators.anchor.anchor(&content_id),
        )
        .instrument(self.span.clone())
        .await;
        timer.finish();
        let receipt = match anchored {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    parent: &self.span,
                    content_id = %content_id,
                    "Content uploaded but not anchored; a retry reuses the same content"
                );
                return Err(self.fail(e.into()));
            }
        };
        submission_metrics().record_anchor();

        let record = SubmissionRecord::new(content_id, receipt.reference, receipt.anchored_at);
        self.machine.handle(&WorkflowEvent::SubmissionCommitted {
            record: record.clone(),
        });
        self.pending_payload = None;
        submission_metrics().record_submission_completed();
        info!(
            parent: &self.span,
            content_id = %record.content_id(),
            anchor_index = receipt.index,
            "Submission complete"
        );
        Ok(record)
    }

    /// `CodeEntry -> OrgInfo`, `ReportDetails -> CodeEntry`; discards nothing
    pub fn back(&mut self) {
        self.last_error = None;
        self.machine.handle(&WorkflowEvent::Back);
    }

    fn require_stage(
        &mut self,
        expected: WorkflowStage,
        operation: &'static str,
    ) -> Result<(), WorkflowError> {
        let stage = self.stage();
        if stage != expected {
            return Err(self.fail(WorkflowError::WrongStage { stage, operation }));
        }
        Ok(())
    }

    fn fail(&mut self, error: WorkflowError) -> WorkflowError {
        if error.is_local() {
            submission_metrics().record_validation_failure();
        } else {
            submission_metrics().record_collaborator_failure();
        }
        warn!(parent: &self.span, stage = %self.stage(), error = %error, "Workflow step failed");
        self.last_error = Some(error.user_message());
        error
    }
}

impl std::fmt::Debug for SubmissionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionWorkflow")
            .field("stage", &self.stage())
            .field("verification", &self.verification_status())
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}
