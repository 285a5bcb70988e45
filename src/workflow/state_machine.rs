// Submission wizard state machine
//
// Pure transitions only: the driver performs guards and collaborator calls and
// reports their outcomes here as events.

use serde::{Deserialize, Serialize};
use statig::prelude::*;
use std::fmt;

use crate::report::validation::{
    require_non_empty, require_present, validate_email, validate_evidence_size,
};
use crate::report::{
    Evidence, OrganizationType, ReportDraft, ReportType, SubmissionRecord, ValidationError,
    VerificationStatus, DEFAULT_MAX_EVIDENCE_BYTES,
};

/// Visible stage of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    OrgInfo,
    EmailVerificationPending,
    CodeEntry,
    ReportDetails,
    Submitted,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::OrgInfo => "organization info",
            WorkflowStage::EmailVerificationPending => "email verification pending",
            WorkflowStage::CodeEntry => "code entry",
            WorkflowStage::ReportDetails => "report details",
            WorkflowStage::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    EditOrgInfo {
        organization_type: Option<OrganizationType>,
        organization_name: String,
        organization_email: String,
    },
    EmailSubmitted,
    EmailAccepted,
    EmailFailed,
    CodeEntered { code: String },
    CodeAccepted,
    CodeRejected,
    EditReport {
        report_type: Option<ReportType>,
        report_title: String,
        report_details: String,
        evidence: Option<Evidence>,
    },
    SubmissionCommitted { record: SubmissionRecord },
    Back,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::EditOrgInfo { .. } => "edit_org_info",
            WorkflowEvent::EmailSubmitted => "email_submitted",
            WorkflowEvent::EmailAccepted => "email_accepted",
            WorkflowEvent::EmailFailed => "email_failed",
            WorkflowEvent::CodeEntered { .. } => "code_entered",
            WorkflowEvent::CodeAccepted => "code_accepted",
            WorkflowEvent::CodeRejected => "code_rejected",
            WorkflowEvent::EditReport { .. } => "edit_report",
            WorkflowEvent::SubmissionCommitted { .. } => "submission_committed",
            WorkflowEvent::Back => "back",
        }
    }
}

// Events carry the email and code, so Debug shows only the event name.
impl fmt::Debug for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkflowEvent::{}", self.name())
    }
}

/// State shared by every stage of one workflow instance
#[derive(Debug)]
pub struct SubmissionContext {
    pub(crate) stage: WorkflowStage,
    pub(crate) draft: ReportDraft,
    pub(crate) verification: VerificationStatus,
    pub(crate) entered_code: String,
    pub(crate) record: Option<SubmissionRecord>,
    max_evidence_bytes: usize,
}

impl Default for SubmissionContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVIDENCE_BYTES)
    }
}

impl SubmissionContext {
    pub fn new(max_evidence_bytes: usize) -> Self {
        Self {
            stage: WorkflowStage::OrgInfo,
            draft: ReportDraft::new(),
            verification: VerificationStatus::Unverified,
            entered_code: String::new(),
            record: None,
            max_evidence_bytes,
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    pub fn verification(&self) -> VerificationStatus {
        self.verification
    }

    pub fn entered_code(&self) -> &str {
        &self.entered_code
    }

    pub fn record(&self) -> Option<&SubmissionRecord> {
        self.record.as_ref()
    }

    /// Guard for leaving `OrgInfo`
    pub fn check_org_info(&self) -> Result<(), ValidationError> {
        require_present("organization type", self.draft.organization_type)?;
        require_non_empty("organization name", &self.draft.organization_name)?;
        validate_email(&self.draft.organization_email)
    }

    /// Guard for leaving `ReportDetails`
    pub fn check_report(&self) -> Result<(), ValidationError> {
        require_present("report type", self.draft.report_type)?;
        require_non_empty("report title", &self.draft.report_title)?;
        require_non_empty("report details", &self.draft.report_details)?;
        if let Some(evidence) = &self.draft.evidence {
            validate_evidence_size(evidence.size(), self.max_evidence_bytes)?;
        }
        if !self.verification.is_verified() {
            return Err(ValidationError::NotVerified);
        }
        Ok(())
    }

    fn apply_org_info(
        &mut self,
        organization_type: Option<OrganizationType>,
        organization_name: &str,
        organization_email: &str,
    ) {
        if self.draft.organization_email != organization_email
            && self.verification != VerificationStatus::Unverified
        {
            tracing::info!("Organization email changed, verification reset");
            self.verification = VerificationStatus::Unverified;
            self.entered_code.clear();
        }
        self.draft.organization_type = organization_type;
        self.draft.organization_name = organization_name.to_string();
        self.draft.organization_email = organization_email.to_string();
    }

    fn enter(&mut self, stage: WorkflowStage) {
        tracing::debug!(from = %self.stage, to = %stage, "Workflow stage changed");
        self.stage = stage;
    }
}

#[state_machine(
    initial = "State::org_info()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl SubmissionContext {
    #[state]
    fn org_info(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::EditOrgInfo {
                organization_type,
                organization_name,
                organization_email,
            } => {
                self.apply_org_info(*organization_type, organization_name, organization_email);
                Handled
            }
            WorkflowEvent::EmailSubmitted => {
                if let Err(e) = self.check_org_info() {
                    tracing::debug!(error = %e, "Organization info incomplete");
                    return Handled;
                }
                tracing::info!("Awaiting email verification");
                self.enter(WorkflowStage::EmailVerificationPending);
                Transition(State::email_verification_pending())
            }
            _ => Handled,
        }
    }

    #[state]
    fn email_verification_pending(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::EmailAccepted => {
                self.verification = VerificationStatus::CodeSent;
                tracing::info!("Verification code sent");
                self.enter(WorkflowStage::CodeEntry);
                Transition(State::code_entry())
            }
            WorkflowEvent::EmailFailed => {
                tracing::info!("Email verification failed, back to organization info");
                self.enter(WorkflowStage::OrgInfo);
                Transition(State::org_info())
            }
            _ => Handled,
        }
    }

    #[state]
    fn code_entry(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::CodeEntered { code } => {
                self.entered_code = code.clone();
                Handled
            }
            WorkflowEvent::CodeAccepted => {
                self.verification = VerificationStatus::Verified;
                tracing::info!("Organizational email verified");
                self.enter(WorkflowStage::ReportDetails);
                Transition(State::report_details())
            }
            WorkflowEvent::CodeRejected => Handled,
            WorkflowEvent::Back => {
                self.enter(WorkflowStage::OrgInfo);
                Transition(State::org_info())
            }
            _ => Handled,
        }
    }

    #[state]
    fn report_details(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::EditReport {
                report_type,
                report_title,
                report_details,
                evidence,
            } => {
                self.draft.report_type = *report_type;
                self.draft.report_title = report_title.clone();
                self.draft.report_details = report_details.clone();
                self.draft.evidence = evidence.clone();
                Handled
            }
            WorkflowEvent::SubmissionCommitted { record } => {
                if let Err(e) = self.check_report() {
                    tracing::error!(error = %e, "Refusing to record submission");
                    return Handled;
                }
                self.record = Some(record.clone());
                // The draft is not kept once the submission is durable.
                self.draft = ReportDraft::new();
                self.entered_code.clear();
                tracing::info!(
                    content_id = %record.content_id(),
                    anchor = %record.anchor_reference(),
                    "Report submitted"
                );
                self.enter(WorkflowStage::Submitted);
                Transition(State::submitted())
            }
            WorkflowEvent::Back => {
                self.enter(WorkflowStage::CodeEntry);
                Transition(State::code_entry())
            }
            _ => Handled,
        }
    }

    #[state]
    fn submitted(event: &WorkflowEvent) -> Outcome<State> {
        tracing::debug!(event = event.name(), "Ignoring event after submission");
        Handled
    }
}
