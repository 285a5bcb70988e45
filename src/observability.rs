use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Submission workflow counters
#[derive(Debug, Default)]
pub struct SubmissionMetrics {
    pub verifications_started: AtomicU64,
    pub code_checks: AtomicU64,
    pub codes_rejected: AtomicU64,
    pub uploads: AtomicU64,
    pub anchors: AtomicU64,
    pub submissions_completed: AtomicU64,
    pub validation_failures: AtomicU64,
    pub collaborator_failures: AtomicU64,
}

impl SubmissionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_verification_started(&self) {
        self.verifications_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_code_check(&self, accepted: bool) {
        self.code_checks.fetch_add(1, Ordering::Relaxed);
        if !accepted {
            self.codes_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_upload(&self) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_anchor(&self) {
        self.anchors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_completed(&self) {
        self.submissions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_collaborator_failure(&self) {
        self.collaborator_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> SubmissionStats {
        SubmissionStats {
            verifications_started: self.verifications_started.load(Ordering::Relaxed),
            code_checks: self.code_checks.load(Ordering::Relaxed),
            codes_rejected: self.codes_rejected.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            anchors: self.anchors.load(Ordering::Relaxed),
            submissions_completed: self.submissions_completed.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            collaborator_failures: self.collaborator_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            verifications = stats.verifications_started,
            code_checks = stats.code_checks,
            codes_rejected = stats.codes_rejected,
            uploads = stats.uploads,
            anchors = stats.anchors,
            completed = stats.submissions_completed,
            validation_failures = stats.validation_failures,
            collaborator_failures = stats.collaborator_failures,
            "Submission metrics"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStats {
    pub verifications_started: u64,
    pub code_checks: u64,
    pub codes_rejected: u64,
    pub uploads: u64,
    pub anchors: u64,
    pub submissions_completed: u64,
    pub validation_failures: u64,
    pub collaborator_failures: u64,
}

/// Global metrics instance
static SUBMISSION_METRICS: std::sync::LazyLock<SubmissionMetrics> =
    std::sync::LazyLock::new(SubmissionMetrics::new);

pub fn submission_metrics() -> &'static SubmissionMetrics {
    &SUBMISSION_METRICS
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
