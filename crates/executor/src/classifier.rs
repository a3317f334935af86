//! Failure classification.
//!
//! Turns a raw [`StepError`] into a [`ClassifiedFailure`] the caller can act on without
//! inspecting the original error. Nothing here drives control flow inside the
//! coordinator; fingerprints exist for grouping and alerting only.

use sha2::{Digest, Sha256};
use std::fmt;
use swapflow_types::{CapabilityError, StepKind};

use crate::StepError;

/// What went wrong, at the granularity the caller needs to pick a remedy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The wallet prompt was dismissed or timed out, or the caller cancelled
    UserCancelled,

    /// A backend or relay refused the submission
    BackendRejection { detail: String },

    /// The allowance was changed out-of-band between planning and submission
    ApprovalEditedExternally,

    /// A permit or order deadline passed before it could be used
    DeadlineExpired,

    /// The network refused or failed the broadcast
    SubmissionFailed { network_detail: String },

    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UserCancelled => "user_cancelled",
            FailureKind::BackendRejection { .. } => "backend_rejection",
            FailureKind::ApprovalEditedExternally => "approval_edited_externally",
            FailureKind::DeadlineExpired => "deadline_expired",
            FailureKind::SubmissionFailed { .. } => "submission_failed",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a failed attempt may be retried. Signed artifacts are never resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    /// Do not retry without a new user action
    NotRetryable,

    /// Retry only by planning again from a freshly quoted context
    RequiresReplan,
}

/// Message family a UI would select for this failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    /// Nothing to show, the user backed out
    Silent,
    QuoteExpired,
    ReviewApproval,
    NetworkIssue,
    Rejected,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub kind: FailureKind,
    pub step_kind: StepKind,
    pub is_backend_rejection: bool,
    pub retryable: Retryability,
    /// `[step kind, error code?, error message?, backend detail?]`
    pub fingerprint: Vec<String>,
    /// Display form of the underlying error
    pub message: String,
}

impl ClassifiedFailure {
    pub fn is_retryable(&self) -> bool {
        self.retryable == Retryability::RequiresReplan
    }

    /// SHA-256 over the fingerprint parts, hex encoded
    pub fn fingerprint_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for part in &self.fingerprint {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn message_category(&self) -> MessageCategory {
        match self.kind {
            FailureKind::UserCancelled => MessageCategory::Silent,
            FailureKind::DeadlineExpired => MessageCategory::QuoteExpired,
            FailureKind::ApprovalEditedExternally => MessageCategory::ReviewApproval,
            FailureKind::SubmissionFailed { .. } => MessageCategory::NetworkIssue,
            FailureKind::BackendRejection { .. } => MessageCategory::Rejected,
            FailureKind::Unknown => MessageCategory::Generic,
        }
    }
}

/// Classify the failure of a step of kind `step_kind`
pub fn classify(step_kind: StepKind, error: &StepError) -> ClassifiedFailure {
    let allowance_step = matches!(step_kind, StepKind::Approve | StepKind::Revoke);

    let kind = match error {
        StepError::Cancelled
        | StepError::Capability(CapabilityError::UserRejected)
        | StepError::Capability(CapabilityError::SigningTimeout) => FailureKind::UserCancelled,
        StepError::Capability(CapabilityError::Backend { detail, .. }) => {
            FailureKind::BackendRejection {
                detail: detail.clone(),
            }
        }
        StepError::ApprovalEdited { .. } | StepError::UnreadableAllowance(_) => {
            FailureKind::ApprovalEditedExternally
        }
        StepError::Capability(CapabilityError::AllowanceMismatch { .. }) if allowance_step => {
            FailureKind::ApprovalEditedExternally
        }
        StepError::DeadlineExpired { .. } => FailureKind::DeadlineExpired,
        StepError::Capability(CapabilityError::Network(detail)) => FailureKind::SubmissionFailed {
            network_detail: detail.clone(),
        },
        StepError::Capability(CapabilityError::Reverted(reason)) => {
            FailureKind::SubmissionFailed {
                network_detail: format!("reverted: {reason}"),
            }
        }
        StepError::Reverted { hash, .. } => FailureKind::SubmissionFailed {
            network_detail: format!("{hash} reverted"),
        },
        StepError::InclusionTimeout { secs, .. } => FailureKind::SubmissionFailed {
            network_detail: format!("inclusion not observed within {secs}s"),
        },
        StepError::Capability(CapabilityError::AllowanceMismatch { .. })
        | StepError::Capability(CapabilityError::Other { .. })
        | StepError::NoTerminalResult => FailureKind::Unknown,
    };

    let retryable = match kind {
        FailureKind::UserCancelled => Retryability::NotRetryable,
        _ => Retryability::RequiresReplan,
    };

    let is_backend_rejection = matches!(kind, FailureKind::BackendRejection { .. });

    ClassifiedFailure {
        fingerprint: fingerprint(step_kind, error),
        kind,
        step_kind,
        is_backend_rejection,
        retryable,
        message: error.to_string(),
    }
}

/// Parts stay free of nonces, hashes and timestamps so equal failures group together.
fn fingerprint(step_kind: StepKind, error: &StepError) -> Vec<String> {
    let mut parts = vec![step_kind.to_string()];

    match error {
        StepError::Capability(CapabilityError::Backend { code, detail, .. }) => {
            parts.push(code.clone().unwrap_or_else(|| error.code().to_string()));
            parts.push("backend rejected request".to_string());
            parts.push(detail.clone());
        }
        StepError::Capability(CapabilityError::Other { code, message }) => {
            parts.push(
                code.map(|c| c.to_string())
                    .unwrap_or_else(|| error.code().to_string()),
            );
            parts.push(message.clone());
        }
        StepError::Capability(CapabilityError::Network(detail)) => {
            parts.push(error.code().to_string());
            parts.push(detail.clone());
        }
        _ => parts.push(error.code().to_string()),
    }

    parts
}
