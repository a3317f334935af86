use swapflow_types::{Address, CalldataError, CapabilityError, U256};
use thiserror::Error;

/// Raw failure of a single step, before classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("authorization deadline {deadline} passed (now {now})")]
    DeadlineExpired { deadline: u64, now: u64 },

    /// The wallet signed different allowance parameters than were planned
    #[error("approval edited before signing: planned {planned_amount} for {planned_spender}, signed {signed_amount} for {signed_spender}")]
    ApprovalEdited {
        planned_spender: Address,
        planned_amount: U256,
        signed_spender: Address,
        signed_amount: U256,
    },

    #[error("signed allowance calldata is unreadable: {0}")]
    UnreadableAllowance(CalldataError),

    #[error("execution cancelled")]
    Cancelled,

    #[error("transaction {hash} reverted in block {block_number}")]
    Reverted { hash: String, block_number: u64 },

    /// Broadcast was accepted but inclusion was not observed in time. The transaction may
    /// still land, so its nonce stays consumed.
    #[error("transaction {hash} not included within {secs}s")]
    InclusionTimeout { hash: String, secs: u64 },

    #[error("plan ended without a terminal result")]
    NoTerminalResult,
}

impl StepError {
    /// Stable variant name, independent of the values inside
    pub fn code(&self) -> &'static str {
        match self {
            StepError::Capability(err) => match err {
                CapabilityError::UserRejected => "user_rejected",
                CapabilityError::SigningTimeout => "signing_timeout",
                CapabilityError::Backend { .. } => "backend",
                CapabilityError::Network(_) => "network",
                CapabilityError::AllowanceMismatch { .. } => "allowance_mismatch",
                CapabilityError::Reverted(_) => "reverted",
                CapabilityError::Other { .. } => "other",
            },
            StepError::DeadlineExpired { .. } => "deadline_expired",
            StepError::ApprovalEdited { .. } => "approval_edited",
            StepError::UnreadableAllowance(_) => "unreadable_allowance",
            StepError::Cancelled => "cancelled",
            StepError::Reverted { .. } => "reverted",
            StepError::InclusionTimeout { .. } => "inclusion_timeout",
            StepError::NoTerminalResult => "no_terminal_result",
        }
    }
}
