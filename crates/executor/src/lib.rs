pub mod capabilities;
pub mod classifier;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod nonce;


// Re-export main types
pub use capabilities::{OrderId, SignedOrder, Signer, Submitter};
pub use classifier::{classify, ClassifiedFailure, FailureKind, MessageCategory, Retryability};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{
    AttemptId, CoordinatorConfig, ExecutionCoordinator, ExecutionMode, ExecutionOutcome,
    StepRecord, StepResult, StepState, TerminalResult,
};
pub use error::StepError;
pub use nonce::{NonceRegistry, PendingNonceSource};

// Callers pass the token to `execute`; re-exported so they need not depend on tokio-util
pub use tokio_util::sync::CancellationToken;
