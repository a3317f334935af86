use swapflow_types::{CalldataError, Routing, StepKind};
use thiserror::Error;

/// Malformed planning input.
///
/// A well-formed context never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid {step} calldata: {source}")]
    InvalidAllowanceCalldata {
        step: StepKind,
        #[source]
        source: CalldataError,
    },

    #[error("{routing} context has neither a swap transaction nor a deferred builder")]
    MissingSwapTransaction { routing: Routing },

    #[error("{routing} context is unsigned with a permit but has no swap builder")]
    MissingSwapBuilder { routing: Routing },

    #[error("off-chain order context is missing its permit payload")]
    MissingPermit,

    #[error("off-chain order context is missing the order quote")]
    MissingOrderQuote,

    #[error("wrap context is missing its wrap transaction")]
    MissingWrapTransaction,

    #[error("step ordering violated: {0}")]
    Ordering(String),
}
