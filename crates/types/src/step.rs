use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{
    CapabilityError, OrderQuote, Signature, Token, TokenAmount, TransactionRequest, TypedData,
};

/// One unit of work in a swap flow.
///
/// Steps are produced by the planner and consumed in order by the execution
/// coordinator; they are never mutated after planning.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Reset an existing allowance to zero
    Revoke(AllowanceStep),

    /// Set an allowance to exactly `amount`
    Approve(AllowanceStep),

    /// Off-chain transfer authorisation, signed but never broadcast
    Permit(PermitStep),

    /// Native currency to wrapped token
    Wrap(WrapStep),

    /// Terminal on-chain trade with a transaction prepared at plan time
    Swap(SwapStep),

    /// Terminal on-chain trade whose transaction is built at submission time
    SwapAsync(SwapAsyncStep),

    /// Terminal signature over an off-chain order, posted to a relay
    OffChainOrderSignature(OrderSignatureStep),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceStep {
    pub transaction: TransactionRequest,
    pub token: Token,
    pub spender: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitStep {
    pub typed_data: TypedData,
    pub token: Token,
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapStep {
    pub transaction: TransactionRequest,
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStep {
    pub transaction: TransactionRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapAsyncStep {
    pub builder: SwapTxBuilder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSignatureStep {
    pub typed_data: TypedData,
    pub quote: OrderQuote,
    pub deadline: u64,
}

/// Discriminant of [`Step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Revoke,
    Approve,
    Permit,
    Wrap,
    Swap,
    SwapAsync,
    OffChainOrderSignature,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Revoke => "revoke",
            StepKind::Approve => "approve",
            StepKind::Permit => "permit",
            StepKind::Wrap => "wrap",
            StepKind::Swap => "swap",
            StepKind::SwapAsync => "swap_async",
            StepKind::OffChainOrderSignature => "off_chain_order_signature",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepKind::Swap | StepKind::SwapAsync | StepKind::OffChainOrderSignature
        )
    }

    /// Whether the step results in a broadcast transaction (and consumes a nonce)
    pub fn is_transaction(&self) -> bool {
        matches!(
            self,
            StepKind::Revoke
                | StepKind::Approve
                | StepKind::Wrap
                | StepKind::Swap
                | StepKind::SwapAsync
        )
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Revoke(_) => StepKind::Revoke,
            Step::Approve(_) => StepKind::Approve,
            Step::Permit(_) => StepKind::Permit,
            Step::Wrap(_) => StepKind::Wrap,
            Step::Swap(_) => StepKind::Swap,
            Step::SwapAsync(_) => StepKind::SwapAsync,
            Step::OffChainOrderSignature(_) => StepKind::OffChainOrderSignature,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    pub fn is_transaction(&self) -> bool {
        self.kind().is_transaction()
    }

    pub fn is_signature_only(&self) -> bool {
        !self.is_transaction()
    }

    /// Deadline of a time-bounded authorisation, if the step carries one
    pub fn deadline(&self) -> Option<u64> {
        match self {
            Step::Permit(step) => Some(step.deadline),
            Step::OffChainOrderSignature(step) => Some(step.deadline),
            _ => None,
        }
    }

    /// Whether the step's authorisation is unusable at `now`. A deadline is still valid
    /// at its exact second; `buffer_secs` pulls expiry earlier to leave room for
    /// submission.
    pub fn is_expired_at(&self, now: u64, buffer_secs: u64) -> bool {
        self.deadline()
            .is_some_and(|deadline| now.saturating_add(buffer_secs) > deadline)
    }

    /// Transaction prepared at plan time. `None` for signature steps and `SwapAsync`.
    pub fn transaction(&self) -> Option<&TransactionRequest> {
        match self {
            Step::Revoke(step) | Step::Approve(step) => Some(&step.transaction),
            Step::Wrap(step) => Some(&step.transaction),
            Step::Swap(step) => Some(&step.transaction),
            Step::Permit(_) | Step::SwapAsync(_) | Step::OffChainOrderSignature(_) => None,
        }
    }
}

/// Input handed to a [`TransactionBuilder`] when a deferred swap is about to be signed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInput {
    /// Signature collected by the preceding permit step, if any
    pub permit_signature: Option<Signature>,
}

/// Builds the swap transaction from the freshest quote at submission time
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    async fn build(&self, input: BuildInput) -> Result<TransactionRequest, CapabilityError>;
}

/// Shared handle to a [`TransactionBuilder`].
///
/// Two handles are equal only when they refer to the same builder instance.
#[derive(Clone)]
pub struct SwapTxBuilder(Arc<dyn TransactionBuilder>);

impl SwapTxBuilder {
    pub fn new(builder: impl TransactionBuilder + 'static) -> Self {
        Self(Arc::new(builder))
    }

    pub fn from_arc(builder: Arc<dyn TransactionBuilder>) -> Self {
        Self(builder)
    }

    pub async fn build(&self, input: BuildInput) -> Result<TransactionRequest, CapabilityError> {
        self.0.build(input).await
    }
}

impl PartialEq for SwapTxBuilder {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SwapTxBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SwapTxBuilder(..)")
    }
}
