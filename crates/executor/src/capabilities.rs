use async_trait::async_trait;
use std::fmt;
use swapflow_types::{
    Address, CapabilityError, InclusionReceipt, OrderQuote, Signature, SignedTransaction,
    SubmissionReceipt, TransactionRequest, TypedData,
};

/// Wallet signing capability.
///
/// Signing may suspend indefinitely on user interaction; the coordinator imposes no
/// timeout of its own.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Account whose nonces and signatures this signer produces
    fn account(&self) -> Address;

    /// Next nonce for `account`. Implementations must never hand out the same nonce
    /// twice, even to concurrent callers.
    async fn allocate_nonce(&self, account: Address) -> Result<u64, CapabilityError>;

    /// Return a nonce that was allocated but never broadcast
    async fn release_nonce(&self, _account: Address, _nonce: u64) {}

    async fn sign_transaction(
        &self,
        request: &TransactionRequest,
        nonce: u64,
    ) -> Result<SignedTransaction, CapabilityError>;

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, CapabilityError>;
}

/// Broadcast and relay capability.
///
/// `Backend` and `Network` errors from either broadcast method mean the transaction never
/// reached a mempool, and the coordinator hands its nonce back. A failure after the
/// broadcast was accepted must use another variant, since that nonce may still be mined.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Broadcast and return once the network entry point accepted the transaction
    async fn submit(&self, signed: &SignedTransaction)
        -> Result<SubmissionReceipt, CapabilityError>;

    /// Broadcast and wait for block inclusion
    async fn submit_and_await_inclusion(
        &self,
        signed: &SignedTransaction,
    ) -> Result<InclusionReceipt, CapabilityError>;

    /// Post a signed off-chain order to the relay
    async fn post_order(&self, order: &SignedOrder) -> Result<OrderId, CapabilityError>;
}

/// Off-chain order ready for the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    pub quote: OrderQuote,
    pub signature: Signature,
}

/// Identifier the relay assigned to a posted order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
