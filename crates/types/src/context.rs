use crate::{PermitPayload, Routing, SwapTxBuilder, Trade, TransactionRequest};

/// Everything the planner needs to turn one confirmed trade into steps.
///
/// Built once per trade attempt by the quoting collaborator and consumed once by the
/// planner. A fresh context must be built for every retry: allowances, nonces and quotes
/// go stale between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapExecutionContext {
    pub routing: Routing,
    pub trade: Trade,

    /// `approve(spender, 0)` for tokens that require resetting before re-approval
    pub revocation_transaction: Option<TransactionRequest>,

    /// `approve(spender, amount)`
    pub approval_transaction: Option<TransactionRequest>,

    /// Native to wrapped currency
    pub wrap_transaction: Option<TransactionRequest>,

    /// Swap or bridge transaction prepared at quote time
    pub swap_transaction: Option<TransactionRequest>,

    /// Builds the swap transaction at submission time when `unsigned` is set
    pub swap_builder: Option<SwapTxBuilder>,

    pub permit: Option<PermitPayload>,

    /// The terminal transaction must not be pre-built; it is built from the freshest
    /// quote right before signing
    pub unsigned: bool,
}

impl SwapExecutionContext {
    pub fn new(routing: Routing, trade: Trade) -> Self {
        Self {
            routing,
            trade,
            revocation_transaction: None,
            approval_transaction: None,
            wrap_transaction: None,
            swap_transaction: None,
            swap_builder: None,
            permit: None,
            unsigned: false,
        }
    }

    pub fn with_revocation(mut self, tx: TransactionRequest) -> Self {
        self.revocation_transaction = Some(tx);
        self
    }

    pub fn with_approval(mut self, tx: TransactionRequest) -> Self {
        self.approval_transaction = Some(tx);
        self
    }

    pub fn with_wrap(mut self, tx: TransactionRequest) -> Self {
        self.wrap_transaction = Some(tx);
        self
    }

    pub fn with_swap(mut self, tx: TransactionRequest) -> Self {
        self.swap_transaction = Some(tx);
        self
    }

    pub fn with_swap_builder(mut self, builder: SwapTxBuilder) -> Self {
        self.swap_builder = Some(builder);
        self
    }

    pub fn with_permit(mut self, permit: PermitPayload) -> Self {
        self.permit = Some(permit);
        self
    }

    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }
}
