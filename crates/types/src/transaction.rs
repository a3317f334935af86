use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Prepared (unsigned) transaction as returned by the quoting service.
///
/// Gas fields are produced by an external estimator and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub chain_id: u64,
    pub from: Address,
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TransactionRequest {
    pub fn new(chain_id: u64, from: Address, to: Address, data: Bytes) -> Self {
        Self {
            chain_id,
            from,
            to,
            data,
            value: U256::ZERO,
            gas_limit: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Transaction signed by the wallet.
///
/// `request` is the request as the wallet actually signed it, which may differ from the
/// planned one if the user edited it (for example a custom approval amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub request: TransactionRequest,
    pub nonce: u64,
    pub hash: B256,
    /// RLP-encoded signed envelope
    pub raw: Bytes,
}

/// Raw 65-byte ECDSA signature (r, s, v)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(pub Bytes);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

/// Mempool acceptance of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub hash: B256,
}

/// Inclusion of a transaction in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionReceipt {
    pub hash: B256,
    pub block_number: u64,
    pub success: bool,
}
