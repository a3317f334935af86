use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::Token;

/// EIP-712 typed data payload, kept as JSON.
///
/// The pipeline never hashes or signs typed data itself; it is handed verbatim to the
/// wallet's signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub domain: serde_json::Value,
    pub types: serde_json::Value,
    pub primary_type: String,
    pub message: serde_json::Value,
}

/// Permit (Permit2 `PermitSingle` or an off-chain order witness) authorising a bounded,
/// time-limited transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitPayload {
    pub typed_data: TypedData,

    /// Token being authorised
    pub token: Token,

    /// Contract allowed to pull the funds
    pub spender: Address,

    pub amount: U256,

    /// Signature deadline (Unix seconds); the permit is worthless after it
    pub deadline: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_data_camel_case() {
        let typed_data: TypedData = serde_json::from_value(json!({
            "domain": { "name": "Permit2", "chainId": 1 },
            "types": { "PermitSingle": [] },
            "primaryType": "PermitSingle",
            "message": { "sigDeadline": "1700000000" }
        }))
        .unwrap();

        assert_eq!(typed_data.primary_type, "PermitSingle");
        assert_eq!(typed_data.domain["name"], "Permit2");
    }
}
