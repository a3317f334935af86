use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TokenAmount;

/// Settlement strategy selected by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    /// Same-chain swap through the universal router
    DirectSwap,

    /// Signed off-chain order filled by a third party
    OffChainOrder,

    /// Cross-chain bridge, submitted like a direct swap
    Bridge,

    /// Native currency to wrapped token
    Wrap,
}

impl Routing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Routing::DirectSwap => "direct_swap",
            Routing::OffChainOrder => "off_chain_order",
            Routing::Bridge => "bridge",
            Routing::Wrap => "wrap",
        }
    }
}

impl fmt::Display for Routing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote of an off-chain order as returned by the order API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub quote_id: String,

    /// Order owner
    pub swapper: Address,

    /// Permit2 nonce consumed by the order
    pub nonce: U256,

    /// Order deadline (Unix seconds)
    pub deadline: u64,

    /// ABI-encoded order posted to the relay alongside the signature
    pub encoded_order: Bytes,
}

/// Trade the user confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub input: TokenAmount,
    pub output: TokenAmount,

    /// Present for off-chain-order routing
    #[serde(default)]
    pub order_quote: Option<OrderQuote>,
}

impl Trade {
    pub fn new(input: TokenAmount, output: TokenAmount) -> Self {
        Self {
            input,
            output,
            order_quote: None,
        }
    }

    pub fn with_order_quote(mut self, quote: OrderQuote) -> Self {
        self.order_quote = Some(quote);
        self
    }

    /// Exact raw input amount used for approvals and wraps
    pub fn required_input_amount(&self) -> U256 {
        self.input.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_serde_names() {
        let json = serde_json::to_string(&Routing::OffChainOrder).unwrap();
        assert_eq!(json, "\"off_chain_order\"");
        assert_eq!(Routing::Bridge.to_string(), "bridge");
    }
}
