use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// ERC-20 token or the chain's native currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// EVM chain id
    pub chain_id: u64,

    /// Contract address (zero address for the native currency)
    pub address: Address,

    /// Display symbol, informational only
    #[serde(default)]
    pub symbol: Option<String>,

    pub decimals: u8,
}

impl Token {
    pub fn new(chain_id: u64, address: Address, decimals: u8) -> Self {
        Self {
            chain_id,
            address,
            symbol: None,
            decimals,
        }
    }

    /// Native currency of `chain_id` (ETH on mainnet)
    pub fn native(chain_id: u64) -> Self {
        Self {
            chain_id,
            address: Address::ZERO,
            symbol: None,
            decimals: 18,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn is_native(&self) -> bool {
        self.address == Address::ZERO
    }
}

/// Exact raw amount of a token, in its smallest unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: Token,
    pub amount: U256,
}

impl TokenAmount {
    pub fn new(token: Token, amount: U256) -> Self {
        Self { token, amount }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}
