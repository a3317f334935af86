//! ERC-20 `approve(address,uint256)` calldata codec.
//!
//! Allowance transactions arrive from the quoting service fully ABI-encoded; the spender
//! and amount shown to the user and checked after signing are read back from the calldata.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `bytes4(keccak256("approve(address,uint256)"))`
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

const WORD: usize = 32;
const APPROVE_CALLDATA_LEN: usize = 4 + 2 * WORD;

/// Decoded arguments of an `approve` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApproveCall {
    pub spender: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalldataError {
    #[error("calldata too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("unexpected selector 0x{selector}, expected approve(address,uint256)")]
    UnexpectedSelector { selector: String },

    #[error("spender word has non-zero high bytes")]
    DirtyAddress,
}

/// Decode `approve(address,uint256)` calldata.
///
/// Trailing bytes beyond the two argument words are tolerated, matching how the EVM ABI
/// decoder treats them.
pub fn parse_approve_calldata(data: &[u8]) -> Result<ApproveCall, CalldataError> {
    if data.len() < APPROVE_CALLDATA_LEN {
        return Err(CalldataError::TooShort {
            expected: APPROVE_CALLDATA_LEN,
            actual: data.len(),
        });
    }

    if data[..4] != APPROVE_SELECTOR {
        return Err(CalldataError::UnexpectedSelector {
            selector: data[..4].iter().map(|b| format!("{b:02x}")).collect(),
        });
    }

    let spender_word = &data[4..4 + WORD];
    if spender_word[..WORD - 20].iter().any(|b| *b != 0) {
        return Err(CalldataError::DirtyAddress);
    }

    let spender = Address::from_slice(&spender_word[WORD - 20..]);
    let amount = U256::from_be_slice(&data[4 + WORD..4 + 2 * WORD]);

    Ok(ApproveCall { spender, amount })
}

/// Encode `approve(spender, amount)` calldata
pub fn encode_approve_calldata(call: &ApproveCall) -> Bytes {
    let mut data = Vec::with_capacity(APPROVE_CALLDATA_LEN);
    data.extend_from_slice(&APPROVE_SELECTOR);
    data.extend_from_slice(&[0u8; WORD - 20]);
    data.extend_from_slice(call.spender.as_slice());
    data.extend_from_slice(&call.amount.to_be_bytes::<WORD>());
    Bytes::from(data)
}
