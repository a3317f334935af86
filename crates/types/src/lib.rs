pub mod calldata;
pub mod context;
pub mod error;
pub mod step;
pub mod token;
pub mod trade;
pub mod transaction;
pub mod typed_data;

pub use calldata::*;
pub use context::*;
pub use error::*;
pub use step::*;
pub use token::*;
pub use trade::*;
pub use transaction::*;
pub use typed_data::*;

// Re-exported so downstream crates agree on one primitives version
pub use alloy_primitives::{Address, Bytes, B256, U256};
