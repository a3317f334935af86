//! Step planning for swap flows.
//!
//! Maps a [`SwapExecutionContext`](swapflow_types::SwapExecutionContext) onto the
//! ordered steps that settle it:
//!
//! | Routing | Steps |
//! |---|---|
//! | direct swap / bridge | `[Revoke] [Approve] [Permit, SwapAsync] \| Swap` |
//! | off-chain order | `[Revoke] [Approve] [Wrap] OffChainOrderSignature` |
//! | wrap | `[Revoke] [Approve] Wrap` |
//!
//! Allowance steps always come first. For off-chain orders this puts the wrap after
//! them, directly ahead of the order signature that spends the wrapped balance.

pub mod error;
pub mod ordered;
pub mod planner;

pub use error::PlanError;
pub use ordered::OrderedSteps;
pub use planner::plan;
