//! Domain layer containing the tokenization ledger and invariant engines
//!
//! This module contains the core domain entities for the yield tokenization
//! protocol: the fungible ledger, market registry, yield accrual engine,
//! constant-product pools, and the protocol facade that ties them together.

/// Constant-product pool math and state
pub mod amm_pool;
/// Post-commit protocol event log
pub mod events;
/// Fungible balance ledger shared by every token kind
pub mod ledger;
/// Market registry and lifecycle
pub mod market;
/// Protocol facade orchestrating all engines
pub mod protocol;
/// Core types and primitives
pub mod types;
/// Index-based yield accrual engine
pub mod yield_accrual;

pub use events::*;
pub use types::*;

pub use amm_pool::{Pool, PoolKey, SwapQuote};
pub use ledger::FungibleLedger;
pub use market::{Market, MarketRegistry, TokenRole};
pub use protocol::{
    MarketInfo, PoolInfo, Protocol, ProtocolConfig, ThreadSafeProtocol, UndistributedYieldPolicy,
};
pub use yield_accrual::{AccrualStage, HolderYield, MarketAccrual};
