//! # Yield Tokenizer
//!
//! A deterministic yield tokenization protocol implementing:
//! - SY wrapping of yield-bearing assets with 1:1 principal accounting
//! - PT/YT split-merge with strict supply conservation
//! - Index-based yield accrual with dust-free remainder carry
//! - Constant-product AMM pools for trading PT, YT, and SY against each other
//!
//! ## Architecture
//!
//! The crate follows domain-driven design principles with clear separation
//! of concerns:
//!
//! - **Domain**: Core business logic (ledger, markets, accrual, pools)
//! - **Infrastructure**: External concerns (configuration, state reporting)
//!
//! ## Atomicity
//!
//! Every operation on [`Protocol`](domain::Protocol) validates completely
//! before mutating: a returned error means no balance, reserve, index, or
//! event changed. The shared supply invariant (the sum of holder balances
//! equals recorded total supply for every token) holds after every
//! operation and can be audited at any point.
//!
//! ## Thread Safety
//!
//! [`ThreadSafeProtocol`](domain::ThreadSafeProtocol) wraps the engine in
//! `std::sync::RwLock`: multiple concurrent readers, single writer
//! exclusion, consistent snapshots for the read surface.

pub mod domain;
pub mod infrastructure;

/// Utilities for logging
pub mod utils;

// Re-export commonly used types for convenience
pub use domain::{
    amm_pool::{Pool, PoolKey, SwapQuote},
    events::ProtocolEvent,
    ledger::FungibleLedger,
    market::{Market, MarketRegistry, TokenRole},
    protocol::{
        MarketInfo, PoolInfo, Protocol, ProtocolConfig, ThreadSafeProtocol,
        UndistributedYieldPolicy,
    },
    types::*,
    yield_accrual::{AccrualStage, HolderYield, MarketAccrual},
};

pub use infrastructure::{config::load_config, config::parse_config, reporting::StateReport};

/// Main result type for the tokenizer
pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
