use crate::domain::amm_pool::PoolKey;
use crate::domain::types::*;
use serde::{Deserialize, Serialize};

/// State-change record appended to the protocol log after a successful
/// operation. Failed operations never log; a revert has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    /// New market registered
    MarketCreated {
        /// Market id
        market: MarketId,
        /// Underlying asset
        underlying: TokenId,
        /// Maturity timestamp
        maturity: Timestamp,
    },
    /// Underlying wrapped into SY
    Wrapped {
        /// Market id
        market: MarketId,
        /// Depositing account
        account: AccountId,
        /// Underlying pulled / SY minted
        amount: Amount,
    },
    /// SY unwrapped back to underlying
    Unwrapped {
        /// Market id
        market: MarketId,
        /// Withdrawing account
        account: AccountId,
        /// SY burned / underlying released
        amount: Amount,
    },
    /// SY split into PT + YT
    Split {
        /// Market id
        market: MarketId,
        /// Splitting account
        account: AccountId,
        /// SY burned; PT and YT each minted 1:1
        amount: Amount,
    },
    /// PT + YT merged back into SY
    Merged {
        /// Market id
        market: MarketId,
        /// Merging account
        account: AccountId,
        /// PT and YT each burned; SY minted
        amount: Amount,
    },
    /// PT redeemed for underlying at/after maturity
    Redeemed {
        /// Market id
        market: MarketId,
        /// Redeeming account
        account: AccountId,
        /// PT burned / underlying released
        amount: Amount,
    },
    /// Yield folded into the market index
    YieldDistributed {
        /// Market id
        market: MarketId,
        /// Underlying distributed
        amount: Amount,
        /// Index after the distribution
        index: u128,
    },
    /// Settled yield paid out
    YieldClaimed {
        /// Market id
        market: MarketId,
        /// Claiming account
        account: AccountId,
        /// Underlying paid
        amount: Amount,
    },
    /// New pool registered
    PoolCreated {
        /// Canonical pair
        pool: PoolKey,
        /// Immutable fee
        fee_bps: FeeBps,
    },
    /// Liquidity deposited
    LiquidityAdded {
        /// Canonical pair
        pool: PoolKey,
        /// Depositing account
        account: AccountId,
        /// token0 pulled
        amount0: Amount,
        /// token1 pulled
        amount1: Amount,
        /// LP shares minted
        lp_minted: Amount,
    },
    /// Liquidity withdrawn
    LiquidityRemoved {
        /// Canonical pair
        pool: PoolKey,
        /// Withdrawing account
        account: AccountId,
        /// token0 paid out
        amount0: Amount,
        /// token1 paid out
        amount1: Amount,
        /// LP shares burned
        lp_burned: Amount,
    },
    /// Swap executed
    SwapExecuted {
        /// Canonical pair
        pool: PoolKey,
        /// Trading account
        account: AccountId,
        /// Input token
        token_in: TokenId,
        /// Input units
        amount_in: Amount,
        /// Output units
        amount_out: Amount,
    },
}

impl ProtocolEvent {
    /// Market this event concerns, when it concerns one
    pub fn market(&self) -> Option<MarketId> {
        match self {
            ProtocolEvent::MarketCreated { market, .. }
            | ProtocolEvent::Wrapped { market, .. }
            | ProtocolEvent::Unwrapped { market, .. }
            | ProtocolEvent::Split { market, .. }
            | ProtocolEvent::Merged { market, .. }
            | ProtocolEvent::Redeemed { market, .. }
            | ProtocolEvent::YieldDistributed { market, .. }
            | ProtocolEvent::YieldClaimed { market, .. } => Some(*market),
            _ => None,
        }
    }
}
