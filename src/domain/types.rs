use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token identifier (underlying, SY, PT, YT, LP share).
///
/// The derived `Ord` is the total order used to canonicalize pool pairs:
/// one pool per pair regardless of argument order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    /// Creates a token id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        TokenId(id.into())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier for balance ownership
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Creates an account id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Market identifier assigned sequentially by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketId(pub u64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token amount in base units.
///
/// All ledger and pool arithmetic is checked; an operation that would
/// overflow fails with [`TokenizerError::ArithmeticOverflow`] instead of
/// wrapping.
pub type Amount = u128;

/// Scale factor for the per-token yield accrual index
pub const INDEX_SCALE: u128 = 1_000_000_000_000;

/// Pool fee in basis points (30 = 0.3%), immutable after pool creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeBps(pub u32);

impl FeeBps {
    /// Basis point denominator
    pub const DENOMINATOR: u128 = 10_000;

    /// Convert to a decimal rate (e.g. 30 bps = 0.003)
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(10_000u32)
    }

    /// True for a zero-fee pool
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FeeBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// Price with decimal precision, read-surface only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(pub Decimal);

impl Price {
    /// Creates a zero price
    pub fn zero() -> Self {
        Price(Decimal::ZERO)
    }

    /// Returns true if the price is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display metadata for a minted token identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    /// Short symbol, e.g. "PT-stETH-DEC26"
    pub symbol: String,
    /// Human readable name
    pub name: String,
}

impl TokenMeta {
    /// Creates token metadata
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Timestamp for market lifecycle and events
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Core failure taxonomy.
///
/// Every failure is local and synchronous; the operation that returned it
/// left state fully unchanged. `NothingToClaim` is the only outcome a caller
/// may treat as a no-op.
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    /// Amount was zero or otherwise unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Holder balance below the requested amount
    #[error("Insufficient balance of {token}: have {available}, need {required}")]
    InsufficientBalance {
        /// Token whose balance fell short
        token: TokenId,
        /// Balance currently held
        available: Amount,
        /// Balance the operation needed
        required: Amount,
    },

    /// Spender allowance below the requested amount
    #[error("Insufficient allowance of {token}: granted {granted}, need {required}")]
    InsufficientAllowance {
        /// Token the allowance covers
        token: TokenId,
        /// Allowance currently granted
        granted: Amount,
        /// Allowance the operation needed
        required: Amount,
    },

    /// Fixed-width arithmetic would overflow
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// No market registered under this id
    #[error("Market not found: {0}")]
    MarketNotFound(MarketId),

    /// Market is administratively paused
    #[error("Market inactive: {0}")]
    MarketInactive(MarketId),

    /// Operation requires pre-maturity but the market has matured
    #[error("Market matured: {0}")]
    MarketMatured(MarketId),

    /// Operation requires maturity but the market has not matured yet
    #[error("Market not yet matured: {0}")]
    MarketNotMatured(MarketId),

    /// A market already exists for this (asset, maturity) pair
    #[error("Market already exists for {asset} maturing at {maturity}")]
    MarketAlreadyExists {
        /// Underlying asset
        asset: TokenId,
        /// Requested maturity
        maturity: Timestamp,
    },

    /// No pool registered for this token pair
    #[error("Pool not found for pair ({0}, {1})")]
    PoolNotFound(TokenId, TokenId),

    /// A pool already exists for this canonical pair
    #[error("Pool already exists for pair ({0}, {1})")]
    PoolAlreadyExists(TokenId, TokenId),

    /// Pool is not active
    #[error("Pool inactive for pair ({0}, {1})")]
    PoolInactive(TokenId, TokenId),

    /// Reserves cannot support the trade
    #[error("Insufficient liquidity for input {0}")]
    InsufficientLiquidity(Amount),

    /// Provided counter-amount is below the pool ratio requirement
    #[error("Ratio mismatch: required {required}, provided {provided}")]
    RatioMismatch {
        /// Counter-amount the pool ratio requires
        required: Amount,
        /// Counter-amount the caller offered
        provided: Amount,
    },

    /// Realized amount fell below the caller's minimum
    #[error("Slippage exceeded: realized {realized}, minimum {minimum}")]
    SlippageExceeded {
        /// Amount the operation realized
        realized: Amount,
        /// Caller-supplied lower bound
        minimum: Amount,
    },

    /// Claimable yield is zero (non-fatal)
    #[error("Nothing to claim")]
    NothingToClaim,

    /// LP balance below the requested burn amount
    #[error("Insufficient LP: have {available}, need {required}")]
    InsufficientLP {
        /// LP shares currently held
        available: Amount,
        /// LP shares the operation needed
        required: Amount,
    },

    /// Yield distribution against zero YT supply under the Reject policy
    #[error("Zero YT supply in market {0}")]
    ZeroSupply(MarketId),

    /// Configuration parse/validation failure
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for tokenizer operations
pub type TokenizerResult<T> = Result<T, TokenizerError>;

/// Checked `a * b / d`, rounding down
pub fn mul_div_floor(a: Amount, b: Amount, d: Amount) -> TokenizerResult<Amount> {
    if d == 0 {
        return Err(TokenizerError::ArithmeticOverflow);
    }
    a.checked_mul(b)
        .map(|n| n / d)
        .ok_or(TokenizerError::ArithmeticOverflow)
}

/// Checked `a * b / d`, rounding up
pub fn mul_div_ceil(a: Amount, b: Amount, d: Amount) -> TokenizerResult<Amount> {
    if d == 0 {
        return Err(TokenizerError::ArithmeticOverflow);
    }
    let n = a.checked_mul(b).ok_or(TokenizerError::ArithmeticOverflow)?;
    let q = n / d;
    if n % d == 0 {
        Ok(q)
    } else {
        q.checked_add(1).ok_or(TokenizerError::ArithmeticOverflow)
    }
}

/// Convert a base-unit amount to `Decimal` for the read surface.
///
/// Amounts beyond `Decimal` range fall back to zero, matching how the
/// display layer treats unrepresentable prices.
pub fn amount_to_decimal(amount: Amount) -> Decimal {
    use rust_decimal::prelude::FromPrimitive;
    Decimal::from_u128(amount).unwrap_or(Decimal::ZERO)
}
