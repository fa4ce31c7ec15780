use crate::domain::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical token pair: `token0 < token1` under the total order on
/// [`TokenId`], so one pool exists per pair regardless of call order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    /// Lower-ordered token of the pair
    pub token0: TokenId,
    /// Higher-ordered token of the pair
    pub token1: TokenId,
}

impl PoolKey {
    /// Canonicalizes an unordered pair.
    ///
    /// Fails with `InvalidAmount` if both sides name the same token.
    pub fn new(a: TokenId, b: TokenId) -> TokenizerResult<Self> {
        if a == b {
            return Err(TokenizerError::InvalidAmount(
                "pool tokens must differ".to_string(),
            ));
        }
        if a < b {
            Ok(Self { token0: a, token1: b })
        } else {
            Ok(Self { token0: b, token1: a })
        }
    }

    /// LP share token id for this pair
    pub fn lp_token(&self) -> TokenId {
        TokenId::new(format!("LP:{}/{}", self.token0, self.token1))
    }

    /// Ledger account holding this pool's reserves
    pub fn pool_account(&self) -> AccountId {
        AccountId::new(format!("pool:{}/{}", self.token0, self.token1))
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.token0, self.token1)
    }
}

/// Quoted outcome of a swap against current reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Output units owed to the recipient
    pub amount_out: Amount,
    /// Input-side reserve after the swap (fee included)
    pub new_reserve_in: Amount,
    /// Output-side reserve after the swap
    pub new_reserve_out: Amount,
}

/// Quoted outcome of a liquidity deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityQuote {
    /// token0 units the pool will pull
    pub use0: Amount,
    /// token1 units the pool will pull
    pub use1: Amount,
    /// LP shares to mint
    pub lp_minted: Amount,
}

/// Quoted outcome of a liquidity withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidityQuote {
    /// token0 units paid out
    pub out0: Amount,
    /// token1 units paid out
    pub out1: Amount,
}

/// Constant-product pool over a canonical token pair.
///
/// Holds only aggregate counters; the reserves themselves sit in the shared
/// ledger under [`PoolKey::pool_account`] and LP shares under
/// [`PoolKey::lp_token`]. Swap fees stay in the input-side reserve, so they
/// accrue to LP share value rather than a separate fee pot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    /// Canonical pair
    pub key: PoolKey,
    /// token0 reserve
    pub reserve0: Amount,
    /// token1 reserve
    pub reserve1: Amount,
    /// Swap fee, immutable after creation
    pub fee_bps: FeeBps,
    /// False once administratively deactivated
    pub is_active: bool,
}

impl Pool {
    /// Creates an empty (Uninitialized reserves, Active) pool
    pub fn new(key: PoolKey, fee_bps: FeeBps) -> Self {
        Self {
            key,
            reserve0: 0,
            reserve1: 0,
            fee_bps,
            is_active: true,
        }
    }

    /// Reserves as seen from an input token: (reserve_in, reserve_out)
    fn oriented_reserves(&self, input_is_token0: bool) -> (Amount, Amount) {
        if input_is_token0 {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    /// Constant-product swap quote.
    ///
    /// `new_reserve_out = ceil(reserve_in * reserve_out / (reserve_in +
    /// amount_in_after_fee))`; the ceiling keeps `reserve0 * reserve1`
    /// non-decreasing under integer division, and strictly increasing
    /// whenever the fee is non-zero.
    pub fn quote_swap(&self, input_is_token0: bool, amount_in: Amount) -> TokenizerResult<SwapQuote> {
        if amount_in == 0 {
            return Err(TokenizerError::InvalidAmount(
                "swap input must be greater than zero".to_string(),
            ));
        }
        let (reserve_in, reserve_out) = self.oriented_reserves(input_is_token0);
        if reserve_in == 0 || reserve_out == 0 {
            return Err(TokenizerError::InsufficientLiquidity(amount_in));
        }

        let in_after_fee = mul_div_floor(
            amount_in,
            FeeBps::DENOMINATOR - self.fee_bps.0 as u128,
            FeeBps::DENOMINATOR,
        )?;
        if in_after_fee == 0 {
            return Err(TokenizerError::InsufficientLiquidity(amount_in));
        }

        let denominator = reserve_in
            .checked_add(in_after_fee)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        let new_reserve_out = mul_div_ceil(reserve_in, reserve_out, denominator)?;
        let amount_out = reserve_out - new_reserve_out;
        if amount_out == 0 {
            return Err(TokenizerError::InsufficientLiquidity(amount_in));
        }

        let new_reserve_in = reserve_in
            .checked_add(amount_in)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        Ok(SwapQuote {
            amount_out,
            new_reserve_in,
            new_reserve_out,
        })
    }

    /// Commits a previously validated swap quote
    pub fn apply_swap(&mut self, input_is_token0: bool, quote: &SwapQuote) {
        if input_is_token0 {
            self.reserve0 = quote.new_reserve_in;
            self.reserve1 = quote.new_reserve_out;
        } else {
            self.reserve1 = quote.new_reserve_in;
            self.reserve0 = quote.new_reserve_out;
        }
    }

    /// Liquidity deposit quote.
    ///
    /// First deposit seeds both reserves in full and mints
    /// `isqrt(amount0 * amount1)` shares (geometric-mean bootstrap, so the
    /// initial price cannot manipulate the share value). Later deposits are
    /// anchored on the token0 side: the pool computes the exact token1
    /// counter-amount (rounded up in the pool's favor), rejects offers below
    /// it with `RatioMismatch`, and never pulls more than it.
    pub fn quote_add_liquidity(
        &self,
        total_lp: Amount,
        amount0: Amount,
        amount1: Amount,
    ) -> TokenizerResult<AddLiquidityQuote> {
        if amount0 == 0 || amount1 == 0 {
            return Err(TokenizerError::InvalidAmount(
                "liquidity amounts must be greater than zero".to_string(),
            ));
        }

        if total_lp == 0 {
            let product = amount0
                .checked_mul(amount1)
                .ok_or(TokenizerError::ArithmeticOverflow)?;
            let lp_minted = integer_sqrt(product);
            if lp_minted == 0 {
                return Err(TokenizerError::InsufficientLiquidity(amount0));
            }
            return Ok(AddLiquidityQuote {
                use0: amount0,
                use1: amount1,
                lp_minted,
            });
        }

        if self.reserve0 == 0 || self.reserve1 == 0 {
            return Err(TokenizerError::InsufficientLiquidity(amount0));
        }
        let required1 = mul_div_ceil(amount0, self.reserve1, self.reserve0)?;
        if amount1 < required1 {
            return Err(TokenizerError::RatioMismatch {
                required: required1,
                provided: amount1,
            });
        }
        let lp_minted = mul_div_floor(total_lp, amount0, self.reserve0)?;
        if lp_minted == 0 {
            return Err(TokenizerError::InsufficientLiquidity(amount0));
        }
        Ok(AddLiquidityQuote {
            use0: amount0,
            use1: required1,
            lp_minted,
        })
    }

    /// Commits a previously validated deposit quote
    pub fn apply_add_liquidity(&mut self, quote: &AddLiquidityQuote) -> TokenizerResult<()> {
        self.reserve0 = self
            .reserve0
            .checked_add(quote.use0)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        self.reserve1 = self
            .reserve1
            .checked_add(quote.use1)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Proportional withdrawal quote, floored per side
    pub fn quote_remove_liquidity(
        &self,
        total_lp: Amount,
        lp_amount: Amount,
    ) -> TokenizerResult<RemoveLiquidityQuote> {
        if lp_amount == 0 {
            return Err(TokenizerError::InvalidAmount(
                "LP amount must be greater than zero".to_string(),
            ));
        }
        if total_lp == 0 || lp_amount > total_lp {
            return Err(TokenizerError::InsufficientLP {
                available: total_lp,
                required: lp_amount,
            });
        }
        let out0 = mul_div_floor(self.reserve0, lp_amount, total_lp)?;
        let out1 = mul_div_floor(self.reserve1, lp_amount, total_lp)?;
        if out0 == 0 && out1 == 0 {
            return Err(TokenizerError::InsufficientLiquidity(lp_amount));
        }
        Ok(RemoveLiquidityQuote { out0, out1 })
    }

    /// Commits a previously validated withdrawal quote
    pub fn apply_remove_liquidity(&mut self, quote: &RemoveLiquidityQuote) {
        self.reserve0 -= quote.out0;
        self.reserve1 -= quote.out1;
    }

    /// Spot price token1/token0 from reserves, read-surface only
    pub fn spot_price(&self) -> Price {
        if self.reserve0 == 0 {
            return Price::zero();
        }
        let r0 = amount_to_decimal(self.reserve0);
        let r1 = amount_to_decimal(self.reserve1);
        if r0.is_zero() {
            return Price::zero();
        }
        Price(r1 / r0)
    }

    /// Current constant-product value, if representable
    pub fn k(&self) -> Option<u128> {
        self.reserve0.checked_mul(self.reserve1)
    }
}

/// Floor of the square root, Newton's method on `u128`
pub fn integer_sqrt(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = (x >> 1) + 1;
    while y < x {
        x = y;
        y = (x + value / x) >> 1;
    }
    x
}
