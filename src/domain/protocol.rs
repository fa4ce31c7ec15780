use crate::domain::amm_pool::{Pool, PoolKey};
use crate::domain::events::ProtocolEvent;
use crate::domain::ledger::FungibleLedger;
use crate::domain::market::{MarketRegistry, TokenRole};
use crate::domain::types::*;
use crate::domain::yield_accrual::{AccrualStage, MarketAccrual};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// What `distribute_yield` does when the market has no YT supply yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndistributedYieldPolicy {
    /// Fail with `ZeroSupply`; nothing moves
    #[default]
    Reject,
    /// Pull the funds and park them in the market's remainder carry; the
    /// first distribution against live supply releases them
    Carry,
}

/// Protocol-level configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Fee assigned to pools created without an explicit fee
    pub default_fee_bps: FeeBps,
    /// Zero-YT-supply distribution policy
    pub undistributed_yield: UndistributedYieldPolicy,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            default_fee_bps: FeeBps(30),
            undistributed_yield: UndistributedYieldPolicy::default(),
        }
    }
}

/// Read-surface view of a market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Market id
    pub id: MarketId,
    /// Underlying asset
    pub underlying: TokenId,
    /// SY token id
    pub sy: TokenId,
    /// PT token id
    pub pt: TokenId,
    /// YT token id
    pub yt: TokenId,
    /// Maturity timestamp
    pub maturity: Timestamp,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// False while paused
    pub active: bool,
    /// Underlying held as wrapped principal
    pub total_sy_deposited: Amount,
    /// SY total supply
    pub sy_supply: Amount,
    /// PT total supply
    pub pt_supply: Amount,
    /// YT total supply
    pub yt_supply: Amount,
    /// Cumulative yield-per-YT index (scaled by [`INDEX_SCALE`])
    pub yield_index: u128,
    /// Accrual lifecycle stage
    pub accrual_stage: AccrualStage,
}

/// Read-surface view of a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Lower-ordered token
    pub token0: TokenId,
    /// Higher-ordered token
    pub token1: TokenId,
    /// token0 reserve
    pub reserve0: Amount,
    /// token1 reserve
    pub reserve1: Amount,
    /// LP share token id
    pub lp_token: TokenId,
    /// LP shares outstanding
    pub total_lp_supply: Amount,
    /// Immutable swap fee
    pub fee_bps: FeeBps,
    /// False once deactivated
    pub is_active: bool,
    /// Spot price token1/token0
    pub spot_price: Price,
}

/// Outcome of a liquidity deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityOutcome {
    /// token0 units actually pulled
    pub amount0_used: Amount,
    /// token1 units actually pulled
    pub amount1_used: Amount,
    /// LP shares minted to the caller
    pub lp_minted: Amount,
}

/// Outcome of a liquidity withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityOutcome {
    /// token0 units paid out
    pub amount0_out: Amount,
    /// token1 units paid out
    pub amount1_out: Amount,
}

/// The ledger + invariant engine behind the router facade.
///
/// Owns every piece of mutable protocol state: one [`FungibleLedger`] per
/// token kind, the market registry, per-market yield accrual, the pool
/// table, and the post-commit event log. Each public operation validates
/// completely before writing, so a returned error means state is unchanged.
///
/// The host execution model serializes calls; for multi-threaded hosts use
/// [`ThreadSafeProtocol`].
#[derive(Debug, Default)]
pub struct Protocol {
    config: ProtocolConfig,
    ledgers: HashMap<TokenId, FungibleLedger>,
    registry: MarketRegistry,
    accruals: HashMap<MarketId, MarketAccrual>,
    pools: HashMap<PoolKey, Pool>,
    events: Vec<ProtocolEvent>,
}

impl Protocol {
    /// Creates a protocol instance with default configuration
    pub fn new() -> Self {
        Self::with_config(ProtocolConfig::default())
    }

    /// Creates a protocol instance with explicit configuration
    pub fn with_config(config: ProtocolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    // ---------------------------------------------------------------
    // external asset boundary
    // ---------------------------------------------------------------

    /// Records an inbound transfer of an external asset into the core's
    /// mirror ledger. The host transport layer calls this when underlying
    /// actually arrives; it is not reachable from router operations.
    pub fn deposit_external(
        &mut self,
        token: &TokenId,
        account: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        self.ledger_mut(token).mint(account, amount)
    }

    /// Records an outbound transfer of an external asset, burning the
    /// mirrored balance
    pub fn withdraw_external(
        &mut self,
        token: &TokenId,
        account: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        self.ledger_mut(token).burn(account, amount)
    }

    // ---------------------------------------------------------------
    // ledger surface
    // ---------------------------------------------------------------

    /// Balance of `account` in `token`
    pub fn balance_of(&self, token: &TokenId, account: &AccountId) -> Amount {
        self.ledgers
            .get(token)
            .map(|l| l.balance_of(account))
            .unwrap_or(0)
    }

    /// Allowance granted by `owner` to `spender` in `token`
    pub fn allowance(&self, token: &TokenId, owner: &AccountId, spender: &AccountId) -> Amount {
        self.ledgers
            .get(token)
            .map(|l| l.allowance(owner, spender))
            .unwrap_or(0)
    }

    /// Total supply of `token`
    pub fn total_supply(&self, token: &TokenId) -> Amount {
        self.ledgers
            .get(token)
            .map(|l| l.total_supply())
            .unwrap_or(0)
    }

    /// Tokens whose holder balances no longer sum to their recorded supply.
    /// Empty on every reachable state; exposed for scenario audits.
    pub fn audit_supply(&self) -> Vec<TokenId> {
        self.ledgers
            .values()
            .filter(|l| l.balance_sum() != l.total_supply())
            .map(|l| l.token().clone())
            .collect()
    }

    /// Transfers `amount` of `token` from `from` to `to`.
    ///
    /// YT transfers settle accrual for both parties first; skipping that
    /// would attribute past yield to the wrong holder.
    pub fn transfer_token(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        let balance = self.balance_of(token, from);
        if balance < amount {
            return Err(TokenizerError::InsufficientBalance {
                token: token.clone(),
                available: balance,
                required: amount,
            });
        }
        self.settle_pair_if_yt(token, from, to)?;
        self.ledger_mut(token).transfer(from, to, amount)
    }

    /// Grants `spender` an allowance over `owner`'s balance of `token`
    pub fn approve_token(
        &mut self,
        token: &TokenId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) {
        self.ledger_mut(token).approve(owner, spender, amount);
    }

    /// Allowance-mediated transfer, with the same YT settlement rule as
    /// [`transfer_token`](Self::transfer_token)
    pub fn transfer_token_from(
        &mut self,
        token: &TokenId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        let granted = self.allowance(token, from, spender);
        if granted < amount {
            return Err(TokenizerError::InsufficientAllowance {
                token: token.clone(),
                granted,
                required: amount,
            });
        }
        let balance = self.balance_of(token, from);
        if balance < amount {
            return Err(TokenizerError::InsufficientBalance {
                token: token.clone(),
                available: balance,
                required: amount,
            });
        }
        self.settle_pair_if_yt(token, from, to)?;
        self.ledger_mut(token).transfer_from(spender, from, to, amount)
    }

    // ---------------------------------------------------------------
    // market registry
    // ---------------------------------------------------------------

    /// Registers a market; see [`MarketRegistry::create_market`]
    pub fn create_market(
        &mut self,
        underlying: TokenId,
        maturity_duration: Duration,
        pt_meta: TokenMeta,
        yt_meta: TokenMeta,
        now: Timestamp,
    ) -> TokenizerResult<MarketId> {
        let id = self.registry.create_market(
            underlying.clone(),
            maturity_duration,
            pt_meta,
            yt_meta,
            now,
        )?;
        let market = self.registry.get(id)?;
        let (sy, pt, yt, maturity) = (
            market.sy.clone(),
            market.pt.clone(),
            market.yt.clone(),
            market.maturity,
        );
        for token in [&sy, &pt, &yt] {
            self.ledger_mut(token);
        }
        self.accruals.insert(id, MarketAccrual::new());
        self.events.push(ProtocolEvent::MarketCreated {
            market: id,
            underlying,
            maturity,
        });
        Ok(id)
    }

    /// Pauses a market; wrap/split and new pools over its tokens stop,
    /// exits stay open
    pub fn pause_market(&mut self, id: MarketId) -> TokenizerResult<()> {
        self.registry.pause_market(id)
    }

    /// Reactivates a paused market
    pub fn resume_market(&mut self, id: MarketId) -> TokenizerResult<()> {
        self.registry.resume_market(id)
    }

    /// Market read view, if registered
    pub fn get_market(&self, id: MarketId) -> Option<MarketInfo> {
        let market = self.registry.get(id).ok()?;
        let accrual = self.accruals.get(&id)?;
        Some(MarketInfo {
            id: market.id,
            underlying: market.underlying.clone(),
            sy: market.sy.clone(),
            pt: market.pt.clone(),
            yt: market.yt.clone(),
            maturity: market.maturity,
            created_at: market.created_at,
            active: market.active,
            total_sy_deposited: market.total_sy_deposited,
            sy_supply: self.total_supply(&market.sy),
            pt_supply: self.total_supply(&market.pt),
            yt_supply: self.total_supply(&market.yt),
            yield_index: accrual.index(),
            accrual_stage: accrual.stage(),
        })
    }

    /// All market ids, ascending
    pub fn market_ids(&self) -> Vec<MarketId> {
        self.registry.market_ids()
    }

    // ---------------------------------------------------------------
    // split / merge engine
    // ---------------------------------------------------------------

    /// Wraps underlying into SY 1:1. Requires the market active.
    pub fn wrap(
        &mut self,
        market_id: MarketId,
        caller: &AccountId,
        asset_amount: Amount,
    ) -> TokenizerResult<Amount> {
        require_positive(asset_amount)?;
        let market = self.registry.get(market_id)?;
        if !market.active {
            return Err(TokenizerError::MarketInactive(market_id));
        }
        let (underlying, sy, vault) = (
            market.underlying.clone(),
            market.sy.clone(),
            market.vault_account(),
        );
        self.require_balance(&underlying, caller, asset_amount)?;
        self.require_mint_headroom(&sy, asset_amount)?;
        let new_deposited = market
            .total_sy_deposited
            .checked_add(asset_amount)
            .ok_or(TokenizerError::ArithmeticOverflow)?;

        self.ledger_mut(&underlying)
            .transfer(caller, &vault, asset_amount)?;
        self.ledger_mut(&sy).mint(caller, asset_amount)?;
        self.registry.get_mut(market_id)?.total_sy_deposited = new_deposited;
        self.events.push(ProtocolEvent::Wrapped {
            market: market_id,
            account: caller.clone(),
            amount: asset_amount,
        });
        info!(market = %market_id, account = %caller, amount = asset_amount, "wrapped");
        Ok(asset_amount)
    }

    /// Burns SY and releases underlying 1:1. Exit path, open while paused.
    pub fn unwrap(
        &mut self,
        market_id: MarketId,
        caller: &AccountId,
        sy_amount: Amount,
    ) -> TokenizerResult<Amount> {
        require_positive(sy_amount)?;
        let market = self.registry.get(market_id)?;
        let (underlying, sy, vault) = (
            market.underlying.clone(),
            market.sy.clone(),
            market.vault_account(),
        );
        if market.total_sy_deposited < sy_amount {
            return Err(TokenizerError::InsufficientLiquidity(sy_amount));
        }
        let new_deposited = market.total_sy_deposited - sy_amount;
        self.require_balance(&sy, caller, sy_amount)?;
        self.require_balance(&underlying, &vault, sy_amount)?;

        self.ledger_mut(&sy).burn(caller, sy_amount)?;
        self.ledger_mut(&underlying)
            .transfer(&vault, caller, sy_amount)?;
        self.registry.get_mut(market_id)?.total_sy_deposited = new_deposited;
        self.events.push(ProtocolEvent::Unwrapped {
            market: market_id,
            account: caller.clone(),
            amount: sy_amount,
        });
        Ok(sy_amount)
    }

    /// Splits SY into PT + YT at 1:1:1 notional.
    ///
    /// The minimums guard against policy changes between quote and
    /// execution, not AMM pricing; today `pt == yt == sy_amount` always.
    pub fn split_sy(
        &mut self,
        market_id: MarketId,
        caller: &AccountId,
        sy_amount: Amount,
        min_pt: Amount,
        min_yt: Amount,
        now: Timestamp,
    ) -> TokenizerResult<(Amount, Amount)> {
        require_positive(sy_amount)?;
        let market = self.registry.get(market_id)?;
        if !market.active {
            return Err(TokenizerError::MarketInactive(market_id));
        }
        if market.is_matured(now) {
            return Err(TokenizerError::MarketMatured(market_id));
        }
        let (sy, pt, yt) = (market.sy.clone(), market.pt.clone(), market.yt.clone());
        if sy_amount < min_pt {
            return Err(TokenizerError::SlippageExceeded {
                realized: sy_amount,
                minimum: min_pt,
            });
        }
        if sy_amount < min_yt {
            return Err(TokenizerError::SlippageExceeded {
                realized: sy_amount,
                minimum: min_yt,
            });
        }
        self.require_balance(&sy, caller, sy_amount)?;
        self.require_mint_headroom(&pt, sy_amount)?;
        self.require_mint_headroom(&yt, sy_amount)?;

        // the caller's YT balance is about to change
        self.settle_yt(market_id, caller)?;

        self.ledger_mut(&sy).burn(caller, sy_amount)?;
        self.ledger_mut(&pt).mint(caller, sy_amount)?;
        self.ledger_mut(&yt).mint(caller, sy_amount)?;
        self.events.push(ProtocolEvent::Split {
            market: market_id,
            account: caller.clone(),
            amount: sy_amount,
        });
        info!(market = %market_id, account = %caller, amount = sy_amount, "split");
        Ok((sy_amount, sy_amount))
    }

    /// Burns equal PT and YT, minting SY back. Open at any time, paused or
    /// matured included.
    pub fn merge_pt_yt(
        &mut self,
        market_id: MarketId,
        caller: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<Amount> {
        require_positive(amount)?;
        let market = self.registry.get(market_id)?;
        let (sy, pt, yt) = (market.sy.clone(), market.pt.clone(), market.yt.clone());
        self.require_balance(&pt, caller, amount)?;
        self.require_balance(&yt, caller, amount)?;
        self.require_mint_headroom(&sy, amount)?;

        self.settle_yt(market_id, caller)?;

        self.ledger_mut(&pt).burn(caller, amount)?;
        self.ledger_mut(&yt).burn(caller, amount)?;
        self.ledger_mut(&sy).mint(caller, amount)?;
        self.events.push(ProtocolEvent::Merged {
            market: market_id,
            account: caller.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Redeems PT for underlying 1:1, only at/after maturity. Open while
    /// paused.
    pub fn redeem(
        &mut self,
        market_id: MarketId,
        caller: &AccountId,
        pt_amount: Amount,
        now: Timestamp,
    ) -> TokenizerResult<Amount> {
        require_positive(pt_amount)?;
        let market = self.registry.get(market_id)?;
        if !market.is_matured(now) {
            return Err(TokenizerError::MarketNotMatured(market_id));
        }
        let (underlying, pt, vault) = (
            market.underlying.clone(),
            market.pt.clone(),
            market.vault_account(),
        );
        if market.total_sy_deposited < pt_amount {
            return Err(TokenizerError::InsufficientLiquidity(pt_amount));
        }
        let new_deposited = market.total_sy_deposited - pt_amount;
        self.require_balance(&pt, caller, pt_amount)?;
        self.require_balance(&underlying, &vault, pt_amount)?;

        self.ledger_mut(&pt).burn(caller, pt_amount)?;
        self.ledger_mut(&underlying)
            .transfer(&vault, caller, pt_amount)?;
        self.registry.get_mut(market_id)?.total_sy_deposited = new_deposited;
        self.events.push(ProtocolEvent::Redeemed {
            market: market_id,
            account: caller.clone(),
            amount: pt_amount,
        });
        info!(market = %market_id, account = %caller, amount = pt_amount, "redeemed");
        Ok(pt_amount)
    }

    // ---------------------------------------------------------------
    // yield accrual
    // ---------------------------------------------------------------

    /// Folds `amount` of the caller's underlying into the market's yield
    /// index. Zero YT supply follows the configured
    /// [`UndistributedYieldPolicy`].
    pub fn distribute_yield(
        &mut self,
        market_id: MarketId,
        caller: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        require_positive(amount)?;
        let market = self.registry.get(market_id)?;
        let (underlying, yt, vault) = (
            market.underlying.clone(),
            market.yt.clone(),
            market.vault_account(),
        );
        self.require_balance(&underlying, caller, amount)?;
        let yt_supply = self.total_supply(&yt);
        let accrual = self
            .accruals
            .get(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?;

        if yt_supply == 0 {
            match self.config.undistributed_yield {
                UndistributedYieldPolicy::Reject => {
                    return Err(TokenizerError::ZeroSupply(market_id))
                }
                UndistributedYieldPolicy::Carry => {
                    // validate the carry math before moving funds
                    let mut preview = accrual.clone();
                    preview.park(amount)?;
                    self.ledger_mut(&underlying).transfer(caller, &vault, amount)?;
                    self.accruals
                        .get_mut(&market_id)
                        .ok_or(TokenizerError::MarketNotFound(market_id))?
                        .park(amount)?;
                    debug!(market = %market_id, amount, "yield parked, no YT supply");
                    return Ok(());
                }
            }
        }

        let (index, carry) = accrual.preview_distribute(amount, yt_supply)?;
        self.ledger_mut(&underlying).transfer(caller, &vault, amount)?;
        self.accruals
            .get_mut(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?
            .commit_distribute(index, carry);
        self.events.push(ProtocolEvent::YieldDistributed {
            market: market_id,
            amount,
            index,
        });
        info!(market = %market_id, amount, index, "yield distributed");
        Ok(())
    }

    /// Settles a holder's accrual up to the current index
    pub fn accrue_yield(&mut self, market_id: MarketId, holder: &AccountId) -> TokenizerResult<()> {
        self.registry.get(market_id)?;
        self.settle_yt(market_id, holder)
    }

    /// Pays out the holder's settled yield in underlying and resets it.
    /// Callable after maturity and while paused.
    pub fn claim_yield(
        &mut self,
        market_id: MarketId,
        holder: &AccountId,
    ) -> TokenizerResult<Amount> {
        let market = self.registry.get(market_id)?;
        let (underlying, yt, vault) = (
            market.underlying.clone(),
            market.yt.clone(),
            market.vault_account(),
        );
        let yt_balance = self.balance_of(&yt, holder);
        let accrual = self
            .accruals
            .get(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?;
        let mut entry = accrual.preview_settle(holder, yt_balance)?;
        let amount = entry.claimable;
        if amount == 0 {
            return Err(TokenizerError::NothingToClaim);
        }
        self.require_balance(&underlying, &vault, amount)?;

        entry.claimable = 0;
        self.accruals
            .get_mut(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?
            .commit_settle(holder, entry);
        self.ledger_mut(&underlying).transfer(&vault, holder, amount)?;
        self.events.push(ProtocolEvent::YieldClaimed {
            market: market_id,
            account: holder.clone(),
            amount,
        });
        info!(market = %market_id, account = %holder, amount, "yield claimed");
        Ok(amount)
    }

    /// Yield the holder could claim right now, including unsettled accrual.
    /// Pure read.
    pub fn claimable_yield(&self, market_id: MarketId, holder: &AccountId) -> Amount {
        let Ok(market) = self.registry.get(market_id) else {
            return 0;
        };
        let Some(accrual) = self.accruals.get(&market_id) else {
            return 0;
        };
        accrual.claimable_settled(holder, self.balance_of(&market.yt, holder))
    }

    // ---------------------------------------------------------------
    // AMM pools
    // ---------------------------------------------------------------

    /// Creates a pool with the configured default fee
    pub fn create_pool(&mut self, token_a: TokenId, token_b: TokenId) -> TokenizerResult<PoolKey> {
        self.create_pool_with_fee(token_a, token_b, self.config.default_fee_bps)
    }

    /// Creates a pool with an explicit fee, immutable afterwards
    pub fn create_pool_with_fee(
        &mut self,
        token_a: TokenId,
        token_b: TokenId,
        fee_bps: FeeBps,
    ) -> TokenizerResult<PoolKey> {
        if fee_bps.0 as u128 >= FeeBps::DENOMINATOR {
            return Err(TokenizerError::InvalidAmount(format!(
                "fee must be below {} bps",
                FeeBps::DENOMINATOR
            )));
        }
        let key = PoolKey::new(token_a, token_b)?;
        for token in [&key.token0, &key.token1] {
            if let Some((market_id, _)) = self.registry.market_of_token(token) {
                if !self.registry.get(market_id)?.active {
                    return Err(TokenizerError::MarketInactive(market_id));
                }
            }
        }
        if self.pools.contains_key(&key) {
            return Err(TokenizerError::PoolAlreadyExists(
                key.token0.clone(),
                key.token1.clone(),
            ));
        }

        self.ledger_mut(&key.lp_token());
        self.pools.insert(key.clone(), Pool::new(key.clone(), fee_bps));
        self.events.push(ProtocolEvent::PoolCreated {
            pool: key.clone(),
            fee_bps,
        });
        info!(pool = %key, %fee_bps, "pool created");
        Ok(key)
    }

    /// Deactivates a pool: swaps and deposits stop, withdrawals stay open
    pub fn deactivate_pool(&mut self, token_a: TokenId, token_b: TokenId) -> TokenizerResult<()> {
        let key = PoolKey::new(token_a, token_b)?;
        let pool = self
            .pools
            .get_mut(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?;
        pool.is_active = false;
        Ok(())
    }

    /// Reactivates a pool
    pub fn reactivate_pool(&mut self, token_a: TokenId, token_b: TokenId) -> TokenizerResult<()> {
        let key = PoolKey::new(token_a, token_b)?;
        let pool = self
            .pools
            .get_mut(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?;
        pool.is_active = true;
        Ok(())
    }

    /// Deposits liquidity. Amounts are given in canonical (token0, token1)
    /// order of the pair; the engine pulls the exact ratio and never more.
    pub fn add_liquidity(
        &mut self,
        caller: &AccountId,
        token_a: TokenId,
        token_b: TokenId,
        amount_a: Amount,
        amount_b: Amount,
        min_lp: Amount,
    ) -> TokenizerResult<AddLiquidityOutcome> {
        let key = PoolKey::new(token_a.clone(), token_b)?;
        let (amount0, amount1) = if token_a == key.token0 {
            (amount_a, amount_b)
        } else {
            (amount_b, amount_a)
        };
        let pool = self
            .pools
            .get(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?;
        if !pool.is_active {
            return Err(TokenizerError::PoolInactive(
                key.token0.clone(),
                key.token1.clone(),
            ));
        }
        let lp_token = key.lp_token();
        let pool_account = key.pool_account();
        let total_lp = self.total_supply(&lp_token);
        let quote = pool.quote_add_liquidity(total_lp, amount0, amount1)?;
        if quote.lp_minted < min_lp {
            return Err(TokenizerError::SlippageExceeded {
                realized: quote.lp_minted,
                minimum: min_lp,
            });
        }
        self.require_balance(&key.token0, caller, quote.use0)?;
        self.require_balance(&key.token1, caller, quote.use1)?;
        self.require_mint_headroom(&lp_token, quote.lp_minted)?;

        self.settle_pair_if_yt(&key.token0.clone(), caller, &pool_account)?;
        self.settle_pair_if_yt(&key.token1.clone(), caller, &pool_account)?;

        self.pools
            .get_mut(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?
            .apply_add_liquidity(&quote)?;
        self.ledger_mut(&key.token0)
            .transfer(caller, &pool_account, quote.use0)?;
        self.ledger_mut(&key.token1)
            .transfer(caller, &pool_account, quote.use1)?;
        self.ledger_mut(&lp_token).mint(caller, quote.lp_minted)?;
        self.events.push(ProtocolEvent::LiquidityAdded {
            pool: key.clone(),
            account: caller.clone(),
            amount0: quote.use0,
            amount1: quote.use1,
            lp_minted: quote.lp_minted,
        });
        info!(pool = %key, account = %caller, lp = quote.lp_minted, "liquidity added");
        Ok(AddLiquidityOutcome {
            amount0_used: quote.use0,
            amount1_used: quote.use1,
            lp_minted: quote.lp_minted,
        })
    }

    /// Burns LP shares for the proportional share of both reserves. Open on
    /// deactivated pools (wind-down).
    pub fn remove_liquidity(
        &mut self,
        caller: &AccountId,
        token_a: TokenId,
        token_b: TokenId,
        lp_amount: Amount,
    ) -> TokenizerResult<RemoveLiquidityOutcome> {
        let key = PoolKey::new(token_a, token_b)?;
        let pool = self
            .pools
            .get(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?;
        let lp_token = key.lp_token();
        let pool_account = key.pool_account();
        let lp_balance = self.balance_of(&lp_token, caller);
        if lp_balance < lp_amount {
            return Err(TokenizerError::InsufficientLP {
                available: lp_balance,
                required: lp_amount,
            });
        }
        let total_lp = self.total_supply(&lp_token);
        let quote = pool.quote_remove_liquidity(total_lp, lp_amount)?;

        self.settle_pair_if_yt(&key.token0.clone(), &pool_account, caller)?;
        self.settle_pair_if_yt(&key.token1.clone(), &pool_account, caller)?;

        self.ledger_mut(&lp_token).burn(caller, lp_amount)?;
        if quote.out0 > 0 {
            self.ledger_mut(&key.token0)
                .transfer(&pool_account, caller, quote.out0)?;
        }
        if quote.out1 > 0 {
            self.ledger_mut(&key.token1)
                .transfer(&pool_account, caller, quote.out1)?;
        }
        self.pools
            .get_mut(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?
            .apply_remove_liquidity(&quote);
        self.events.push(ProtocolEvent::LiquidityRemoved {
            pool: key.clone(),
            account: caller.clone(),
            amount0: quote.out0,
            amount1: quote.out1,
            lp_burned: lp_amount,
        });
        Ok(RemoveLiquidityOutcome {
            amount0_out: quote.out0,
            amount1_out: quote.out1,
        })
    }

    /// Swaps `amount_in` of `token_in` for `token_out`, crediting
    /// `recipient`. Fee stays in the input-side reserve.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        caller: &AccountId,
        token_in: TokenId,
        token_out: TokenId,
        amount_in: Amount,
        min_amount_out: Amount,
        recipient: &AccountId,
    ) -> TokenizerResult<Amount> {
        let key = PoolKey::new(token_in.clone(), token_out.clone())?;
        let pool = self
            .pools
            .get(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?;
        if !pool.is_active {
            return Err(TokenizerError::PoolInactive(
                key.token0.clone(),
                key.token1.clone(),
            ));
        }
        let input_is_token0 = token_in == key.token0;
        let quote = pool.quote_swap(input_is_token0, amount_in)?;
        if quote.amount_out < min_amount_out {
            return Err(TokenizerError::SlippageExceeded {
                realized: quote.amount_out,
                minimum: min_amount_out,
            });
        }
        let pool_account = key.pool_account();
        self.require_balance(&token_in, caller, amount_in)?;

        self.settle_pair_if_yt(&token_in, caller, &pool_account)?;
        self.settle_pair_if_yt(&token_out, &pool_account, recipient)?;

        self.ledger_mut(&token_in)
            .transfer(caller, &pool_account, amount_in)?;
        self.ledger_mut(&token_out)
            .transfer(&pool_account, recipient, quote.amount_out)?;
        self.pools
            .get_mut(&key)
            .ok_or_else(|| TokenizerError::PoolNotFound(key.token0.clone(), key.token1.clone()))?
            .apply_swap(input_is_token0, &quote);
        self.events.push(ProtocolEvent::SwapExecuted {
            pool: key.clone(),
            account: caller.clone(),
            token_in: token_in.clone(),
            amount_in,
            amount_out: quote.amount_out,
        });
        info!(
            pool = %key,
            account = %caller,
            token_in = %token_in,
            amount_in,
            amount_out = quote.amount_out,
            "swap executed"
        );
        Ok(quote.amount_out)
    }

    /// Pool read view for the canonicalized pair, if present
    pub fn get_pool_info(&self, token_a: TokenId, token_b: TokenId) -> Option<PoolInfo> {
        let key = PoolKey::new(token_a, token_b).ok()?;
        let pool = self.pools.get(&key)?;
        let lp_token = key.lp_token();
        Some(PoolInfo {
            token0: key.token0.clone(),
            token1: key.token1.clone(),
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
            total_lp_supply: self.total_supply(&lp_token),
            lp_token,
            fee_bps: pool.fee_bps,
            is_active: pool.is_active,
            spot_price: pool.spot_price(),
        })
    }

    /// All pool keys, in canonical order
    pub fn pool_keys(&self) -> Vec<PoolKey> {
        let mut keys: Vec<_> = self.pools.keys().cloned().collect();
        keys.sort_by(|a, b| (&a.token0, &a.token1).cmp(&(&b.token0, &b.token1)));
        keys
    }

    // ---------------------------------------------------------------
    // event log
    // ---------------------------------------------------------------

    /// Events committed so far, oldest first
    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    /// Drains the event log for downstream consumers
    pub fn take_events(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------
    // internals
    // ---------------------------------------------------------------

    fn ledger_mut(&mut self, token: &TokenId) -> &mut FungibleLedger {
        self.ledgers
            .entry(token.clone())
            .or_insert_with(|| FungibleLedger::new(token.clone()))
    }

    fn require_balance(
        &self,
        token: &TokenId,
        account: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        let available = self.balance_of(token, account);
        if available < amount {
            return Err(TokenizerError::InsufficientBalance {
                token: token.clone(),
                available,
                required: amount,
            });
        }
        Ok(())
    }

    fn require_mint_headroom(&self, token: &TokenId, amount: Amount) -> TokenizerResult<()> {
        self.total_supply(token)
            .checked_add(amount)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Settles one holder's YT accrual for a market
    fn settle_yt(&mut self, market_id: MarketId, holder: &AccountId) -> TokenizerResult<()> {
        let yt = self.registry.get(market_id)?.yt.clone();
        let balance = self.balance_of(&yt, holder);
        self.accruals
            .get_mut(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?
            .settle(holder, balance)
    }

    /// If `token` is some market's YT, settles both parties of an imminent
    /// balance move. Settlement is value-neutral: it materializes already-
    /// earned yield without changing entitlements, so it may precede the
    /// commit phase.
    fn settle_pair_if_yt(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
    ) -> TokenizerResult<()> {
        let Some((market_id, TokenRole::Yt)) = self.registry.market_of_token(token) else {
            return Ok(());
        };
        let from_balance = self.balance_of(token, from);
        let to_balance = self.balance_of(token, to);
        let accrual = self
            .accruals
            .get(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?;
        let from_entry = accrual.preview_settle(from, from_balance)?;
        let to_entry = accrual.preview_settle(to, to_balance)?;
        let accrual = self
            .accruals
            .get_mut(&market_id)
            .ok_or(TokenizerError::MarketNotFound(market_id))?;
        accrual.commit_settle(from, from_entry);
        accrual.commit_settle(to, to_entry);
        Ok(())
    }
}

/// `Arc<RwLock<Protocol>>` wrapper: writers serialize, readers observe one
/// consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct ThreadSafeProtocol {
    inner: Arc<RwLock<Protocol>>,
}

impl ThreadSafeProtocol {
    /// Wraps a fresh default-configured protocol
    pub fn new() -> Self {
        Self::from_protocol(Protocol::new())
    }

    /// Wraps an existing protocol instance
    pub fn from_protocol(protocol: Protocol) -> Self {
        Self {
            inner: Arc::new(RwLock::new(protocol)),
        }
    }

    /// Runs a closure under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&Protocol) -> R) -> R {
        f(&self.inner.read().expect("Failed to acquire read lock"))
    }

    /// Runs a closure under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut Protocol) -> R) -> R {
        f(&mut self.inner.write().expect("Failed to acquire write lock"))
    }

    /// See [`Protocol::wrap`]
    pub fn wrap(
        &self,
        market_id: MarketId,
        caller: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<Amount> {
        self.write(|p| p.wrap(market_id, caller, amount))
    }

    /// See [`Protocol::split_sy`]
    pub fn split_sy(
        &self,
        market_id: MarketId,
        caller: &AccountId,
        sy_amount: Amount,
        min_pt: Amount,
        min_yt: Amount,
        now: Timestamp,
    ) -> TokenizerResult<(Amount, Amount)> {
        self.write(|p| p.split_sy(market_id, caller, sy_amount, min_pt, min_yt, now))
    }

    /// See [`Protocol::swap`]
    pub fn swap(
        &self,
        caller: &AccountId,
        token_in: TokenId,
        token_out: TokenId,
        amount_in: Amount,
        min_amount_out: Amount,
        recipient: &AccountId,
    ) -> TokenizerResult<Amount> {
        self.write(|p| {
            p.swap(
                caller,
                token_in,
                token_out,
                amount_in,
                min_amount_out,
                recipient,
            )
        })
    }

    /// See [`Protocol::balance_of`]
    pub fn balance_of(&self, token: &TokenId, account: &AccountId) -> Amount {
        self.read(|p| p.balance_of(token, account))
    }

    /// See [`Protocol::get_pool_info`]
    pub fn get_pool_info(&self, token_a: TokenId, token_b: TokenId) -> Option<PoolInfo> {
        self.read(|p| p.get_pool_info(token_a, token_b))
    }

    /// See [`Protocol::get_market`]
    pub fn get_market(&self, id: MarketId) -> Option<MarketInfo> {
        self.read(|p| p.get_market(id))
    }
}

fn require_positive(amount: Amount) -> TokenizerResult<()> {
    if amount == 0 {
        return Err(TokenizerError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
