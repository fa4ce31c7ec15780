use crate::domain::types::*;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Role a derived token plays inside its market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenRole {
    /// Standardized Yield wrapper
    Sy,
    /// Principal token
    Pt,
    /// Yield token
    Yt,
}

/// One tokenized-yield market: an underlying asset paired with a maturity
/// and the SY/PT/YT identities derived from it.
///
/// Identity fields are immutable after creation; `active` flips only on
/// administrative pause/resume and the record is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Registry-assigned id
    pub id: MarketId,
    /// Underlying yield-bearing asset
    pub underlying: TokenId,
    /// SY token id
    pub sy: TokenId,
    /// PT token id
    pub pt: TokenId,
    /// YT token id
    pub yt: TokenId,
    /// Timestamp after which PT redeems and splitting stops
    pub maturity: Timestamp,
    /// Underlying currently held as wrapped principal
    pub total_sy_deposited: Amount,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// False while administratively paused
    pub active: bool,
    /// PT display metadata
    pub pt_meta: TokenMeta,
    /// YT display metadata
    pub yt_meta: TokenMeta,
}

impl Market {
    /// True once `now` has reached maturity
    pub fn is_matured(&self, now: Timestamp) -> bool {
        now >= self.maturity
    }

    /// Vault account holding this market's underlying (principal + yield)
    pub fn vault_account(&self) -> AccountId {
        AccountId::new(format!("vault:{}", self.id))
    }
}

/// Registry of tokenized-yield markets.
///
/// Arena of records keyed by [`MarketId`], with a uniqueness index over
/// (underlying, maturity) and a reverse index from derived token ids back to
/// their market (used for pause checks and YT settlement hooks).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MarketRegistry {
    markets: HashMap<MarketId, Market>,
    by_pair: HashMap<(TokenId, Timestamp), MarketId>,
    token_index: HashMap<TokenId, (MarketId, TokenRole)>,
    next_id: u64,
}

impl MarketRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new market for `underlying` maturing `maturity_duration`
    /// from `now`.
    ///
    /// Exactly one market may exist per (asset, maturity) pair; the pair
    /// stays claimed even while the market is paused, so a paused market can
    /// never be shadowed by a fresh one.
    pub fn create_market(
        &mut self,
        underlying: TokenId,
        maturity_duration: Duration,
        pt_meta: TokenMeta,
        yt_meta: TokenMeta,
        now: Timestamp,
    ) -> TokenizerResult<MarketId> {
        let maturity = now + maturity_duration;
        if maturity <= now {
            return Err(TokenizerError::InvalidAmount(
                "maturity duration must be positive".to_string(),
            ));
        }
        let pair = (underlying.clone(), maturity);
        if self.by_pair.contains_key(&pair) {
            return Err(TokenizerError::MarketAlreadyExists {
                asset: underlying,
                maturity,
            });
        }

        let id = MarketId(self.next_id);
        let tag = format!("{}:{}", underlying.0, maturity.timestamp());
        let market = Market {
            id,
            underlying: underlying.clone(),
            sy: TokenId::new(format!("SY:{tag}")),
            pt: TokenId::new(format!("PT:{tag}")),
            yt: TokenId::new(format!("YT:{tag}")),
            maturity,
            total_sy_deposited: 0,
            created_at: now,
            active: true,
            pt_meta,
            yt_meta,
        };

        self.token_index
            .insert(market.sy.clone(), (id, TokenRole::Sy));
        self.token_index
            .insert(market.pt.clone(), (id, TokenRole::Pt));
        self.token_index
            .insert(market.yt.clone(), (id, TokenRole::Yt));
        self.by_pair.insert(pair, id);
        self.markets.insert(id, market);
        self.next_id += 1;

        info!(market = %id, asset = %underlying, %maturity, "market created");
        Ok(id)
    }

    /// Looks up a market by id
    pub fn get(&self, id: MarketId) -> TokenizerResult<&Market> {
        self.markets.get(&id).ok_or(TokenizerError::MarketNotFound(id))
    }

    /// Mutable lookup by id
    pub fn get_mut(&mut self, id: MarketId) -> TokenizerResult<&mut Market> {
        self.markets
            .get_mut(&id)
            .ok_or(TokenizerError::MarketNotFound(id))
    }

    /// Market and role a derived token belongs to, if any
    pub fn market_of_token(&self, token: &TokenId) -> Option<(MarketId, TokenRole)> {
        self.token_index.get(token).copied()
    }

    /// All registered market ids, ascending
    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<_> = self.markets.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Pauses a market: wrap/split and new pools over its tokens are
    /// rejected, while merge/unwrap/redeem/claim stay open for wind-down.
    pub fn pause_market(&mut self, id: MarketId) -> TokenizerResult<()> {
        let market = self.get_mut(id)?;
        market.active = false;
        info!(market = %id, "market paused");
        Ok(())
    }

    /// Reactivates a paused market
    pub fn resume_market(&mut self, id: MarketId) -> TokenizerResult<()> {
        let market = self.get_mut(id)?;
        market.active = true;
        info!(market = %id, "market resumed");
        Ok(())
    }
}
