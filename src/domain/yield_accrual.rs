use crate::domain::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Accrual lifecycle of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualStage {
    /// No yield has ever been distributed
    NoAccrual,
    /// At least one distribution has landed
    Accruing,
}

/// Per-holder accrual bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolderYield {
    /// Index value at the holder's last settlement
    pub last_index: u128,
    /// Settled yield in underlying base units, paid out on claim
    pub claimable: Amount,
}

/// Yield accrual state for one market.
///
/// `index` is cumulative yield-per-YT scaled by [`INDEX_SCALE`] and is
/// monotone non-decreasing. The division remainder of every distribution is
/// kept in `carry` and folded into the next one, so repeated small
/// distributions lose no dust.
///
/// Settlement is lazy: `settle` must run for every affected holder before
/// any operation that changes a YT balance, otherwise the holder's share of
/// past yield would be computed against the wrong balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAccrual {
    stage: AccrualStage,
    index: u128,
    carry: u128,
    holders: HashMap<AccountId, HolderYield>,
}

impl MarketAccrual {
    /// Creates pristine accrual state
    pub fn new() -> Self {
        Self {
            stage: AccrualStage::NoAccrual,
            index: 0,
            carry: 0,
            holders: HashMap::new(),
        }
    }

    /// Current lifecycle stage
    pub fn stage(&self) -> AccrualStage {
        self.stage
    }

    /// Current yield-per-YT index (scaled by [`INDEX_SCALE`])
    pub fn index(&self) -> u128 {
        self.index
    }

    /// Scaled remainder awaiting the next distribution
    pub fn carry(&self) -> u128 {
        self.carry
    }

    /// Folds `amount` of newly arrived yield into the index.
    ///
    /// `yt_supply` is the YT total supply at distribution time. The caller
    /// decides the zero-supply policy: this method only ever sees a
    /// non-zero supply.
    pub fn distribute(&mut self, amount: Amount, yt_supply: Amount) -> TokenizerResult<()> {
        let (index, carry) = self.preview_distribute(amount, yt_supply)?;
        self.commit_distribute(index, carry);
        Ok(())
    }

    /// Pure half of [`distribute`](Self::distribute): computes the post-
    /// distribution (index, carry) pair without touching state, so callers
    /// can validate before committing anything.
    pub fn preview_distribute(
        &self,
        amount: Amount,
        yt_supply: Amount,
    ) -> TokenizerResult<(u128, u128)> {
        debug_assert!(yt_supply > 0);
        let scaled = amount
            .checked_mul(INDEX_SCALE)
            .and_then(|s| s.checked_add(self.carry))
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        let new_index = self
            .index
            .checked_add(scaled / yt_supply)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        Ok((new_index, scaled % yt_supply))
    }

    /// Commits a previewed distribution
    pub fn commit_distribute(&mut self, index: u128, carry: u128) {
        self.index = index;
        self.carry = carry;
        self.stage = AccrualStage::Accruing;
        debug!(index = self.index, carry = self.carry, "yield distributed");
    }

    /// Parks the full scaled amount in `carry` (zero-supply Carry policy);
    /// it is released by the first distribution that sees live supply.
    pub fn park(&mut self, amount: Amount) -> TokenizerResult<()> {
        let scaled = amount
            .checked_mul(INDEX_SCALE)
            .and_then(|s| s.checked_add(self.carry))
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        self.carry = scaled;
        Ok(())
    }

    /// Settles a holder up to the current index.
    ///
    /// `yt_balance` must be the holder's balance *before* whatever balance
    /// change motivated the settlement.
    pub fn settle(&mut self, holder: &AccountId, yt_balance: Amount) -> TokenizerResult<()> {
        let entry = self.preview_settle(holder, yt_balance)?;
        self.holders.insert(holder.clone(), entry);
        Ok(())
    }

    /// Pure half of [`settle`](Self::settle): the holder entry as it would
    /// look after settlement
    pub fn preview_settle(
        &self,
        holder: &AccountId,
        yt_balance: Amount,
    ) -> TokenizerResult<HolderYield> {
        let mut entry = self.holders.get(holder).cloned().unwrap_or_default();
        let delta_index = self.index - entry.last_index;
        if delta_index > 0 {
            let earned = yt_balance
                .checked_mul(delta_index)
                .ok_or(TokenizerError::ArithmeticOverflow)?
                / INDEX_SCALE;
            entry.claimable = entry
                .claimable
                .checked_add(earned)
                .ok_or(TokenizerError::ArithmeticOverflow)?;
            entry.last_index = self.index;
        }
        Ok(entry)
    }

    /// Overwrites a holder entry with a previewed settlement
    pub fn commit_settle(&mut self, holder: &AccountId, entry: HolderYield) {
        self.holders.insert(holder.clone(), entry);
    }

    /// Settled claimable amount for a holder
    pub fn claimable(&self, holder: &AccountId) -> Amount {
        self.holders.get(holder).map(|h| h.claimable).unwrap_or(0)
    }

    /// Claimable amount a holder would have after settling at `yt_balance`,
    /// without mutating anything (read surface).
    pub fn claimable_settled(&self, holder: &AccountId, yt_balance: Amount) -> Amount {
        let entry = self.holders.get(holder).cloned().unwrap_or_default();
        let delta_index = self.index - entry.last_index;
        let pending = yt_balance
            .checked_mul(delta_index)
            .map(|p| p / INDEX_SCALE)
            .unwrap_or(0);
        entry.claimable.saturating_add(pending)
    }

    /// Takes the holder's settled yield, resetting it to zero.
    ///
    /// Call [`settle`](Self::settle) first; fails with `NothingToClaim` when
    /// the settled amount is zero.
    pub fn take_claim(&mut self, holder: &AccountId) -> TokenizerResult<Amount> {
        let entry = self.holders.get_mut(holder);
        match entry {
            Some(h) if h.claimable > 0 => {
                let amount = h.claimable;
                h.claimable = 0;
                Ok(amount)
            }
            _ => Err(TokenizerError::NothingToClaim),
        }
    }
}

impl Default for MarketAccrual {
    fn default() -> Self {
        Self::new()
    }
}
