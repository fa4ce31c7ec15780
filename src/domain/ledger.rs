use crate::domain::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fungible balance ledger for one token kind.
///
/// SY, PT, YT and LP shares are all instances of this single ledger type;
/// behavioral differences (maturity rules, accrual hooks) live in the
/// engines that drive it, not in the ledger itself.
///
/// Invariants:
/// - `sum(balances) == total_supply` after every operation
/// - balances are unsigned, so they can never go negative
/// - an allowance is decremented atomically with the transfer it authorizes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FungibleLedger {
    token: TokenId,
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

impl FungibleLedger {
    /// Creates an empty ledger for the given token
    pub fn new(token: TokenId) -> Self {
        Self {
            token,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Token this ledger accounts for
    pub fn token(&self) -> &TokenId {
        &self.token
    }

    /// Balance of an account (zero when the account has no entry)
    pub fn balance_of(&self, owner: &AccountId) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Allowance granted by `owner` to `spender`
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Recorded total supply
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Sum of all holder balances; equals `total_supply` by invariant
    pub fn balance_sum(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Mints `amount` new units to `owner`
    pub fn mint(&mut self, owner: &AccountId, amount: Amount) -> TokenizerResult<()> {
        require_positive(amount)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenizerError::ArithmeticOverflow)?;
        let new_balance = self
            .balance_of(owner)
            .checked_add(amount)
            .ok_or(TokenizerError::ArithmeticOverflow)?;

        self.total_supply = new_supply;
        self.balances.insert(owner.clone(), new_balance);
        Ok(())
    }

    /// Burns `amount` units from `owner`
    pub fn burn(&mut self, owner: &AccountId, amount: Amount) -> TokenizerResult<()> {
        require_positive(amount)?;
        let balance = self.balance_of(owner);
        if balance < amount {
            return Err(TokenizerError::InsufficientBalance {
                token: self.token.clone(),
                available: balance,
                required: amount,
            });
        }

        self.total_supply -= amount;
        self.set_balance(owner, balance - amount);
        Ok(())
    }

    /// Moves `amount` from `from` to `to`
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        require_positive(amount)?;
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenizerError::InsufficientBalance {
                token: self.token.clone(),
                available: from_balance,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenizerError::ArithmeticOverflow)?;

        self.set_balance(from, from_balance - amount);
        self.balances.insert(to.clone(), to_balance);
        Ok(())
    }

    /// Grants `spender` the right to move up to `amount` of `owner`'s balance.
    ///
    /// Overwrites any previous grant; zero revokes.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        let key = (owner.clone(), spender.clone());
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// Allowance and balances mutate together or not at all.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> TokenizerResult<()> {
        require_positive(amount)?;
        let granted = self.allowance(from, spender);
        if granted < amount {
            return Err(TokenizerError::InsufficientAllowance {
                token: self.token.clone(),
                granted,
                required: amount,
            });
        }
        // transfer() revalidates the balance; allowance is only touched
        // after it succeeds, so a failed leg leaves everything unchanged.
        self.transfer(from, to, amount)?;
        self.approve(from, spender, granted - amount);
        Ok(())
    }

    fn set_balance(&mut self, owner: &AccountId, balance: Amount) {
        if balance == 0 {
            self.balances.remove(owner);
        } else {
            self.balances.insert(owner.clone(), balance);
        }
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
