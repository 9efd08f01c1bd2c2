//! Balance custody.
//!
//! The settlement engine never owns balances. It talks to a [`Ledger`], the
//! account subsystem of the host chain, and groups its calls into a
//! [`crate::transaction::Transaction`] so they land all-or-nothing. [`Bank`]
//! is the in-memory implementation used by tests and the simulator.

use std::collections::BTreeMap;

use matrix_common::types::{Address, Coin};
use matrix_common::{MatrixError, Result};

/// Account balance primitives provided by the host ledger.
///
/// Each call either applies fully or fails without effect.
pub trait Ledger {
    fn balance(&self, account: &Address, denom: &str) -> u128;

    /// Total amount of `denom` in existence.
    fn supply(&self, denom: &str) -> u128;

    /// Remove `amount` from `account`. Fails with `InsufficientFunds`.
    fn debit(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()>;

    /// Add `amount` to `account`.
    fn credit(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()>;

    /// Create `amount` new units in `account`, growing the supply.
    fn mint(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()>;

    /// Destroy `amount` units held by `account`, shrinking the supply.
    fn burn(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()>;
}

/// In-memory ledger with per-denom supply tracking.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    balances: BTreeMap<(Address, String), u128>,
    supply: BTreeMap<String, u128>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `coins` straight into `account`. Either every coin is minted or
    /// none is.
    pub fn fund_account(&mut self, account: &Address, coins: &[Coin]) -> Result<()> {
        let mut totals: BTreeMap<&str, u128> = BTreeMap::new();
        for coin in coins {
            let total = totals.entry(coin.denom.as_str()).or_default();
            *total = total
                .checked_add(coin.amount)
                .ok_or(MatrixError::ArithmeticOverflow("funding amount"))?;
        }
        for (denom, amount) in &totals {
            self.supply(denom)
                .checked_add(*amount)
                .ok_or(MatrixError::ArithmeticOverflow("token supply"))?;
        }
        for (denom, amount) in totals {
            self.mint(account, denom, amount)?;
        }
        Ok(())
    }

    /// Non-zero balances of `account`, ordered by denom.
    pub fn balances(&self, account: &Address) -> Vec<Coin> {
        self.balances
            .range((*account, String::new())..)
            .take_while(|((addr, _), _)| addr == account)
            .filter(|(_, amount)| **amount > 0)
            .map(|((_, denom), amount)| Coin::new(denom.clone(), *amount))
            .collect()
    }

    /// Every account holding a non-zero balance.
    pub fn accounts(&self) -> Vec<Address> {
        let mut accounts: Vec<Address> = self
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|((addr, _), _)| *addr)
            .collect();
        accounts.dedup();
        accounts
    }

    fn slot(&mut self, account: &Address, denom: &str) -> &mut u128 {
        self.balances
            .entry((*account, denom.to_string()))
            .or_default()
    }
}

impl Ledger for Bank {
    fn balance(&self, account: &Address, denom: &str) -> u128 {
        self.balances
            .get(&(*account, denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn supply(&self, denom: &str) -> u128 {
        self.supply.get(denom).copied().unwrap_or(0)
    }

    fn debit(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()> {
        let available = self.balance(account, denom);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| MatrixError::InsufficientFunds {
                account: account.to_string(),
                denom: denom.to_string(),
                available,
                required: amount,
            })?;
        *self.slot(account, denom) = remaining;
        Ok(())
    }

    fn credit(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()> {
        let updated = self
            .balance(account, denom)
            .checked_add(amount)
            .ok_or(MatrixError::ArithmeticOverflow("account balance"))?;
        *self.slot(account, denom) = updated;
        Ok(())
    }

    fn mint(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()> {
        let supply = self
            .supply(denom)
            .checked_add(amount)
            .ok_or(MatrixError::ArithmeticOverflow("token supply"))?;
        self.credit(account, denom, amount)?;
        self.supply.insert(denom.to_string(), supply);
        Ok(())
    }

    fn burn(&mut self, account: &Address, denom: &str, amount: u128) -> Result<()> {
        self.debit(account, denom, amount)?;
        // supply >= any single balance, so this cannot underflow
        let supply = self.supply(denom).saturating_sub(amount);
        self.supply.insert(denom.to_string(), supply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use matrix_common::types::{COLL_DENOM, STABLE_DENOM};

    fn alice() -> Address {
        Address::new([0xa1; 20])
    }

    fn bob() -> Address {
        Address::new([0xb0; 20])
    }

    #[test]
    fn test_fund_and_balances() {
        let mut bank = Bank::new();
        bank.fund_account(
            &alice(),
            &[Coin::new(STABLE_DENOM, 100), Coin::new(COLL_DENOM, 5)],
        )
        .unwrap();

        assert_eq!(bank.balance(&alice(), STABLE_DENOM), 100);
        assert_eq!(bank.supply(STABLE_DENOM), 100);
        assert_eq!(
            bank.balances(&alice()),
            // ordered by denom: "uusdm" < "uust"
            vec![Coin::new(STABLE_DENOM, 100), Coin::new(COLL_DENOM, 5)]
        );
        assert!(bank.balances(&bob()).is_empty());
    }

    #[test]
    fn test_debit_insufficient_leaves_balance() {
        let mut bank = Bank::new();
        bank.fund_account(&alice(), &[Coin::new(STABLE_DENOM, 10)]).unwrap();

        assert_matches!(
            bank.debit(&alice(), STABLE_DENOM, 9001),
            Err(MatrixError::InsufficientFunds { available: 10, required: 9001, .. })
        );
        assert_eq!(bank.balance(&alice(), STABLE_DENOM), 10);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let mut bank = Bank::new();
        bank.fund_account(&alice(), &[Coin::new(STABLE_DENOM, 10)]).unwrap();
        bank.burn(&alice(), STABLE_DENOM, 4).unwrap();
        assert_eq!(bank.balance(&alice(), STABLE_DENOM), 6);
        assert_eq!(bank.supply(STABLE_DENOM), 6);
    }

    #[test]
    fn test_credit_overflow() {
        let mut bank = Bank::new();
        bank.fund_account(&alice(), &[Coin::new(STABLE_DENOM, u128::MAX)]).unwrap();
        assert_matches!(
            bank.credit(&alice(), STABLE_DENOM, 1),
            Err(MatrixError::ArithmeticOverflow(_))
        );
        assert_matches!(
            bank.mint(&bob(), STABLE_DENOM, 1),
            Err(MatrixError::ArithmeticOverflow(_))
        );
        assert_eq!(bank.balance(&bob(), STABLE_DENOM), 0);
    }

    #[test]
    fn test_fund_account_is_all_or_nothing() {
        let mut bank = Bank::new();
        bank.fund_account(&bob(), &[Coin::new(COLL_DENOM, 1)]).unwrap();

        assert_matches!(
            bank.fund_account(
                &alice(),
                &[Coin::new(STABLE_DENOM, 5), Coin::new(COLL_DENOM, u128::MAX)],
            ),
            Err(MatrixError::ArithmeticOverflow(_))
        );
        assert_eq!(bank.balance(&alice(), STABLE_DENOM), 0);
        assert_eq!(bank.supply(STABLE_DENOM), 0);
        assert_eq!(bank.supply(COLL_DENOM), 1);

        assert_matches!(
            bank.fund_account(
                &alice(),
                &[Coin::new(STABLE_DENOM, u128::MAX), Coin::new(STABLE_DENOM, 1)],
            ),
            Err(MatrixError::ArithmeticOverflow(_))
        );
        assert_eq!(bank.supply(STABLE_DENOM), 0);
    }

    #[test]
    fn test_accounts_lists_holders_once() {
        let mut bank = Bank::new();
        bank.fund_account(
            &alice(),
            &[Coin::new(STABLE_DENOM, 1), Coin::new(COLL_DENOM, 1)],
        )
        .unwrap();
        bank.fund_account(&bob(), &[Coin::new(COLL_DENOM, 1)]).unwrap();
        assert_eq!(bank.accounts(), vec![alice(), bob()]);
    }
}
