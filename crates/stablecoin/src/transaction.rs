//! Staged balance mutations with all-or-nothing commit.
//!
//! A [`Transaction`] collects the balance operations of one state transition,
//! dry-runs them against a shadow copy of the touched balances, and only then
//! applies them to the [`Ledger`]. If the ledger still rejects a call during
//! apply, every primitive already applied is reverted in reverse order.

use std::collections::BTreeMap;

use matrix_common::types::{Address, Coin};
use matrix_common::{MatrixError, Result};

use crate::ledger::Ledger;

/// One staged balance operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Send { from: Address, to: Address, coin: Coin },
    Mint { to: Address, coin: Coin },
    Burn { from: Address, coin: Coin },
}

/// Single-account ledger call, the unit of apply and revert.
#[derive(Debug, Clone, Copy)]
enum Primitive<'a> {
    Debit(&'a Address, &'a str, u128),
    Credit(&'a Address, &'a str, u128),
    Mint(&'a Address, &'a str, u128),
    Burn(&'a Address, &'a str, u128),
}

impl Primitive<'_> {
    fn apply<L: Ledger + ?Sized>(self, ledger: &mut L) -> Result<()> {
        match self {
            Primitive::Debit(acc, denom, amount) => ledger.debit(acc, denom, amount),
            Primitive::Credit(acc, denom, amount) => ledger.credit(acc, denom, amount),
            Primitive::Mint(acc, denom, amount) => ledger.mint(acc, denom, amount),
            Primitive::Burn(acc, denom, amount) => ledger.burn(acc, denom, amount),
        }
    }

    fn inverse(self) -> Self {
        match self {
            Primitive::Debit(acc, denom, amount) => Primitive::Credit(acc, denom, amount),
            Primitive::Credit(acc, denom, amount) => Primitive::Debit(acc, denom, amount),
            Primitive::Mint(acc, denom, amount) => Primitive::Burn(acc, denom, amount),
            Primitive::Burn(acc, denom, amount) => Primitive::Mint(acc, denom, amount),
        }
    }
}

/// Balance operations of one transition, committed as a unit.
#[derive(Debug, Clone)]
pub struct Transaction {
    reserve: Address,
    ops: Vec<Op>,
}

impl Transaction {
    /// `reserve` is the protocol pool; a shortfall there is reported as
    /// `InsufficientReserve` rather than `InsufficientFunds`.
    pub fn new(reserve: Address) -> Self {
        Self {
            reserve,
            ops: Vec::new(),
        }
    }

    pub fn send(mut self, from: Address, to: Address, coin: Coin) -> Self {
        if !coin.is_zero() {
            self.ops.push(Op::Send { from, to, coin });
        }
        self
    }

    pub fn mint(mut self, to: Address, coin: Coin) -> Self {
        if !coin.is_zero() {
            self.ops.push(Op::Mint { to, coin });
        }
        self
    }

    pub fn burn(mut self, from: Address, coin: Coin) -> Self {
        if !coin.is_zero() {
            self.ops.push(Op::Burn { from, coin });
        }
        self
    }

    /// Validate every operation, then apply them all.
    pub fn commit<L: Ledger + ?Sized>(self, ledger: &mut L) -> Result<()> {
        self.dry_run(ledger)?;

        let primitives = self.primitives();
        let mut applied: Vec<Primitive<'_>> = Vec::with_capacity(primitives.len());

        for step in primitives {
            if let Err(err) = step.apply(ledger) {
                tracing::warn!(error = %err, applied = applied.len(), "Ledger rejected staged op, reverting");
                Self::revert(ledger, applied);
                return Err(err);
            }
            applied.push(step);
        }
        Ok(())
    }

    fn revert<L: Ledger + ?Sized>(ledger: &mut L, applied: Vec<Primitive<'_>>) {
        for step in applied.into_iter().rev() {
            if let Err(err) = step.inverse().apply(ledger) {
                tracing::error!(error = %err, step = ?step, "Failed to revert ledger op");
            }
        }
    }

    fn primitives(&self) -> Vec<Primitive<'_>> {
        let mut out = Vec::with_capacity(self.ops.len() * 2);
        for op in &self.ops {
            match op {
                Op::Send { from, to, coin } => {
                    out.push(Primitive::Debit(from, &coin.denom, coin.amount));
                    out.push(Primitive::Credit(to, &coin.denom, coin.amount));
                }
                Op::Mint { to, coin } => out.push(Primitive::Mint(to, &coin.denom, coin.amount)),
                Op::Burn { from, coin } => out.push(Primitive::Burn(from, &coin.denom, coin.amount)),
            }
        }
        out
    }

    /// Replay the operations on shadow balances read from `ledger`.
    fn dry_run<L: Ledger + ?Sized>(&self, ledger: &L) -> Result<()> {
        let mut balances: BTreeMap<(Address, &str), u128> = BTreeMap::new();
        let mut supply: BTreeMap<&str, u128> = BTreeMap::new();

        for step in self.primitives() {
            match step {
                Primitive::Debit(acc, denom, amount) | Primitive::Burn(acc, denom, amount) => {
                    let slot = balances
                        .entry((*acc, denom))
                        .or_insert_with(|| ledger.balance(acc, denom));
                    let available = *slot;
                    *slot = available
                        .checked_sub(amount)
                        .ok_or_else(|| self.shortfall(acc, denom, available, amount))?;

                    if let Primitive::Burn(..) = step {
                        let total = supply
                            .entry(denom)
                            .or_insert_with(|| ledger.supply(denom));
                        *total = total.saturating_sub(amount);
                    }
                }
                Primitive::Credit(acc, denom, amount) | Primitive::Mint(acc, denom, amount) => {
                    let slot = balances
                        .entry((*acc, denom))
                        .or_insert_with(|| ledger.balance(acc, denom));
                    *slot = slot
                        .checked_add(amount)
                        .ok_or(MatrixError::ArithmeticOverflow("account balance"))?;

                    if let Primitive::Mint(..) = step {
                        let total = supply
                            .entry(denom)
                            .or_insert_with(|| ledger.supply(denom));
                        *total = total
                            .checked_add(amount)
                            .ok_or(MatrixError::ArithmeticOverflow("token supply"))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn shortfall(&self, account: &Address, denom: &str, available: u128, required: u128) -> MatrixError {
        if *account == self.reserve {
            MatrixError::InsufficientReserve {
                denom: denom.to_string(),
                available,
                required,
            }
        } else {
            MatrixError::InsufficientFunds {
                account: account.to_string(),
                denom: denom.to_string(),
                available,
                required,
            }
        }
    }
}
