//! Burn settlement engine.
//!
//! One call is one state transition: validate the message, read the two
//! market prices and the collateral ratio, compute the payout, then commit
//! every balance change as a single [`Transaction`]. Any error aborts the
//! call with the ledger untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use matrix_common::types::{
    Address, COLL_DENOM, COLL_PRICE_POOL, Coin, GOV_DENOM, GOV_PRICE_POOL, STABLE_DENOM,
};
use matrix_common::{MatrixError, Result};
use matrix_pricefeed::{PriceAggregator, PriceSubmissionStore};

use crate::ledger::Ledger;
use crate::msg::{MsgBurnStable, MsgBurnStableResponse, MsgMintStable, MsgMintStableResponse};
use crate::ratio::{CollateralRatioPolicy, validate_ratio};
use crate::settlement::{compute_burn, compute_mint};
use crate::transaction::Transaction;

/// Name of the module account holding the collateral reserve.
pub const MODULE_NAME: &str = "stablecoin";

/// Protocol collateral reserve.
pub const RESERVE_ADDRESS: Address = Address::module(MODULE_NAME);

/// Prices a settlement reads, both as of the same `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SettlementPrices {
    /// Stable per collateral unit.
    coll: Decimal,
    /// Collateral per governance unit.
    gov: Decimal,
}

/// Drives burns and mints against a ledger, reading prices from the feed
/// and the collateral ratio from `P`.
#[derive(Debug)]
pub struct BurnSettlementEngine<P> {
    ratio_policy: P,
    reserve: Address,
}

impl<P: CollateralRatioPolicy> BurnSettlementEngine<P> {
    pub fn new(ratio_policy: P) -> Self {
        Self {
            ratio_policy,
            reserve: RESERVE_ADDRESS,
        }
    }

    pub fn reserve(&self) -> &Address {
        &self.reserve
    }

    pub fn ratio_policy(&self) -> &P {
        &self.ratio_policy
    }

    pub fn ratio_policy_mut(&mut self) -> &mut P {
        &mut self.ratio_policy
    }

    /// Burn stablecoin for collateral plus newly minted governance asset.
    ///
    /// A zero amount succeeds with zero coins and never reads prices.
    pub fn burn_stable<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        prices: &PriceSubmissionStore,
        msg: &MsgBurnStable,
        now: DateTime<Utc>,
    ) -> Result<MsgBurnStableResponse> {
        let requester = msg.validate_basic()?;
        let stable = msg.stable.amount;
        if stable == 0 {
            return Ok(MsgBurnStableResponse::new(0, 0));
        }

        let held = ledger.balance(&requester, STABLE_DENOM);
        if held < stable {
            return Err(MatrixError::InsufficientFunds {
                account: requester.to_string(),
                denom: STABLE_DENOM.to_string(),
                available: held,
                required: stable,
            });
        }

        let px = self.prices(prices, now)?;
        let ratio = validate_ratio(self.ratio_policy.current_ratio())?;
        let out = compute_burn(stable, px.coll, px.gov, ratio)?;

        Transaction::new(self.reserve)
            .send(requester, self.reserve, Coin::new(STABLE_DENOM, stable))
            .burn(self.reserve, Coin::new(STABLE_DENOM, stable))
            .send(self.reserve, requester, Coin::new(COLL_DENOM, out.collateral))
            .mint(requester, Coin::new(GOV_DENOM, out.gov))
            .commit(ledger)?;

        tracing::info!(
            requester = %requester,
            stable,
            collateral = out.collateral,
            gov = out.gov,
            coll_price = %px.coll,
            gov_price = %px.gov,
            ratio = %ratio,
            "Stablecoin burned"
        );

        Ok(MsgBurnStableResponse::new(out.collateral, out.gov))
    }

    /// Mint stablecoin against collateral (into the reserve) and governance
    /// asset (burned).
    pub fn mint_stable<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        prices: &PriceSubmissionStore,
        msg: &MsgMintStable,
        now: DateTime<Utc>,
    ) -> Result<MsgMintStableResponse> {
        let requester = msg.validate_basic()?;
        let stable = msg.stable.amount;
        if stable == 0 {
            return Ok(MsgMintStableResponse::new(0, 0, 0));
        }

        let px = self.prices(prices, now)?;
        let ratio = validate_ratio(self.ratio_policy.current_ratio())?;
        let req = compute_mint(stable, px.coll, px.gov, ratio)?;

        Transaction::new(self.reserve)
            .send(requester, self.reserve, Coin::new(COLL_DENOM, req.collateral))
            .send(requester, self.reserve, Coin::new(GOV_DENOM, req.gov))
            .burn(self.reserve, Coin::new(GOV_DENOM, req.gov))
            .mint(requester, Coin::new(STABLE_DENOM, stable))
            .commit(ledger)?;

        tracing::info!(
            requester = %requester,
            stable,
            used_coll = req.collateral,
            used_gov = req.gov,
            ratio = %ratio,
            "Stablecoin minted"
        );

        Ok(MsgMintStableResponse::new(stable, req.collateral, req.gov))
    }

    fn prices(&self, store: &PriceSubmissionStore, now: DateTime<Utc>) -> Result<SettlementPrices> {
        let coll = PriceAggregator::current_price(store, COLL_PRICE_POOL, now)?;
        let gov = PriceAggregator::current_price(store, GOV_PRICE_POOL, now)?;
        tracing::debug!(
            coll_price = %coll.price,
            coll_sources = coll.sources,
            gov_price = %gov.price,
            gov_sources = gov.sources,
            "Settlement prices"
        );
        Ok(SettlementPrices {
            coll: coll.price,
            gov: gov.price,
        })
    }
}
