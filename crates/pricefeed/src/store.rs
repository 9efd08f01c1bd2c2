//! Raw oracle submissions, one per (market, oracle).
//!
//! The store holds data only. Nothing here derives a price: the current price
//! of a market is recomputed from [`PriceSubmissionStore::list_live`] every
//! time it is needed (see [`crate::aggregator`]).

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matrix_common::fixed;
use matrix_common::types::Address;
use matrix_common::{MatrixError, Result};

use crate::params::{Market, Params};

/// A time-bounded price assertion from one oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSubmission {
    pub market_id: String,
    pub oracle: Address,
    pub price: Decimal,
    pub expiry: DateTime<Utc>,
}

impl PriceSubmission {
    /// A submission is live while its expiry is strictly after `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }
}

/// In-memory submission store keyed by market, then oracle.
///
/// `BTreeMap` keeps iteration order independent of insertion order, so every
/// node walks submissions identically.
#[derive(Debug, Clone, Default)]
pub struct PriceSubmissionStore {
    markets: BTreeMap<String, Market>,
    submissions: BTreeMap<String, BTreeMap<Address, PriceSubmission>>,
}

impl PriceSubmissionStore {
    pub fn new(params: Params) -> Result<Self> {
        let mut store = Self::default();
        store.set_params(params)?;
        Ok(store)
    }

    /// Replace the market set. Submissions for markets that are no longer
    /// configured are dropped.
    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;

        self.markets = params
            .markets
            .into_iter()
            .map(|m| (m.market_id.clone(), m))
            .collect();

        let markets = &self.markets;
        self.submissions.retain(|id, _| markets.contains_key(id));

        tracing::debug!(markets = self.markets.len(), "Pricefeed params updated");
        Ok(())
    }

    /// Current parameters, markets ordered by id.
    pub fn params(&self) -> Params {
        Params::new(self.markets.values().cloned().collect())
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn market(&self, market_id: &str) -> Option<&Market> {
        self.markets.get(market_id)
    }

    pub fn oracles(&self, market_id: &str) -> Result<&[Address]> {
        self.known_market(market_id).map(|m| m.oracles.as_slice())
    }

    /// Authorize an additional oracle. Adding an existing oracle is a no-op.
    pub fn add_oracle(&mut self, market_id: &str, oracle: Address) -> Result<()> {
        let market = self.known_market_mut(market_id)?;
        if !market.is_authorized(&oracle) {
            market.oracles.push(oracle);
            tracing::info!(market = market_id, oracle = %oracle, "Oracle authorized");
        }
        Ok(())
    }

    /// Revoke an oracle. Its stored submission is kept but no longer counts
    /// toward the market's price.
    pub fn remove_oracle(&mut self, market_id: &str, oracle: &Address) -> Result<()> {
        let market = self.known_market_mut(market_id)?;
        let before = market.oracles.len();
        market.oracles.retain(|o| o != oracle);
        if market.oracles.len() == before {
            return Err(MatrixError::InvalidSource {
                market: market_id.to_string(),
                oracle: oracle.to_string(),
            });
        }
        tracing::info!(market = market_id, oracle = %oracle, "Oracle revoked");
        Ok(())
    }

    pub fn set_active(&mut self, market_id: &str, active: bool) -> Result<()> {
        let market = self.known_market_mut(market_id)?;
        market.active = active;
        tracing::info!(market = market_id, active, "Market activity changed");
        Ok(())
    }

    /// Record a price from `oracle`, replacing its previous submission for
    /// the market.
    ///
    /// The price is truncated to 18 decimal places before storage.
    pub fn submit(
        &mut self,
        market_id: &str,
        oracle: Address,
        price: Decimal,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<&PriceSubmission> {
        let market = self.active_market(market_id)?;

        if !market.is_authorized(&oracle) {
            return Err(MatrixError::InvalidSource {
                market: market_id.to_string(),
                oracle: oracle.to_string(),
            });
        }

        let price = fixed::truncate(price);
        if price <= Decimal::ZERO {
            return Err(MatrixError::InvalidPrice(format!(
                "{price} for market {market_id} must be positive"
            )));
        }

        if expiry <= now {
            return Err(MatrixError::InvalidExpiry {
                expiry: expiry.to_rfc3339(),
                now: now.to_rfc3339(),
            });
        }

        tracing::debug!(
            market = market_id,
            oracle = %oracle,
            price = %price,
            expiry = %expiry,
            "Price submitted"
        );

        let submission = PriceSubmission {
            market_id: market_id.to_string(),
            oracle,
            price,
            expiry,
        };

        let by_oracle = self.submissions.entry(market_id.to_string()).or_default();
        let stored = match by_oracle.entry(oracle) {
            Entry::Occupied(mut slot) => {
                slot.insert(submission);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(submission),
        };
        Ok(stored)
    }

    /// Submissions that may contribute to the market's price at `now`:
    /// not expired, and from an oracle that is still authorized.
    pub fn list_live(&self, market_id: &str, now: DateTime<Utc>) -> Result<Vec<PriceSubmission>> {
        let market = self.active_market(market_id)?;

        Ok(self
            .submissions
            .get(market_id)
            .into_iter()
            .flat_map(|by_oracle| by_oracle.values())
            .filter(|s| s.is_live(now) && market.is_authorized(&s.oracle))
            .cloned()
            .collect())
    }

    /// Every stored submission for the market, expired or not, ordered by oracle.
    pub fn raw_prices(&self, market_id: &str) -> Result<Vec<PriceSubmission>> {
        self.known_market(market_id)?;
        Ok(self
            .submissions
            .get(market_id)
            .map(|by_oracle| by_oracle.values().cloned().collect())
            .unwrap_or_default())
    }

    fn known_market(&self, market_id: &str) -> Result<&Market> {
        self.markets
            .get(market_id)
            .ok_or_else(|| MatrixError::InvalidMarket(format!("{market_id} is not configured")))
    }

    fn known_market_mut(&mut self, market_id: &str) -> Result<&mut Market> {
        self.markets
            .get_mut(market_id)
            .ok_or_else(|| MatrixError::InvalidMarket(format!("{market_id} is not configured")))
    }

    fn active_market(&self, market_id: &str) -> Result<&Market> {
        let market = self.known_market(market_id)?;
        if !market.active {
            return Err(MatrixError::InvalidMarket(format!("{market_id} is not active")));
        }
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    const MARKET: &str = "uust:uusdm";

    fn oracle(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn store_with(oracles: Vec<Address>) -> PriceSubmissionStore {
        PriceSubmissionStore::new(Params::new(vec![Market {
            market_id: MARKET.to_string(),
            base_asset: "uust".to_string(),
            quote_asset: "uusdm".to_string(),
            oracles,
            active: true,
        }]))
        .unwrap()
    }

    #[test]
    fn test_submit_and_list_live() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);

        let stored = store
            .submit(MARKET, oracle(1), dec!(1.5), expiry, t0())
            .unwrap();
        assert_eq!(stored.price, dec!(1.5));

        let live = store.list_live(MARKET, t0()).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].oracle, oracle(1));
    }

    #[test]
    fn test_resubmission_supersedes() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);

        store.submit(MARKET, oracle(1), dec!(1), expiry, t0()).unwrap();
        store.submit(MARKET, oracle(1), dec!(2), expiry, t0()).unwrap();

        let raw = store.raw_prices(MARKET).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].price, dec!(2));
    }

    #[test]
    fn test_expired_submission_is_not_live() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);
        store.submit(MARKET, oracle(1), dec!(1), expiry, t0()).unwrap();

        // expiry must be strictly after now
        assert!(store.list_live(MARKET, expiry).unwrap().is_empty());
        assert_eq!(
            store
                .list_live(MARKET, expiry - Duration::seconds(1))
                .unwrap()
                .len(),
            1
        );
        // raw prices keep the expired entry
        assert_eq!(store.raw_prices(MARKET).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_market() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);
        assert_matches!(
            store.submit("nope", oracle(1), dec!(1), expiry, t0()),
            Err(MatrixError::InvalidMarket(_))
        );
        assert_matches!(store.list_live("nope", t0()), Err(MatrixError::InvalidMarket(_)));
    }

    #[test]
    fn test_inactive_market() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);
        store.submit(MARKET, oracle(1), dec!(1), expiry, t0()).unwrap();
        store.set_active(MARKET, false).unwrap();

        assert_matches!(
            store.submit(MARKET, oracle(1), dec!(1), expiry, t0()),
            Err(MatrixError::InvalidMarket(_))
        );
        assert_matches!(store.list_live(MARKET, t0()), Err(MatrixError::InvalidMarket(_)));
    }

    #[test]
    fn test_unauthorized_source() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);
        assert_matches!(
            store.submit(MARKET, oracle(2), dec!(1), expiry, t0()),
            Err(MatrixError::InvalidSource { .. })
        );
    }

    #[test]
    fn test_non_positive_price() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);
        for price in [dec!(0), dec!(-1), dec!(0.0000000000000000001)] {
            assert_matches!(
                store.submit(MARKET, oracle(1), price, expiry, t0()),
                Err(MatrixError::InvalidPrice(_)),
                "{price} should be rejected"
            );
        }
    }

    #[test]
    fn test_expiry_not_in_future() {
        let mut store = store_with(vec![oracle(1)]);
        assert_matches!(
            store.submit(MARKET, oracle(1), dec!(1), t0(), t0()),
            Err(MatrixError::InvalidExpiry { .. })
        );
        assert_matches!(
            store.submit(MARKET, oracle(1), dec!(1), t0() - Duration::seconds(1), t0()),
            Err(MatrixError::InvalidExpiry { .. })
        );
    }

    #[test]
    fn test_revoked_oracle_excluded_from_live_set() {
        let mut store = store_with(vec![oracle(1), oracle(2)]);
        let expiry = t0() + Duration::hours(1);
        store.submit(MARKET, oracle(1), dec!(1), expiry, t0()).unwrap();
        store.submit(MARKET, oracle(2), dec!(2), expiry, t0()).unwrap();

        store.remove_oracle(MARKET, &oracle(2)).unwrap();

        let live = store.list_live(MARKET, t0()).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].oracle, oracle(1));
        assert_eq!(store.raw_prices(MARKET).unwrap().len(), 2);

        assert_matches!(
            store.remove_oracle(MARKET, &oracle(2)),
            Err(MatrixError::InvalidSource { .. })
        );
    }

    #[test]
    fn test_add_oracle_is_idempotent() {
        let mut store = store_with(vec![oracle(1)]);
        store.add_oracle(MARKET, oracle(2)).unwrap();
        store.add_oracle(MARKET, oracle(2)).unwrap();
        assert_eq!(store.oracles(MARKET).unwrap(), &[oracle(1), oracle(2)]);
    }

    #[test]
    fn test_set_params_drops_removed_markets() {
        let mut store = store_with(vec![oracle(1)]);
        let expiry = t0() + Duration::hours(1);
        store.submit(MARKET, oracle(1), dec!(1), expiry, t0()).unwrap();

        store.set_params(Params::default()).unwrap();
        assert!(store.market(MARKET).is_none());
        assert_matches!(store.raw_prices(MARKET), Err(MatrixError::InvalidMarket(_)));
        assert_eq!(store.markets().count(), 0);
    }
}
