//! Price aggregator: turns the live submissions of a market into one price.
//!
//! The aggregate is never stored. Callers ask for it at a given `now` and get
//! a value computed from that instant's live set, so an expired submission
//! can never linger as the market price.
//!
//! Rule: median of one price per live oracle. With an even number of prices
//! the two middle values are averaged and the result is truncated toward
//! zero at 18 decimal places. The input is sorted first, which makes the
//! result independent of submission order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matrix_common::fixed;
use matrix_common::{MatrixError, Result};

use crate::store::{PriceSubmission, PriceSubmissionStore};

/// Aggregated price of a market at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub market_id: String,
    pub price: Decimal,
    pub computed_at: DateTime<Utc>,
    /// Number of live oracles that contributed.
    pub sources: usize,
}

/// Stateless median aggregator.
pub struct PriceAggregator;

impl PriceAggregator {
    /// Current price of `market_id` at `now`.
    ///
    /// Fails with `NoLivePrice` when every submission has expired or none was
    /// ever made, and with `InvalidMarket` for unknown or inactive markets.
    pub fn current_price(
        store: &PriceSubmissionStore,
        market_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CurrentPrice> {
        let live = store.list_live(market_id, now)?;
        Self::aggregate(market_id, &live, now)
    }

    /// Aggregate an already-filtered live set.
    pub fn aggregate(
        market_id: &str,
        live: &[PriceSubmission],
        now: DateTime<Utc>,
    ) -> Result<CurrentPrice> {
        let mut prices: Vec<Decimal> = live.iter().map(|s| s.price).collect();
        let price =
            median(&mut prices).ok_or_else(|| MatrixError::NoLivePrice(market_id.to_string()))?;

        tracing::trace!(market = market_id, price = %price, sources = prices.len(), "Price aggregated");

        Ok(CurrentPrice {
            market_id: market_id.to_string(),
            price,
            computed_at: now,
            sources: prices.len(),
        })
    }
}

/// Median of `prices`, sorting them in place. `None` when empty.
pub fn median(prices: &mut [Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }
    prices.sort_unstable();

    let mid = prices.len() / 2;
    if prices.len() % 2 == 1 {
        return Some(prices[mid]);
    }

    // lo + (hi - lo) / 2 cannot overflow for sorted non-negative inputs
    let lo = prices[mid - 1];
    let hi = prices[mid];
    Some(fixed::truncate(lo + (hi - lo) / Decimal::TWO))
}
