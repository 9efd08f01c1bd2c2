use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use matrix_common::types::Address;
use matrix_common::{MatrixError, Result};

/// A priced asset pair and the oracles allowed to quote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub market_id: String,
    pub base_asset: String,
    pub quote_asset: String,
    /// Authorized sources, in the order they were added.
    pub oracles: Vec<Address>,
    pub active: bool,
}

impl Market {
    pub fn is_authorized(&self, oracle: &Address) -> bool {
        self.oracles.contains(oracle)
    }
}

/// The pricefeed parameter set: every configured market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub markets: Vec<Market>,
}

impl Params {
    pub fn new(markets: Vec<Market>) -> Self {
        Self { markets }
    }

    /// Reject empty or duplicate market ids and duplicate oracles within a market.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for market in &self.markets {
            if market.market_id.trim().is_empty() {
                return Err(MatrixError::InvalidMarket("empty market id".to_string()));
            }
            if !seen.insert(market.market_id.as_str()) {
                return Err(MatrixError::InvalidMarket(format!(
                    "duplicate market id {}",
                    market.market_id
                )));
            }
            let unique: BTreeSet<_> = market.oracles.iter().collect();
            if unique.len() != market.oracles.len() {
                return Err(MatrixError::InvalidMarket(format!(
                    "duplicate oracle in market {}",
                    market.market_id
                )));
            }
        }
        Ok(())
    }
}
