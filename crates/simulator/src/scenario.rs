//! Scenario file format.
//!
//! ```json
//! {
//!   "genesis": {
//!     "start_time": "2024-01-01T00:00:00Z",
//!     "markets": [ { "market_id": "uust:uusdm", "base_asset": "uust",
//!                    "quote_asset": "uusdm", "oracles": ["0x.."], "active": true } ],
//!     "balances": [ { "address": "0x..", "coins": [ { "denom": "uusdm", "amount": 100 } ] } ],
//!     "reserve": [ { "denom": "uust", "amount": 1000 } ],
//!     "collateral_ratio": "0.9"
//!   },
//!   "steps": [
//!     { "type": "post_price", "oracle": "0x..", "market_id": "uust:uusdm", "price": "1" },
//!     { "type": "burn_stable", "creator": "0x..", "amount": 10 },
//!     { "type": "advance_time", "secs": 60 }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matrix_common::types::{Address, Coin};
use matrix_pricefeed::Market;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub genesis: Genesis,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub start_time: DateTime<Utc>,
    pub markets: Vec<Market>,
    #[serde(default)]
    pub balances: Vec<GenesisAccount>,
    /// Coins held by the protocol reserve at start.
    #[serde(default)]
    pub reserve: Vec<Coin>,
    /// Overrides the configured ratio when present.
    #[serde(default)]
    pub collateral_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub coins: Vec<Coin>,
}

/// One state transition to replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    PostPrice {
        oracle: Address,
        market_id: String,
        price: Decimal,
        /// Defaults to now plus the configured price TTL.
        #[serde(default)]
        expiry: Option<DateTime<Utc>>,
    },
    /// `u64` amounts: an internally tagged enum cannot buffer a `u128`.
    BurnStable {
        creator: String,
        amount: u64,
    },
    MintStable {
        creator: String,
        amount: u64,
    },
    SetRatio {
        ratio: Decimal,
    },
    AdvanceTime {
        secs: u32,
    },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::PostPrice { .. } => "post_price",
            Step::BurnStable { .. } => "burn_stable",
            Step::MintStable { .. } => "mint_stable",
            Step::SetRatio { .. } => "set_ratio",
            Step::AdvanceTime { .. } => "advance_time",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_steps() {
        let raw = r#"[
            {"type": "post_price", "oracle": "0x0101010101010101010101010101010101010101",
             "market_id": "uust:uusdm", "price": "1.5"},
            {"type": "burn_stable", "creator": "0xabc", "amount": 10},
            {"type": "set_ratio", "ratio": "0.8"},
            {"type": "advance_time", "secs": 30}
        ]"#;
        let steps: Vec<Step> = serde_json::from_str(raw).unwrap();

        assert_eq!(
            steps[0],
            Step::PostPrice {
                oracle: Address::new([1; 20]),
                market_id: "uust:uusdm".to_string(),
                price: dec!(1.5),
                expiry: None,
            }
        );
        // creators are validated when the step runs, not when it is parsed
        assert_eq!(
            steps[1],
            Step::BurnStable {
                creator: "0xabc".to_string(),
                amount: 10
            }
        );
        assert_eq!(steps[2].kind(), "set_ratio");
        assert_eq!(steps[3], Step::AdvanceTime { secs: 30 });
    }

    #[test]
    fn test_parse_amount_steps() {
        let raw = r#"{"type": "mint_stable", "creator": "0xabc", "amount": 18446744073709551615}"#;
        assert_eq!(
            serde_json::from_str::<Step>(raw).unwrap(),
            Step::MintStable {
                creator: "0xabc".to_string(),
                amount: u64::MAX
            }
        );
    }

    #[test]
    fn test_unknown_step_rejected() {
        let raw = r#"{"type": "liquidate", "amount": 1}"#;
        assert!(serde_json::from_str::<Step>(raw).is_err());
    }
}
