use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{MatrixError, Result};
use crate::types::Address;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Target collateral ratio in [0, 1] (default: 0.9)
    pub collateral_ratio: Decimal,

    /// Lifetime given to price posts that carry no explicit expiry (default: 3600)
    pub price_ttl_secs: u64,

    /// Oracle sources authorized on every genesis market, in addition to
    /// the ones the scenario lists
    pub oracles: Vec<Address>,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let collateral_ratio: Decimal = parse_or(&lookup, "MATRIX_COLLATERAL_RATIO", "0.9")?;
        if collateral_ratio < Decimal::ZERO || collateral_ratio > Decimal::ONE {
            return Err(MatrixError::Config(format!(
                "MATRIX_COLLATERAL_RATIO must be within [0, 1], got {collateral_ratio}"
            )));
        }

        let oracles = match lookup("MATRIX_ORACLES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<Address>()
                        .map_err(|e| MatrixError::Config(format!("MATRIX_ORACLES: {e}")))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            collateral_ratio,
            price_ttl_secs: parse_or(&lookup, "MATRIX_PRICE_TTL_SECS", "3600")?,
            oracles,
            log_json: parse_or(&lookup, "MATRIX_LOG_JSON", "false")?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| MatrixError::Config(format!("{key} has an invalid value: {raw:?}")))
}
