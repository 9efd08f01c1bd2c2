//! Request and response messages of the stablecoin module.

use serde::{Deserialize, Serialize};

use matrix_common::types::{Address, COLL_DENOM, Coin, GOV_DENOM, STABLE_DENOM};
use matrix_common::{MatrixError, Result};

fn parse_creator(creator: &str) -> Result<Address> {
    creator.parse()
}

fn require_stable(coin: &Coin) -> Result<()> {
    if coin.denom != STABLE_DENOM {
        return Err(MatrixError::InvalidCoins(format!(
            "expected {STABLE_DENOM}, got {}",
            coin.denom
        )));
    }
    Ok(())
}

/// Burn `stable` and receive collateral plus governance asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurnStable {
    pub creator: String,
    pub stable: Coin,
}

impl MsgBurnStable {
    pub fn new(creator: impl Into<String>, amount: u128) -> Self {
        Self {
            creator: creator.into(),
            stable: Coin::new(STABLE_DENOM, amount),
        }
    }

    /// Stateless checks. Returns the parsed creator address.
    pub fn validate_basic(&self) -> Result<Address> {
        let creator = parse_creator(&self.creator)?;
        require_stable(&self.stable)?;
        Ok(creator)
    }
}

/// Both coins are always present, zero when nothing is paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurnStableResponse {
    pub collateral: Coin,
    pub gov: Coin,
}

impl MsgBurnStableResponse {
    pub fn new(collateral: u128, gov: u128) -> Self {
        Self {
            collateral: Coin::new(COLL_DENOM, collateral),
            gov: Coin::new(GOV_DENOM, gov),
        }
    }
}

/// Mint `stable` against collateral and governance asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMintStable {
    pub creator: String,
    pub stable: Coin,
}

impl MsgMintStable {
    pub fn new(creator: impl Into<String>, amount: u128) -> Self {
        Self {
            creator: creator.into(),
            stable: Coin::new(STABLE_DENOM, amount),
        }
    }

    pub fn validate_basic(&self) -> Result<Address> {
        let creator = parse_creator(&self.creator)?;
        require_stable(&self.stable)?;
        Ok(creator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMintStableResponse {
    pub stable: Coin,
    pub used_coll: Coin,
    pub used_gov: Coin,
}

impl MsgMintStableResponse {
    pub fn new(stable: u128, used_coll: u128, used_gov: u128) -> Self {
        Self {
            stable: Coin::new(STABLE_DENOM, stable),
            used_coll: Coin::new(COLL_DENOM, used_coll),
            used_gov: Coin::new(GOV_DENOM, used_gov),
        }
    }
}
