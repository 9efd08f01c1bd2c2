use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MatrixError;

/// Stablecoin denom, smallest unit.
pub const STABLE_DENOM: &str = "uusdm";
/// Collateral asset denom, smallest unit.
pub const COLL_DENOM: &str = "uust";
/// Governance asset denom, smallest unit.
pub const GOV_DENOM: &str = "umtrx";

/// Market quoting one governance unit in collateral units.
pub const GOV_PRICE_POOL: &str = "umtrx:uust";
/// Market quoting one collateral unit in stablecoin units.
pub const COLL_PRICE_POOL: &str = "uust:uusdm";

/// A 20-byte account address, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic address for a protocol module account.
    ///
    /// The name is left-aligned and zero-padded; names longer than 19 bytes
    /// are cut. The final byte is fixed to `0xff` so module accounts never
    /// collide with a zero-padded user key.
    pub const fn module(name: &str) -> Self {
        let src = name.as_bytes();
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < src.len() && i < Self::LEN - 1 {
            bytes[i] = src[i];
            i += 1;
        }
        bytes[Self::LEN - 1] = 0xff;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| MatrixError::InvalidAddress(format!("{s}: missing 0x prefix")))?;

        if hex_part.len() != Self::LEN * 2 {
            return Err(MatrixError::InvalidAddress(format!(
                "{s}: expected {} hex characters, got {}",
                Self::LEN * 2,
                hex_part.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|e| MatrixError::InvalidAddress(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An amount of a single denom, in its smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
