use thiserror::Error;

/// Every way a state transition can be rejected.
///
/// None of these are fatal: a failed transition leaves no staged mutation
/// behind, so the request is equivalent to one that never happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("invalid market: {0}")]
    InvalidMarket(String),

    #[error("invalid oracle {oracle} for market {market}")]
    InvalidSource { market: String, oracle: String },

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid expiry: {expiry} is not after {now}")]
    InvalidExpiry { expiry: String, now: String },

    #[error("no live price for market {0}")]
    NoLivePrice(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    #[error("insufficient funds: {account} has {available}{denom}, needs {required}{denom}")]
    InsufficientFunds {
        account: String,
        denom: String,
        available: u128,
        required: u128,
    },

    #[error("insufficient reserve: pool has {available}{denom}, needs {required}{denom}")]
    InsufficientReserve {
        denom: String,
        available: u128,
        required: u128,
    },

    #[error("invalid collateral ratio: {0}")]
    InvalidRatio(String),

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MatrixError>;
