//! Stablecoin settlement: burns stablecoin for collateral plus governance
//! asset, and the inverse mint, against an external [`Ledger`] and the oracle
//! price feed.

pub mod engine;
pub mod ledger;
pub mod msg;
pub mod ratio;
pub mod settlement;
pub mod transaction;

pub use engine::{BurnSettlementEngine, MODULE_NAME, RESERVE_ADDRESS};
pub use ledger::{Bank, Ledger};
pub use msg::{MsgBurnStable, MsgBurnStableResponse, MsgMintStable, MsgMintStableResponse};
pub use ratio::{
    CollateralRatioPolicy, FixedCollateralRatio, GovernedCollateralRatio, validate_ratio,
};
pub use settlement::{BurnBreakdown, MintRequirements, compute_burn, compute_mint};
pub use transaction::Transaction;
