//! Oracle price feed: market parameters, raw submissions, and the median
//! aggregator that derives a market's current price.

pub mod aggregator;
pub mod params;
pub mod store;

pub use aggregator::{CurrentPrice, PriceAggregator};
pub use params::{Market, Params};
pub use store::{PriceSubmission, PriceSubmissionStore};
