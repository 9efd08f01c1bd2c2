//! In-memory state machine that replays a [`Scenario`].
//!
//! The simulation owns the block clock. Every step runs at the current
//! `now`; only `advance_time` moves it. A rejected step leaves the state as
//! it was and the run continues with the next one.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use matrix_common::config::AppConfig;
use matrix_common::types::{Address, COLL_DENOM, Coin, GOV_DENOM, STABLE_DENOM};
use matrix_common::{MatrixError, Result};
use matrix_pricefeed::{Market, Params, PriceSubmissionStore};
use matrix_stablecoin::{
    Bank, BurnSettlementEngine, CollateralRatioPolicy, GovernedCollateralRatio, Ledger,
    MsgBurnStable, MsgBurnStableResponse, MsgMintStable, MsgMintStableResponse, RESERVE_ADDRESS,
};

use crate::scenario::{Genesis, Step};

/// Result of one accepted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepOutcome {
    PricePosted {
        market_id: String,
        oracle: Address,
        price: Decimal,
        expiry: DateTime<Utc>,
    },
    Burned(MsgBurnStableResponse),
    Minted(MsgMintStableResponse),
    RatioSet { ratio: Decimal },
    TimeAdvanced { now: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub applied: usize,
    pub rejected: usize,
    pub steps: Vec<StepRecord>,
}

/// Printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalState {
    pub time: DateTime<Utc>,
    pub collateral_ratio: Decimal,
    pub balances: BTreeMap<Address, Vec<Coin>>,
    pub supply: Vec<Coin>,
    /// Market configuration at the end of the run.
    pub markets: Vec<Market>,
    pub report: RunReport,
}

#[derive(Debug)]
pub struct Simulation {
    now: DateTime<Utc>,
    price_ttl: Duration,
    prices: PriceSubmissionStore,
    bank: Bank,
    engine: BurnSettlementEngine<GovernedCollateralRatio>,
}

impl Simulation {
    /// Build the initial state. Oracles listed in `config` are authorized on
    /// every genesis market.
    pub fn from_genesis(genesis: &Genesis, config: &AppConfig) -> Result<Self> {
        let mut markets = genesis.markets.clone();
        for market in &mut markets {
            for oracle in &config.oracles {
                if !market.is_authorized(oracle) {
                    market.oracles.push(*oracle);
                }
            }
        }
        let prices = PriceSubmissionStore::new(Params::new(markets))?;

        let mut bank = Bank::new();
        for account in &genesis.balances {
            bank.fund_account(&account.address, &account.coins)?;
        }
        bank.fund_account(&RESERVE_ADDRESS, &genesis.reserve)?;

        let ratio = genesis.collateral_ratio.unwrap_or(config.collateral_ratio);
        let engine = BurnSettlementEngine::new(GovernedCollateralRatio::new(ratio)?);

        let price_ttl = i64::try_from(config.price_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                MatrixError::Config(format!("price TTL {}s is out of range", config.price_ttl_secs))
            })?;

        tracing::info!(
            start = %genesis.start_time,
            markets = genesis.markets.len(),
            accounts = genesis.balances.len(),
            ratio = %ratio,
            "Simulation initialized"
        );

        Ok(Self {
            now: genesis.start_time,
            price_ttl,
            prices,
            bank,
            engine,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn prices(&self) -> &PriceSubmissionStore {
        &self.prices
    }

    /// Execute one step at the current time.
    pub fn apply(&mut self, step: &Step) -> Result<StepOutcome> {
        match step {
            Step::PostPrice {
                oracle,
                market_id,
                price,
                expiry,
            } => {
                let expiry = match expiry {
                    Some(expiry) => *expiry,
                    None => self.now.checked_add_signed(self.price_ttl).ok_or_else(|| {
                        MatrixError::Config(format!(
                            "price TTL of {}s overflows the clock at {}",
                            self.price_ttl.num_seconds(),
                            self.now
                        ))
                    })?,
                };
                let stored = self
                    .prices
                    .submit(market_id, *oracle, *price, expiry, self.now)?;
                Ok(StepOutcome::PricePosted {
                    market_id: stored.market_id.clone(),
                    oracle: stored.oracle,
                    price: stored.price,
                    expiry: stored.expiry,
                })
            }
            Step::BurnStable { creator, amount } => {
                let msg = MsgBurnStable::new(creator.clone(), u128::from(*amount));
                self.engine
                    .burn_stable(&mut self.bank, &self.prices, &msg, self.now)
                    .map(StepOutcome::Burned)
            }
            Step::MintStable { creator, amount } => {
                let msg = MsgMintStable::new(creator.clone(), u128::from(*amount));
                self.engine
                    .mint_stable(&mut self.bank, &self.prices, &msg, self.now)
                    .map(StepOutcome::Minted)
            }
            Step::SetRatio { ratio } => {
                self.engine.ratio_policy_mut().set_ratio(*ratio)?;
                Ok(StepOutcome::RatioSet { ratio: *ratio })
            }
            Step::AdvanceTime { secs } => {
                self.now = self
                    .now
                    .checked_add_signed(Duration::seconds(i64::from(*secs)))
                    .ok_or(MatrixError::ArithmeticOverflow("block time"))?;
                Ok(StepOutcome::TimeAdvanced { now: self.now })
            }
        }
    }

    /// Execute every step in order, recording rejections instead of stopping.
    pub fn run(&mut self, steps: &[Step]) -> RunReport {
        let mut report = RunReport::default();

        for (index, step) in steps.iter().enumerate() {
            let kind = step.kind();
            match self.apply(step) {
                Ok(outcome) => {
                    tracing::debug!(index, step = kind, "Step applied");
                    report.applied += 1;
                    report.steps.push(StepRecord {
                        index,
                        kind,
                        outcome: Some(outcome),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(index, step = kind, error = %e, "Step rejected");
                    report.rejected += 1;
                    report.steps.push(StepRecord {
                        index,
                        kind,
                        outcome: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            applied = report.applied,
            rejected = report.rejected,
            "Scenario finished"
        );
        report
    }

    pub fn final_state(&self, report: RunReport) -> FinalState {
        let balances = self
            .bank
            .accounts()
            .into_iter()
            .map(|account| {
                let coins = self.bank.balances(&account);
                (account, coins)
            })
            .collect();

        let supply = [STABLE_DENOM, COLL_DENOM, GOV_DENOM]
            .into_iter()
            .map(|denom| Coin::new(denom, self.bank.supply(denom)))
            .collect();

        FinalState {
            time: self.now,
            collateral_ratio: self.engine.ratio_policy().current_ratio(),
            balances,
            supply,
            markets: self.prices.params().markets,
            report,
        }
    }
}
