//! Replays the bundled scenario file end to end.

use rust_decimal_macros::dec;

use matrix_common::config::AppConfig;
use matrix_common::types::{Address, COLL_DENOM, Coin, GOV_DENOM, STABLE_DENOM};
use matrix_simulator::{Scenario, Simulation, StepOutcome};
use matrix_stablecoin::{MsgBurnStableResponse, MsgMintStableResponse, RESERVE_ADDRESS};

const BURN_SCENARIO: &str = include_str!("../../../scenarios/burn.json");

fn config() -> AppConfig {
    AppConfig::from_lookup(|_| None).unwrap()
}

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

#[test]
fn test_burn_scenario() {
    let scenario: Scenario = serde_json::from_str(BURN_SCENARIO).unwrap();
    let mut sim = Simulation::from_genesis(&scenario.genesis, &config()).unwrap();
    let report = sim.run(&scenario.steps);

    assert_eq!(report.applied, 7);
    assert_eq!(report.rejected, 3);

    let outcome = |i: usize| report.steps[i].outcome.clone();
    let error = |i: usize| report.steps[i].error.clone().unwrap_or_default();

    assert_eq!(
        outcome(2),
        Some(StepOutcome::Burned(MsgBurnStableResponse::new(9_000_000, 100_000)))
    );
    assert_eq!(
        outcome(3),
        Some(StepOutcome::Burned(MsgBurnStableResponse::new(0, 0)))
    );
    assert!(error(4).contains("insufficient funds"));
    assert!(error(5).contains("invalid address"));
    assert_eq!(
        outcome(6),
        Some(StepOutcome::Minted(MsgMintStableResponse::new(1_000_000, 900_000, 10_000)))
    );
    assert!(error(9).contains("no live price"));

    let state = sim.final_state(report);
    assert_eq!(state.collateral_ratio, dec!(0.5));

    let alice = addr("0x00000000000000000000000000000000000a11ce");
    let bob = addr("0x0000000000000000000000000000000000000b0b");
    assert_eq!(
        state.balances[&alice],
        vec![
            Coin::new(GOV_DENOM, 90_000),
            Coin::new(STABLE_DENOM, 991_000_000),
            Coin::new(COLL_DENOM, 8_100_000),
        ]
    );
    assert_eq!(state.balances[&bob], vec![Coin::new(STABLE_DENOM, 10)]);
    assert_eq!(
        state.balances[&RESERVE_ADDRESS],
        vec![Coin::new(COLL_DENOM, 91_900_000)]
    );
    assert_eq!(
        state.supply,
        vec![
            Coin::new(STABLE_DENOM, 991_000_010),
            Coin::new(COLL_DENOM, 100_000_000),
            Coin::new(GOV_DENOM, 90_000),
        ]
    );
}

#[test]
fn test_final_state_serializes() {
    let scenario: Scenario = serde_json::from_str(BURN_SCENARIO).unwrap();
    let mut sim = Simulation::from_genesis(&scenario.genesis, &config()).unwrap();
    let report = sim.run(&scenario.steps);

    let json = serde_json::to_value(sim.final_state(report)).unwrap();
    assert_eq!(json["report"]["applied"], 7);
    assert_eq!(json["report"]["steps"][2]["outcome"]["type"], "burned");
    assert!(json["balances"]["0x0000000000000000000000000000000000000b0b"].is_array());
}
