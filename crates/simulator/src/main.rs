//! Matrix settlement simulator
//!
//! Replays a JSON scenario against an in-memory price feed, bank and burn
//! settlement engine, then prints the final balances as JSON.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin matrix-sim -- scenarios/burn.json
//!
//! # Per-step detail, JSON logs on stderr
//! RUST_LOG=matrix_sim=debug MATRIX_LOG_JSON=true cargo run --bin matrix-sim -- scenarios/burn.json
//! ```

use anyhow::Context;

use matrix_common::config::AppConfig;
use matrix_simulator::{Scenario, Simulation};

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "matrix_sim=info,matrix_simulator=info,matrix_stablecoin=info,matrix_pricefeed=debug"
                    .into()
            }),
        )
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    init_tracing(config.log_json);

    let path = std::env::args()
        .nth(1)
        .context("usage: matrix-sim <scenario.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    tracing::info!(scenario = %path, steps = scenario.steps.len(), "Matrix simulator starting");

    let mut sim = Simulation::from_genesis(&scenario.genesis, &config)
        .context("building genesis state")?;
    let report = sim.run(&scenario.steps);

    let state = sim.final_state(report);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
