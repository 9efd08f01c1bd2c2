//! Scenario replay harness for the settlement core.

pub mod scenario;
pub mod sim;

pub use scenario::{Genesis, GenesisAccount, Scenario, Step};
pub use sim::{FinalState, RunReport, Simulation, StepOutcome, StepRecord};
