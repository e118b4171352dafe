pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use scenarios::{SCENARIOS, ScenarioCtx, get_scenario, list_scenarios};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
