use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{ScenarioCtx, TestScenario};
use super::seeds::SeedInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: i64,
    pub seed_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester<'a> {
    ctx: ScenarioCtx<'a>,
}

impl<'a> LogicTester<'a> {
    pub const fn new(ctx: ScenarioCtx<'a>) -> Self {
        Self { ctx }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds {
            if self.ctx.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {})",
                    scenario.name.bright_white(),
                    seed.label()
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            // Iteration 0 runs the requested seed itself.
            let iteration_seed = seed
                .seed
                .wrapping_add(i64::try_from(i).unwrap_or(i64::MAX));

            match (scenario.check)(&self.ctx, iteration_seed) {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.ctx.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) seed:{iteration_seed}",
                            i + 1,
                            iterations
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    log::debug!("{} failed: {message}", scenario.key);
                    if self.ctx.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed: seed.seed,
            seed_name: seed.name.clone(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;
    use crate::logic::seeds::SeedSource;
    use anyhow::bail;
    use resident_game::DialogueRegistry;

    fn fails_on_even(_ctx: &ScenarioCtx<'_>, seed: i64) -> anyhow::Result<()> {
        if seed % 2 == 0 {
            bail!("even seed");
        }
        Ok(())
    }

    #[test]
    fn iterations_offset_the_seed() {
        let registry = DialogueRegistry::builtin();
        let tester = LogicTester::new(ScenarioCtx {
            registry: &registry,
            verbose: false,
        });
        let scenario = TestScenario {
            key: "odd-only",
            name: "Odd Only",
            description: "fails on even seeds",
            check: fails_on_even,
        };
        let results = tester.run_scenario(&scenario, &[SeedInfo::new(1, SeedSource::Numeric)], 4);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 2);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("seed 2"));
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let registry = DialogueRegistry::builtin();
        let tester = LogicTester::new(ScenarioCtx {
            registry: &registry,
            verbose: false,
        });
        let scenario = get_scenario("seed-names").unwrap();
        let results =
            tester.run_scenario(&scenario, &[SeedInfo::new(12345, SeedSource::Numeric)], 2);
        assert!(results[0].passed);
        let json = serde_json::to_value(&results[0]).unwrap();
        assert!(json["average_duration"].is_u64());
        assert_eq!(json["performance_data"].as_array().unwrap().len(), 2);
        assert_eq!(json["seed_name"], "Isotope-Compton");
    }
}
