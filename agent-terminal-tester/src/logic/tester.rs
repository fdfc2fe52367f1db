use agent_terminal_game::{Coordinate, TerminalConfig};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::common::scenario::{Scenario, ScenarioCtx};
use crate::logic::seeds::iteration_seed;
use crate::storage::TesterStorage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// Inputs shared by every scenario in a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: TerminalConfig,
    pub passcode: String,
    pub position: Coordinate,
    pub storage_path: Option<PathBuf>,
    pub verbose: bool,
}

pub struct LogicTester {
    settings: RunSettings,
}

impl LogicTester {
    pub const fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    pub async fn run_scenario(
        &self,
        scenario: &dyn Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.settings.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {})",
                    scenario.name().bright_white(),
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations).await);
        }

        results
    }

    fn context_for(&self, seed: u64) -> ScenarioCtx {
        ScenarioCtx {
            seed,
            config: self.settings.config.clone(),
            passcode: self.settings.passcode.clone(),
            position: self.settings.position,
            storage: TesterStorage::from_path(self.settings.storage_path.as_deref()),
            verbose: self.settings.verbose,
        }
    }

    async fn run_single_scenario(
        &self,
        scenario: &dyn Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let ctx = self.context_for(iteration_seed(seed, i));
            let start_time = Instant::now();

            match scenario.run(&ctx).await {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.settings.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?})",
                            i + 1,
                            iterations
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {}): {err:#}", i + 1, ctx.seed);
                    if self.settings.verbose {
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
            scenario_name: scenario.name().to_string(),
            seed,
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
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
