use agent_terminal_game::{Coordinate, TerminalConfig, seeded_rng};
use anyhow::Result;
use rand_chacha::ChaCha20Rng;

use crate::storage::TesterStorage;

pub mod flows;
pub mod locator;
pub mod puzzles;
pub mod smoke;

pub use flows::ScenarioTerminal;

/// Everything one scenario iteration runs against.
#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub config: TerminalConfig,
    pub passcode: String,
    pub position: Coordinate,
    pub storage: TesterStorage,
    pub verbose: bool,
}

impl ScenarioCtx {
    pub fn rng(&self) -> ChaCha20Rng {
        seeded_rng(self.seed)
    }

    /// A terminal on this iteration's storage with any earlier progress wiped.
    pub fn fresh_terminal(&self) -> ScenarioTerminal {
        let mut terminal = self.reopen_terminal();
        terminal.store_mut().reset();
        terminal
    }

    /// A terminal that picks up whatever the storage already holds.
    pub fn reopen_terminal(&self) -> ScenarioTerminal {
        ScenarioTerminal::with_config(self.storage.clone(), self.config.clone())
    }
}

#[async_trait::async_trait(?Send)]
pub trait Scenario {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()>;
}

pub fn get_scenario(name: &str) -> Option<Box<dyn Scenario>> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(Box::new(smoke::SmokeScenario)),
        "passcode-gate" | "gate" => Some(Box::new(smoke::PasscodeGateScenario)),
        "cipher-solve" | "cipher" => Some(Box::new(puzzles::CipherScenario)),
        "lights-solve" | "lights" => Some(Box::new(puzzles::LightsScenario)),
        "codebreaker-solve" | "codebreaker" => Some(Box::new(puzzles::CodebreakerScenario)),
        "codebreaker-exhaustion" | "exhaustion" => {
            Some(Box::new(puzzles::CodebreakerExhaustionScenario))
        }
        "locator" => Some(Box::new(locator::LocatorScenario)),
        "full-run" | "full" => Some(Box::new(locator::FullRunScenario)),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("passcode-gate", "Passcode Gate"),
        ("cipher-solve", "Cipher Solve"),
        ("lights-solve", "Lights Solve"),
        ("codebreaker-solve", "Codebreaker Solve"),
        ("codebreaker-exhaustion", "Codebreaker Exhaustion"),
        ("locator", "Locator"),
        ("full-run", "Full Run"),
    ]
}
