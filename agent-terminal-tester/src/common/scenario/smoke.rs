use agent_terminal_game::constants::{CIPHER_MESSAGE_COUNT, PASSCODE_LEN};
use agent_terminal_game::{GateOutcome, Redirect, Route};
use anyhow::{Result, ensure};
use rand::Rng;

use super::flows::{sign_in, type_passcode};
use super::{Scenario, ScenarioCtx};

pub struct SmokeScenario;

#[async_trait::async_trait(?Send)]
impl Scenario for SmokeScenario {
    fn name(&self) -> &'static str {
        "Smoke Test"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        ctx.config.validate()?;
        let terminal = ctx.fresh_terminal();

        ensure!(!terminal.directory().is_empty(), "profile directory is empty");
        ensure!(
            terminal.catalog().len() == CIPHER_MESSAGE_COUNT,
            "expected {CIPHER_MESSAGE_COUNT} cipher messages, found {}",
            terminal.catalog().len()
        );
        for profile in terminal.directory().iter() {
            ensure!(
                terminal.catalog().get(profile.cipher_message).is_some(),
                "profile {} has no cipher message",
                profile.name
            );
        }

        ensure!(terminal.landing() == Route::Login, "cold start skipped login");
        ensure!(
            terminal.cipher_puzzle().err() == Some(Redirect::NotAuthenticated),
            "cipher opened without sign-in"
        );
        ensure!(
            terminal.locator().err() == Some(Redirect::NotAuthenticated),
            "locator opened without sign-in"
        );

        if ctx.verbose {
            println!(
                "  📇 {} profiles, {} cipher messages",
                terminal.directory().len(),
                terminal.catalog().len()
            );
        }
        Ok(())
    }
}

pub struct PasscodeGateScenario;

impl PasscodeGateScenario {
    fn check_every_profile(ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        let profiles: Vec<_> = terminal.directory().iter().cloned().collect();
        for profile in profiles {
            let agent = sign_in(&mut terminal, &profile.passcode)?;
            ensure!(agent == profile.name, "{} greeted as {agent}", profile.passcode);
            ensure!(
                terminal.store().active_passcode() == Some(profile.passcode.as_str()),
                "active passcode not recorded for {}",
                profile.name
            );
            ensure!(!terminal.store().state().seen_intro, "intro marked seen on login");
            terminal.store_mut().logout();
        }
        Ok(())
    }

    fn check_rejections(ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        let mut rng = ctx.rng();

        let short: String = ctx.passcode.chars().take(PASSCODE_LEN - 1).collect();
        ensure!(
            type_passcode(&mut terminal, &short)? == GateOutcome::Incomplete,
            "short entry was submitted"
        );

        let mut rejected = 0;
        while rejected < 3 {
            let code = format!("{:05}", rng.gen_range(0..100_000_u32));
            if terminal.directory().is_valid(&code) {
                continue;
            }
            let mut gate = terminal.access_gate();
            for key in code.chars() {
                gate.press_digit(key)?;
            }
            let outcome = terminal.submit_passcode(&mut gate);
            ensure!(outcome == GateOutcome::Denied, "{code} gave {outcome:?}");
            ensure!(
                terminal.submit_passcode(&mut gate) == GateOutcome::Cooldown,
                "resubmitted during the error banner"
            );
            let error_ms = terminal.config().passcode_error_ms;
            gate.advance(error_ms.saturating_sub(1));
            ensure!(gate.shows_error(), "error cleared early");
            gate.advance(1);
            ensure!(
                gate.entry().is_empty() && !gate.shows_error(),
                "entry not cleared after {error_ms} ms"
            );
            ensure!(!terminal.store().is_authenticated(), "{code} signed in");
            rejected += 1;
        }
        Ok(())
    }
}

#[async_trait::async_trait(?Send)]
impl Scenario for PasscodeGateScenario {
    fn name(&self) -> &'static str {
        "Passcode Gate"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        Self::check_every_profile(ctx)?;
        Self::check_rejections(ctx)
    }
}
