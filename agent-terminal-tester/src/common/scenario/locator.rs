use agent_terminal_game::{
    ChallengeId, CompassPoint, LocationError, LocationOptions, Locator, LocatorState, Redirect,
    distance_km, format_distance,
};
use anyhow::{Result, bail, ensure};
use std::time::Duration;

use super::flows::{locate, sign_in, solve_cipher, solve_codebreaker, solve_lights, watch_intro};
use super::{Scenario, ScenarioCtx};
use crate::location::{DeviceBehaviour, SimulatedDevice};

const SHORT_TIMEOUT_MS: u64 = 25;

pub struct LocatorScenario;

impl LocatorScenario {
    async fn check_failures(ctx: &ScenarioCtx, terminal: &super::ScenarioTerminal) -> Result<()> {
        let mut locator = terminal.locator()?;
        let denied = SimulatedDevice::new(DeviceBehaviour::Fail(LocationError::PermissionDenied));
        ensure!(
            locator.locate(&denied).await == &LocatorState::Failed(LocationError::PermissionDenied),
            "permission denial not surfaced"
        );
        ensure!(
            locator.action_label() == Some("Retry Location Request"),
            "denied locator should offer a retry"
        );

        let mut impatient = ctx.config.clone();
        impatient.location = LocationOptions {
            timeout_ms: SHORT_TIMEOUT_MS,
            ..impatient.location
        };
        let mut hurried = Locator::open(terminal.store(), &impatient)?;
        let slow = SimulatedDevice::new(DeviceBehaviour::Slow(
            ctx.position,
            Duration::from_millis(SHORT_TIMEOUT_MS * 20),
        ));
        ensure!(
            hurried.locate(&slow).await == &LocatorState::Failed(LocationError::Timeout),
            "slow device did not time out"
        );
        ensure!(
            hurried.action_label() == Some("Try Again"),
            "timed-out locator should offer another try"
        );

        let device = SimulatedDevice::at(ctx.position);
        match hurried.retry(&device).await {
            LocatorState::Located(_) => Ok(()),
            other => bail!("retry ended in {other:?}"),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Scenario for LocatorScenario {
    fn name(&self) -> &'static str {
        "Locator"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        sign_in(&mut terminal, &ctx.passcode)?;
        terminal.store_mut().complete(ChallengeId::Cipher);
        terminal.store_mut().complete(ChallengeId::Lights);
        ensure!(
            terminal.locator().err() == Some(Redirect::ChallengesIncomplete { completed: 2 }),
            "locator opened with a challenge left"
        );
        terminal.store_mut().complete(ChallengeId::Codebreaker);

        Self::check_failures(ctx, &terminal).await?;

        let report = locate(&terminal, &SimulatedDevice::at(ctx.position)).await?;
        let expected = distance_km(ctx.position, ctx.config.target);
        ensure!(
            (report.distance_km - expected).abs() < 1e-9,
            "distance {} km, expected {expected} km",
            report.distance_km
        );
        ensure!(
            report.distance_label == format_distance(expected),
            "distance shown as {}",
            report.distance_label
        );
        ensure!(
            report.direction == CompassPoint::from_bearing(report.bearing_deg),
            "{} does not match bearing {}",
            report.direction,
            report.bearing_deg
        );
        ensure!(
            (0.0..360.0).contains(&report.bearing_deg),
            "bearing {} out of range",
            report.bearing_deg
        );

        if ctx.verbose {
            println!(
                "  🧭 {} away, heading {} ({:.1}°)",
                report.distance_label, report.direction, report.bearing_deg
            );
        }
        Ok(())
    }
}

pub struct FullRunScenario;

#[async_trait::async_trait(?Send)]
impl Scenario for FullRunScenario {
    fn name(&self) -> &'static str {
        "Full Run"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut rng = ctx.rng();
        let mut terminal = ctx.fresh_terminal();
        let agent = sign_in(&mut terminal, &ctx.passcode)?;
        watch_intro(&mut terminal, &mut rng)?;

        solve_cipher(&mut terminal)?;
        solve_lights(&mut terminal, &mut rng)?;
        let guesses = solve_codebreaker(&mut terminal, &mut rng)?;

        let reopened = ctx.reopen_terminal();
        ensure!(
            reopened.store().state() == terminal.store().state(),
            "progress changed across a restart"
        );
        ensure!(
            reopened.store().all_challenges_complete(),
            "completion flags lost on restart"
        );

        let hub = reopened.hub(&mut rng)?;
        ensure!(hub.intro().is_none(), "intro replayed after it was seen");
        ensure!(hub.agent_name() == agent, "hub greets {}", hub.agent_name());
        ensure!(
            hub.locator_unlocked(reopened.store()),
            "locator entry still locked"
        );

        let report = locate(&reopened, &SimulatedDevice::at(ctx.position)).await?;
        if ctx.verbose {
            println!(
                "  🏁 {agent} ({}) finished in {guesses} code guesses, target {} {}",
                hub.agent_id(),
                report.distance_label,
                report.direction
            );
        }
        Ok(())
    }
}
