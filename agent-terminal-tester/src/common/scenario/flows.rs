//! Player actions shared by several scenarios.
use agent_terminal_game::constants::{GRID_SIZE, INTRO_COMPLETE_PCT};
use agent_terminal_game::{
    ChallengeId, GateOutcome, GuessOutcome, LocationProvider, LocatorReport, LocatorState,
    Navigation, Terminal, TerminalConfig, ToggleOutcome, Verdict,
};
use anyhow::{Context, Result, bail, ensure};
use rand::Rng;

use crate::logic::solvers::{CodeSolver, fill_cipher, lights_plan};
use crate::storage::TesterStorage;

pub type ScenarioTerminal = Terminal<TesterStorage>;

/// Total intro time under `config`, settle included.
pub fn intro_duration_ms(config: &TerminalConfig) -> u64 {
    let ticks = INTRO_COMPLETE_PCT.div_ceil(config.intro_increment_pct.max(1));
    u64::from(ticks) * config.intro_step_ms + config.intro_settle_ms
}

pub fn type_passcode(terminal: &mut ScenarioTerminal, passcode: &str) -> Result<GateOutcome> {
    let mut gate = terminal.access_gate();
    for key in passcode.chars() {
        gate.press_digit(key)?;
    }
    Ok(terminal.submit_passcode(&mut gate))
}

/// Sign in and return the agent name the gate greeted us with.
pub fn sign_in(terminal: &mut ScenarioTerminal, passcode: &str) -> Result<String> {
    match type_passcode(terminal, passcode)? {
        GateOutcome::Granted {
            agent_name,
            navigation,
        } => {
            ensure!(
                navigation == Navigation::Hub,
                "granted access should open the hub, got {navigation:?}"
            );
            Ok(agent_name)
        }
        other => bail!("passcode {passcode} was not accepted: {other:?}"),
    }
}

/// Open the hub and let the intro run to the end.
pub fn watch_intro<R: Rng + ?Sized>(terminal: &mut ScenarioTerminal, rng: &mut R) -> Result<()> {
    let mut hub = terminal.hub(rng)?;
    let duration = intro_duration_ms(terminal.config());
    hub.advance(duration, terminal.store_mut());
    ensure!(!hub.is_loading(), "intro still running after {duration} ms");
    ensure!(
        terminal.store().state().seen_intro,
        "finished intro was not recorded"
    );
    Ok(())
}

pub fn solve_cipher(terminal: &mut ScenarioTerminal) -> Result<()> {
    let message = {
        let profile = terminal.store().active_profile(terminal.directory());
        terminal.catalog().for_profile(profile).clone()
    };
    let mut puzzle = terminal.cipher_puzzle()?;
    fill_cipher(&mut puzzle, &message)?;
    let verdict = puzzle.submit(terminal.store_mut());
    ensure!(
        verdict == Verdict::Solved,
        "decode {:?} was judged {verdict:?}",
        puzzle.decode()
    );
    let navigation = puzzle.advance(terminal.config().cipher_success_ms);
    ensure!(
        navigation == Some(Navigation::Back),
        "cipher success did not navigate back"
    );
    ensure!(
        terminal.store().is_complete(ChallengeId::Cipher),
        "cipher not marked complete"
    );
    Ok(())
}

/// Scramble the board with a few random presses, then solve it.
pub fn solve_lights<R: Rng + ?Sized>(terminal: &mut ScenarioTerminal, rng: &mut R) -> Result<u32> {
    let mut puzzle = terminal.lights_puzzle()?;
    let mut last = ToggleOutcome::Toggled;
    for _ in 0..rng.gen_range(1..=6) {
        let (row, col) = (rng.gen_range(0..GRID_SIZE), rng.gen_range(0..GRID_SIZE));
        last = puzzle.toggle(row, col, terminal.store_mut())?;
        if last == ToggleOutcome::Won {
            break;
        }
    }
    if last != ToggleOutcome::Won {
        for (row, col) in lights_plan(puzzle.grid())? {
            last = puzzle.toggle(row, col, terminal.store_mut())?;
        }
    }
    ensure!(last == ToggleOutcome::Won, "board ended at {:?}", puzzle.grid());
    ensure!(
        puzzle.toggle(0, 0, terminal.store_mut())? == ToggleOutcome::Locked,
        "solved board still accepts presses"
    );
    let navigation = puzzle.advance(terminal.config().lights_success_ms);
    ensure!(
        navigation == Some(Navigation::Back),
        "lights win did not navigate back"
    );
    ensure!(
        terminal.store().is_complete(ChallengeId::Lights),
        "lights not marked complete"
    );
    Ok(puzzle.moves())
}

/// Crack a freshly drawn code. Returns the number of guesses used.
pub fn solve_codebreaker<R: Rng + ?Sized>(
    terminal: &mut ScenarioTerminal,
    rng: &mut R,
) -> Result<usize> {
    let mut game = terminal.codebreaker(rng)?;
    let mut solver = CodeSolver::new();
    loop {
        let guess = solver
            .next_guess()
            .context("solver ran out of candidates")?;
        for &digit in guess.digits() {
            game.add_digit(digit)?;
        }
        match game.submit(terminal.store_mut()) {
            GuessOutcome::Cracked(_) => break,
            GuessOutcome::Miss(feedback) => solver.record(&guess, feedback),
            GuessOutcome::Exhausted { secret, .. } => {
                bail!("code {secret} not cracked within the attempt limit")
            }
            other => bail!("unexpected outcome {other:?} for guess {guess}"),
        }
    }
    let navigation = game.advance(terminal.config().codebreaker_success_ms);
    ensure!(
        navigation == Some(Navigation::Back),
        "codebreaker win did not navigate back"
    );
    ensure!(
        terminal.store().is_complete(ChallengeId::Codebreaker),
        "codebreaker not marked complete"
    );
    Ok(game.history().len())
}

pub async fn locate<P>(terminal: &ScenarioTerminal, device: &P) -> Result<LocatorReport>
where
    P: LocationProvider + Sync,
{
    let mut locator = terminal.locator()?;
    match locator.locate(device).await {
        LocatorState::Located(report) => Ok(report.clone()),
        LocatorState::Failed(err) => bail!("location request failed: {err}"),
        other => bail!("locator stuck in {other:?}"),
    }
}
