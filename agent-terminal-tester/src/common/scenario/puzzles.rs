use agent_terminal_game::constants::MAX_ATTEMPTS;
use agent_terminal_game::{
    Banner, ChallengeId, CipherError, Code, Codebreaker, GameStatus, GuessOutcome, Verdict,
};
use anyhow::{Result, bail, ensure};

use super::flows::{sign_in, solve_cipher, solve_codebreaker, solve_lights};
use super::{Scenario, ScenarioCtx};

pub struct CipherScenario;

#[async_trait::async_trait(?Send)]
impl Scenario for CipherScenario {
    fn name(&self) -> &'static str {
        "Cipher Solve"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        sign_in(&mut terminal, &ctx.passcode)?;

        // A blank decode is rejected and the error banner blocks edits.
        let mut puzzle = terminal.cipher_puzzle()?;
        let verdict = puzzle.submit(terminal.store_mut());
        ensure!(verdict == Verdict::Incorrect, "blank decode judged {verdict:?}");
        let first = puzzle.letters().first().copied().unwrap_or('A');
        ensure!(
            puzzle.select(first) == Err(CipherError::Busy),
            "edits accepted under the error banner"
        );
        puzzle.advance(terminal.config().cipher_error_ms);
        ensure!(puzzle.banner() == Banner::Idle, "error banner never cleared");
        ensure!(
            !terminal.store().is_complete(ChallengeId::Cipher),
            "wrong decode completed the challenge"
        );

        solve_cipher(&mut terminal)?;
        if ctx.verbose {
            println!("  🔐 cipher solved for agent {}", ctx.passcode);
        }
        Ok(())
    }
}

pub struct LightsScenario;

#[async_trait::async_trait(?Send)]
impl Scenario for LightsScenario {
    fn name(&self) -> &'static str {
        "Lights Solve"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        sign_in(&mut terminal, &ctx.passcode)?;
        let moves = solve_lights(&mut terminal, &mut ctx.rng())?;
        if ctx.verbose {
            println!("  💡 grid lit in {moves} moves");
        }
        Ok(())
    }
}

pub struct CodebreakerScenario;

#[async_trait::async_trait(?Send)]
impl Scenario for CodebreakerScenario {
    fn name(&self) -> &'static str {
        "Codebreaker Solve"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        sign_in(&mut terminal, &ctx.passcode)?;
        let guesses = solve_codebreaker(&mut terminal, &mut ctx.rng())?;
        ensure!(guesses <= MAX_ATTEMPTS, "took {guesses} guesses");
        if ctx.verbose {
            println!("  🔢 code cracked in {guesses} guesses");
        }
        Ok(())
    }
}

pub struct CodebreakerExhaustionScenario;

#[async_trait::async_trait(?Send)]
impl Scenario for CodebreakerExhaustionScenario {
    fn name(&self) -> &'static str {
        "Codebreaker Exhaustion"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let mut terminal = ctx.fresh_terminal();
        sign_in(&mut terminal, &ctx.passcode)?;
        let mut rng = ctx.rng();
        let secret = Code::random(&mut rng);
        let mut game = Codebreaker::with_secret(terminal.config(), secret);

        let misses: Vec<Code> = (0..10_000)
            .filter_map(Code::from_index)
            .filter(|code| *code != secret)
            .take(MAX_ATTEMPTS)
            .collect();
        for (n, guess) in misses.iter().enumerate() {
            let outcome = game.guess(guess, terminal.store_mut());
            let last = n + 1 == MAX_ATTEMPTS;
            match outcome {
                GuessOutcome::Miss(_) if !last => {}
                GuessOutcome::Exhausted { secret: shown, .. } if last => {
                    ensure!(shown == secret, "revealed {shown}, expected {secret}");
                }
                other => bail!("guess {} of {MAX_ATTEMPTS} gave {other:?}", n + 1),
            }
        }

        let status = game.status();
        ensure!(status == GameStatus::Lost { secret }, "status after loss: {status:?}");
        ensure!(game.attempts_left() == 0, "attempts left after loss");
        ensure!(
            game.guess(&secret, terminal.store_mut()) == GuessOutcome::Finished,
            "lost game accepted another guess"
        );
        ensure!(!game.add_digit(1)?, "lost game accepted a digit");
        ensure!(
            !terminal.store().is_complete(ChallengeId::Codebreaker),
            "loss marked the challenge complete"
        );

        game.new_game(&mut rng);
        ensure!(game.status() == GameStatus::Playing, "new game not playable");
        ensure!(
            game.attempts_left() == MAX_ATTEMPTS && game.history().is_empty(),
            "new game kept the old history"
        );
        Ok(())
    }
}
