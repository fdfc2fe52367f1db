//! Four-digit code-breaker (challenge 3).
//!
//! Feedback follows the usual Mastermind rules: exact matches are counted
//! first and removed from play, then each remaining guess digit may claim
//! one unclaimed occurrence of the same digit in the secret.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ProgressStorage;
use crate::config::TerminalConfig;
use crate::constants::{CODE_DIGIT_MAX, CODE_LEN, MAX_ATTEMPTS};
use crate::progress::ProgressStore;
use crate::routes::{ChallengeId, Navigation};
use crate::schedule::Schedule;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodebreakerError {
    #[error("digit {0} is outside 0-{CODE_DIGIT_MAX}")]
    InvalidDigit(u8),
    #[error("code {0:?} must be exactly {CODE_LEN} digits")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Code([u8; CODE_LEN]);

impl Code {
    /// # Errors
    ///
    /// Returns [`CodebreakerError::InvalidDigit`] if any digit exceeds 9.
    pub fn new(digits: [u8; CODE_LEN]) -> Result<Self, CodebreakerError> {
        if let Some(&bad) = digits.iter().find(|&&d| d > CODE_DIGIT_MAX) {
            return Err(CodebreakerError::InvalidDigit(bad));
        }
        Ok(Self(digits))
    }

    /// Four independent, uniform draws from 0-9. Repeats are allowed.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut digits = [0; CODE_LEN];
        for digit in &mut digits {
            *digit = rng.gen_range(0..=CODE_DIGIT_MAX);
        }
        Self(digits)
    }

    /// The code whose digits spell `n` in base ten, zero-padded.
    #[must_use]
    pub fn from_index(n: u16) -> Option<Self> {
        if n >= 10_u16.pow(CODE_LEN as u32) {
            return None;
        }
        let mut digits = [0; CODE_LEN];
        let mut rest = n;
        for digit in digits.iter_mut().rev() {
            *digit = u8::try_from(rest % 10).ok()?;
            rest /= 10;
        }
        Some(Self(digits))
    }

    #[must_use]
    pub const fn digits(&self) -> &[u8; CODE_LEN] {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in self.0 {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = CodebreakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits: Vec<u8> = trimmed
            .chars()
            .map(|c| c.to_digit(10).and_then(|d| u8::try_from(d).ok()))
            .collect::<Option<_>>()
            .ok_or_else(|| CodebreakerError::Malformed(trimmed.to_string()))?;
        let digits: [u8; CODE_LEN] = digits
            .try_into()
            .map_err(|_| CodebreakerError::Malformed(trimmed.to_string()))?;
        Self::new(digits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Feedback {
    /// Right digit, right position.
    pub exact: u8,
    /// Right digit, wrong position.
    pub value: u8,
}

impl Feedback {
    #[must_use]
    pub const fn is_solved(self) -> bool {
        self.exact as usize == CODE_LEN
    }
}

/// Score `guess` against `secret`.
#[must_use]
pub fn score(guess: &Code, secret: &Code) -> Feedback {
    let mut feedback = Feedback::default();
    let mut secret_pool: [Option<u8>; CODE_LEN] = [None; CODE_LEN];
    let mut open_guess: SmallVec<[u8; CODE_LEN]> = SmallVec::new();

    for (g, s) in guess.0.iter().zip(secret.0.iter()) {
        if g == s {
            feedback.exact += 1;
        } else {
            secret_pool[open_guess.len()] = Some(*s);
            open_guess.push(*g);
        }
    }

    for g in open_guess {
        if let Some(slot) = secret_pool.iter_mut().find(|slot| **slot == Some(g)) {
            *slot = None;
            feedback.value += 1;
        }
    }
    feedback
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub code: Code,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Won,
    Lost { secret: Code },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Fewer than four digits entered.
    Incomplete,
    /// The game is over; only a new game accepts input.
    Finished,
    Miss(Feedback),
    Cracked(Feedback),
    /// Tenth miss. The secret is revealed.
    Exhausted { feedback: Feedback, secret: Code },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodebreakerEffect {
    NavigateBack,
}

/// Deterministic generator for replays and tests.
#[must_use]
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

#[derive(Debug, Clone)]
pub struct Codebreaker {
    secret: Code,
    history: Vec<GuessRecord>,
    current: SmallVec<[u8; CODE_LEN]>,
    status: GameStatus,
    success_ms: u64,
    schedule: Schedule<CodebreakerEffect>,
}

impl Codebreaker {
    pub fn new<R: Rng + ?Sized>(config: &TerminalConfig, rng: &mut R) -> Self {
        Self::with_secret(config, Code::random(rng))
    }

    #[must_use]
    pub fn with_secret(config: &TerminalConfig, secret: Code) -> Self {
        Self {
            secret,
            history: Vec::with_capacity(MAX_ATTEMPTS),
            current: SmallVec::new(),
            status: GameStatus::Playing,
            success_ms: config.codebreaker_success_ms,
            schedule: Schedule::new(),
        }
    }

    /// Draw a fresh secret and forget the previous game.
    pub fn new_game<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.secret = Code::random(rng);
        self.history.clear();
        self.current.clear();
        self.status = GameStatus::Playing;
        self.schedule.cancel_all();
    }

    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        !matches!(self.status, GameStatus::Playing)
    }

    #[must_use]
    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    #[must_use]
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    #[must_use]
    pub fn attempts_left(&self) -> usize {
        MAX_ATTEMPTS.saturating_sub(self.history.len())
    }

    /// Append a digit to the guess being typed. `Ok(false)` means the input
    /// was ignored (guess full or game over).
    ///
    /// # Errors
    ///
    /// Returns [`CodebreakerError::InvalidDigit`] for values above 9.
    pub fn add_digit(&mut self, digit: u8) -> Result<bool, CodebreakerError> {
        if digit > CODE_DIGIT_MAX {
            return Err(CodebreakerError::InvalidDigit(digit));
        }
        if self.is_finished() || self.current.len() >= CODE_LEN {
            return Ok(false);
        }
        self.current.push(digit);
        Ok(true)
    }

    pub fn remove_digit(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.current.pop().is_some()
    }

    /// Type a whole code and submit it.
    pub fn guess<S: ProgressStorage>(
        &mut self,
        code: &Code,
        store: &mut ProgressStore<S>,
    ) -> GuessOutcome {
        if self.is_finished() {
            return GuessOutcome::Finished;
        }
        self.current.clear();
        self.current.extend_from_slice(code.digits());
        self.submit(store)
    }

    /// Score the typed guess.
    pub fn submit<S: ProgressStorage>(&mut self, store: &mut ProgressStore<S>) -> GuessOutcome {
        if self.is_finished() {
            return GuessOutcome::Finished;
        }
        let Ok(digits) = <[u8; CODE_LEN]>::try_from(self.current.as_slice()) else {
            return GuessOutcome::Incomplete;
        };
        let code = Code(digits);
        let feedback = score(&code, &self.secret);
        self.history.push(GuessRecord { code, feedback });
        self.current.clear();

        if feedback.is_solved() {
            self.status = GameStatus::Won;
            store.complete(ChallengeId::Codebreaker);
            log::debug!("code cracked in {} guesses", self.history.len());
            self.schedule
                .schedule(self.success_ms, CodebreakerEffect::NavigateBack);
            GuessOutcome::Cracked(feedback)
        } else if self.history.len() >= MAX_ATTEMPTS {
            self.status = GameStatus::Lost {
                secret: self.secret,
            };
            GuessOutcome::Exhausted {
                feedback,
                secret: self.secret,
            }
        } else {
            GuessOutcome::Miss(feedback)
        }
    }

    pub fn advance(&mut self, elapsed_ms: u64) -> Option<Navigation> {
        self.schedule
            .advance(elapsed_ms)
            .into_iter()
            .map(|CodebreakerEffect::NavigateBack| Navigation::Back)
            .last()
    }

    pub fn teardown(&mut self) {
        self.schedule.cancel_all();
    }
}
