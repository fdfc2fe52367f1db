//! Automatic players for each puzzle.
use agent_terminal_game::{
    CipherMessage, CipherPuzzle, Code, Feedback, LightsGrid, score, solve_presses,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Cipher letter → plain letter pairs read off the known answer.
pub fn cipher_key(message: &CipherMessage) -> BTreeMap<char, char> {
    message
        .cipher
        .chars()
        .zip(message.answer.chars())
        .filter(|(cipher, _)| cipher.is_ascii_uppercase())
        .collect()
}

/// Bind every cipher letter through the puzzle's own select/assign flow.
pub fn fill_cipher(puzzle: &mut CipherPuzzle, message: &CipherMessage) -> Result<()> {
    for (cipher, plain) in cipher_key(message) {
        puzzle
            .select(cipher)
            .with_context(|| format!("selecting {cipher}"))?;
        puzzle
            .assign(plain)
            .with_context(|| format!("binding {cipher} to {plain}"))?;
    }
    Ok(())
}

pub fn lights_plan(grid: LightsGrid) -> Result<Vec<(usize, usize)>> {
    solve_presses(grid).with_context(|| format!("no press set lights mask {:#011b}", grid.mask()))
}

/// Only ever guesses a code that agrees with every answer so far, preferring
/// the one whose worst answer leaves the fewest candidates. Large fields are
/// sampled rather than searched in full.
#[derive(Debug, Clone)]
pub struct CodeSolver {
    candidates: Vec<Code>,
}

const GUESS_SAMPLE: usize = 48;

impl Default for CodeSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSolver {
    pub fn new() -> Self {
        Self {
            candidates: (0..10_000).filter_map(Code::from_index).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len()
    }

    pub fn next_guess(&self) -> Option<Code> {
        let stride = self.candidates.len().div_ceil(GUESS_SAMPLE).max(1);
        self.candidates
            .iter()
            .step_by(stride)
            .min_by_key(|guess| self.worst_case(guess))
            .copied()
    }

    pub fn record(&mut self, guess: &Code, feedback: Feedback) {
        self.candidates
            .retain(|candidate| score(guess, candidate) == feedback);
    }

    fn worst_case(&self, guess: &Code) -> usize {
        let mut buckets: BTreeMap<(u8, u8), usize> = BTreeMap::new();
        for candidate in &self.candidates {
            let feedback = score(guess, candidate);
            *buckets.entry((feedback.exact, feedback.value)).or_default() += 1;
        }
        buckets.into_values().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_terminal_game::{CipherCatalog, TerminalConfig, seeded_rng};

    #[test]
    fn key_decodes_every_catalog_message() {
        for message in CipherCatalog::shared().iter() {
            let mut puzzle = CipherPuzzle::new(message.clone(), &TerminalConfig::default());
            fill_cipher(&mut puzzle, message).unwrap();
            assert!(puzzle.is_solved(), "{}", message.answer);
        }
    }

    #[test]
    fn lights_plan_matches_solver() {
        let plan = lights_plan(LightsGrid::from_mask(0b1_0000_0001)).unwrap();
        let mut grid = LightsGrid::from_mask(0b1_0000_0001);
        for (row, col) in plan {
            grid.toggle(row, col).unwrap();
        }
        assert!(grid.is_all_on());
    }

    #[test]
    fn solver_never_discards_the_secret() {
        let mut rng = seeded_rng(99);
        for _ in 0..2 {
            let secret = Code::random(&mut rng);
            let mut solver = CodeSolver::new();
            for _ in 0..40 {
                let guess = solver.next_guess().unwrap();
                let feedback = score(&guess, &secret);
                if feedback.is_solved() {
                    break;
                }
                solver.record(&guess, feedback);
                assert!(solver.candidates.contains(&secret));
            }
            assert_eq!(solver.next_guess().map(|g| score(&g, &secret).is_solved()), Some(true));
        }
    }

    #[test]
    fn first_answer_shrinks_the_field() {
        let mut solver = CodeSolver::new();
        let zeros: Code = "0000".parse().unwrap();
        solver.record(&zeros, Feedback { exact: 0, value: 0 });
        assert_eq!(solver.remaining(), 9_usize.pow(4));
        let next = solver.next_guess().unwrap();
        assert!(!next.digits().contains(&0));
    }
}
