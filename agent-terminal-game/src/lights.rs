//! Lights-out toggle grid (challenge 2).
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ProgressStorage;
use crate::config::TerminalConfig;
use crate::constants::{GRID_ALL_ON, GRID_CELLS, GRID_SIZE};
use crate::progress::ProgressStore;
use crate::routes::{ChallengeId, Navigation};
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LightsError {
    #[error("cell ({row}, {col}) is outside the {GRID_SIZE}x{GRID_SIZE} grid")]
    OutOfBounds { row: usize, col: usize },
}

/// 3x3 board packed into the low nine bits, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LightsGrid(u16);

impl LightsGrid {
    #[must_use]
    pub const fn all_off() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_mask(mask: u16) -> Self {
        Self(mask & GRID_ALL_ON)
    }

    #[must_use]
    pub const fn mask(self) -> u16 {
        self.0
    }

    /// The cell plus its in-bounds orthogonal neighbours.
    #[must_use]
    pub const fn mask_for(row: usize, col: usize) -> Option<u16> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        let mut mask = bit(row, col);
        if row > 0 {
            mask |= bit(row - 1, col);
        }
        if row + 1 < GRID_SIZE {
            mask |= bit(row + 1, col);
        }
        if col > 0 {
            mask |= bit(row, col - 1);
        }
        if col + 1 < GRID_SIZE {
            mask |= bit(row, col + 1);
        }
        Some(mask)
    }

    /// Flip a cell and its neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`LightsError::OutOfBounds`] for coordinates past the grid.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<(), LightsError> {
        let mask = Self::mask_for(row, col).ok_or(LightsError::OutOfBounds { row, col })?;
        self.0 ^= mask;
        Ok(())
    }

    #[must_use]
    pub const fn cell(self, row: usize, col: usize) -> bool {
        row < GRID_SIZE && col < GRID_SIZE && self.0 & bit(row, col) != 0
    }

    #[must_use]
    pub const fn is_all_on(self) -> bool {
        self.0 == GRID_ALL_ON
    }

    #[must_use]
    pub fn lit_count(self) -> u32 {
        self.0.count_ones()
    }

    #[must_use]
    pub fn rows(self) -> [[bool; GRID_SIZE]; GRID_SIZE] {
        let mut rows = [[false; GRID_SIZE]; GRID_SIZE];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = self.cell(r, c);
            }
        }
        rows
    }
}

const fn bit(row: usize, col: usize) -> u16 {
    1 << (row * GRID_SIZE + col)
}

/// Fewest presses that take `grid` to all-on, row-major. Every 3x3 board is
/// solvable, so this only returns `None` if that ever stops holding.
#[must_use]
pub fn solve_presses(grid: LightsGrid) -> Option<Vec<(usize, usize)>> {
    let target = grid.mask() ^ GRID_ALL_ON;
    (0_u16..1 << GRID_CELLS)
        .filter(|&presses| combined_mask(presses) == target)
        .min_by_key(|presses| presses.count_ones())
        .map(|presses| {
            (0..GRID_CELLS)
                .filter(|i| presses & (1 << i) != 0)
                .map(|i| (i / GRID_SIZE, i % GRID_SIZE))
                .collect()
        })
}

/// XOR of the neighbourhood masks for every cell set in `presses`.
#[must_use]
pub fn combined_mask(presses: u16) -> u16 {
    (0..GRID_CELLS)
        .filter(|i| presses & (1 << i) != 0)
        .filter_map(|i| LightsGrid::mask_for(i / GRID_SIZE, i % GRID_SIZE))
        .fold(0, |acc, mask| acc ^ mask)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Toggled,
    /// This move lit the whole board.
    Won,
    /// The board is already solved; the move was ignored.
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LightsEffect {
    NavigateBack,
}

#[derive(Debug, Clone)]
pub struct LightsPuzzle {
    grid: LightsGrid,
    won: bool,
    moves: u32,
    success_ms: u64,
    schedule: Schedule<LightsEffect>,
}

impl LightsPuzzle {
    #[must_use]
    pub fn new(config: &TerminalConfig) -> Self {
        Self {
            grid: LightsGrid::all_off(),
            won: false,
            moves: 0,
            success_ms: config.lights_success_ms,
            schedule: Schedule::new(),
        }
    }

    #[must_use]
    pub const fn grid(&self) -> LightsGrid {
        self.grid
    }

    #[must_use]
    pub const fn is_won(&self) -> bool {
        self.won
    }

    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    /// Apply one move and check for the win.
    ///
    /// # Errors
    ///
    /// Returns [`LightsError::OutOfBounds`] for coordinates past the grid.
    pub fn toggle<S: ProgressStorage>(
        &mut self,
        row: usize,
        col: usize,
        store: &mut ProgressStore<S>,
    ) -> Result<ToggleOutcome, LightsError> {
        if self.won {
            return Ok(ToggleOutcome::Locked);
        }
        self.grid.toggle(row, col)?;
        self.moves += 1;
        if !self.grid.is_all_on() {
            return Ok(ToggleOutcome::Toggled);
        }
        self.won = true;
        store.complete(ChallengeId::Lights);
        log::debug!("lights solved in {} moves", self.moves);
        self.schedule
            .schedule(self.success_ms, LightsEffect::NavigateBack);
        Ok(ToggleOutcome::Won)
    }

    /// Back to all-off. Also drops a pending post-win navigation.
    pub fn reset(&mut self) {
        self.grid = LightsGrid::all_off();
        self.won = false;
        self.moves = 0;
        self.schedule.cancel_all();
    }

    pub fn advance(&mut self, elapsed_ms: u64) -> Option<Navigation> {
        self.schedule
            .advance(elapsed_ms)
            .into_iter()
            .map(|LightsEffect::NavigateBack| Navigation::Back)
            .last()
    }

    pub fn teardown(&mut self) {
        self.schedule.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStorage;

    #[test]
    fn corner_touches_three_cells() {
        let mut grid = LightsGrid::all_off();
        grid.toggle(0, 0).unwrap();
        assert_eq!(
            grid.rows(),
            [[true, true, false], [true, false, false], [false, false, false]]
        );
    }

    #[test]
    fn centre_touches_five_cells() {
        let mut grid = LightsGrid::all_off();
        grid.toggle(1, 1).unwrap();
        assert_eq!(grid.lit_count(), 5);
        assert!(!grid.cell(0, 0));
        assert!(grid.cell(0, 1));
    }

    #[test]
    fn edge_touches_four_cells() {
        assert_eq!(LightsGrid::mask_for(0, 1).map(u16::count_ones), Some(4));
        assert_eq!(LightsGrid::mask_for(3, 0), None);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut grid = LightsGrid::all_off();
        assert_eq!(
            grid.toggle(0, 3),
            Err(LightsError::OutOfBounds { row: 0, col: 3 })
        );
    }

    #[test]
    fn solver_lights_empty_board() {
        let presses = solve_presses(LightsGrid::all_off()).expect("solvable");
        let mut grid = LightsGrid::all_off();
        for (row, col) in &presses {
            grid.toggle(*row, *col).unwrap();
        }
        assert!(grid.is_all_on());
    }

    #[test]
    fn win_locks_board_and_navigates_back() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut puzzle = LightsPuzzle::new(&TerminalConfig::default());
        let presses = solve_presses(puzzle.grid()).unwrap();
        let (last, rest) = presses.split_last().unwrap();
        for (row, col) in rest {
            assert_eq!(
                puzzle.toggle(*row, *col, &mut store),
                Ok(ToggleOutcome::Toggled)
            );
        }
        assert_eq!(
            puzzle.toggle(last.0, last.1, &mut store),
            Ok(ToggleOutcome::Won)
        );
        assert!(store.is_complete(ChallengeId::Lights));
        assert_eq!(puzzle.toggle(0, 0, &mut store), Ok(ToggleOutcome::Locked));
        assert!(puzzle.grid().is_all_on());
        assert_eq!(puzzle.advance(1_999), None);
        assert_eq!(puzzle.advance(1), Some(Navigation::Back));
    }

    #[test]
    fn teardown_cancels_navigation() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut puzzle = LightsPuzzle::new(&TerminalConfig::default());
        for (row, col) in solve_presses(puzzle.grid()).unwrap() {
            puzzle.toggle(row, col, &mut store).unwrap();
        }
        assert!(puzzle.is_won());
        puzzle.teardown();
        assert_eq!(puzzle.advance(10_000), None);
        assert!(store.is_complete(ChallengeId::Lights));
    }

    #[test]
    fn reset_reenables_moves() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut puzzle = LightsPuzzle::new(&TerminalConfig::default());
        for (row, col) in solve_presses(puzzle.grid()).unwrap() {
            puzzle.toggle(row, col, &mut store).unwrap();
        }
        assert!(puzzle.is_won());
        puzzle.reset();
        assert!(!puzzle.is_won());
        assert_eq!(puzzle.grid(), LightsGrid::all_off());
        assert_eq!(puzzle.toggle(1, 1, &mut store), Ok(ToggleOutcome::Toggled));
        assert_eq!(puzzle.advance(10_000), None);
    }
}
