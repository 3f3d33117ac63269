//! Connect four on a 6×7 board.
//!
//! Row 0 is the top of the board; pieces drop to the highest free row index.

use super::{fmt_grid, has_line, Player};
use std::fmt;
use treesearch_core::{Environment, Error, Featurize, Result};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct ConnectFourState {
    board: [[Option<Player>; COLS]; ROWS],
    current: Player,
}

impl ConnectFourState {
    pub fn new() -> Self {
        Self {
            board: [[None; COLS]; ROWS],
            current: Player::X,
        }
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Player> {
        self.board.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// The player with four in a row, if any.
    pub fn winner(&self) -> Option<Player> {
        [Player::X, Player::O]
            .into_iter()
            .find(|&player| has_line(&self.board, player, 4))
    }

    fn column_open(&self, col: usize) -> bool {
        col < COLS && self.board[0][col].is_none()
    }
}

impl Default for ConnectFourState {
    fn default() -> Self {
        Self::new()
    }
}

impl Featurize for ConnectFourState {
    fn write_features(&self, out: &mut Vec<f32>) {
        self.board.write_features(out);
        self.current.write_features(out);
    }
}

impl fmt::Display for ConnectFourState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_grid(f, &self.board)
    }
}

/// Column to drop a piece into.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConnectFourAction(pub u8);

impl fmt::Display for ConnectFourAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectFour;

impl Environment for ConnectFour {
    type State = ConnectFourState;
    type Action = ConnectFourAction;

    fn reset(&self) -> Self::State {
        ConnectFourState::new()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if state.winner().is_some() {
            return Vec::new();
        }
        (0..COLS)
            .filter(|&col| state.column_open(col))
            .map(|col| ConnectFourAction(col as u8))
            .collect()
    }

    fn apply(&self, state: &Self::State, action: &Self::Action) -> Result<Self::State> {
        let col = action.0 as usize;
        if !state.column_open(col) || state.winner().is_some() {
            return Err(Error::illegal(action, state));
        }

        let mut next = state.clone();
        if let Some(row) = (0..ROWS).rev().find(|&row| next.board[row][col].is_none()) {
            next.board[row][col] = Some(state.current);
        }
        next.current = state.current.opposite();
        Ok(next)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.winner().is_some() || (0..COLS).all(|col| !state.column_open(col))
    }
}
