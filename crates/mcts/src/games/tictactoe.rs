//! Tic-tac-toe on a 3×3 board.

use super::{fmt_grid, has_line, Player};
use std::fmt;
use treesearch_core::{Environment, Error, Featurize, Result};

/// Tic-tac-toe board state.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TicTacToeState {
    board: [[Option<Player>; 3]; 3],

    /// Current player to move.
    current: Player,
}

impl TicTacToeState {
    /// Create a new empty board with X to move.
    pub fn new() -> Self {
        Self {
            board: [[None; 3]; 3],
            current: Player::X,
        }
    }

    /// Get the current player to move.
    pub fn current_player(&self) -> Player {
        self.current
    }

    /// Get the piece at a cell, if any.
    pub fn get(&self, row: usize, col: usize) -> Option<Player> {
        self.board.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// The player with three in a row, if any.
    pub fn winner(&self) -> Option<Player> {
        [Player::X, Player::O]
            .into_iter()
            .find(|&player| has_line(&self.board, player, 3))
    }

    fn is_full(&self) -> bool {
        self.board.iter().flatten().all(|c| c.is_some())
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Board cells row-major, then the player to move.
impl Featurize for TicTacToeState {
    fn write_features(&self, out: &mut Vec<f32>) {
        self.board.write_features(out);
        self.current.write_features(out);
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_grid(f, &self.board)
    }
}

/// Tic-tac-toe action: the cell to mark.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicTacToeAction {
    pub row: u8,
    pub col: u8,
}

impl TicTacToeAction {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for TicTacToeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Tic-tac-toe game implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl Environment for TicTacToe {
    type State = TicTacToeState;
    type Action = TicTacToeAction;

    fn reset(&self) -> Self::State {
        TicTacToeState::new()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(state) {
            return Vec::new();
        }
        (0..3u8)
            .flat_map(|row| (0..3u8).map(move |col| TicTacToeAction::new(row, col)))
            .filter(|a| state.get(a.row as usize, a.col as usize).is_none())
            .collect()
    }

    fn apply(&self, state: &Self::State, action: &Self::Action) -> Result<Self::State> {
        let (row, col) = (action.row as usize, action.col as usize);
        if row >= 3 || col >= 3 || state.board[row][col].is_some() || self.is_terminal(state) {
            return Err(Error::illegal(action, state));
        }

        let mut next = state.clone();
        next.board[row][col] = Some(state.current);
        next.current = state.current.opposite();
        Ok(next)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.winner().is_some() || state.is_full()
    }
}
