//! Capture-less breakthrough on a 5×5 board.
//!
//! Each side starts with a full home row: X on row 0, O on row 4. A piece
//! steps one row toward the opponent, straight or diagonally, into an empty
//! cell. A side wins by reaching the far row. A side with no move left
//! ends the game.

use super::{fmt_grid, Player};
use std::fmt;
use treesearch_core::{Environment, Error, Featurize, Result};

pub const SIZE: usize = 5;

#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct BreakthroughState {
    board: [[Option<Player>; SIZE]; SIZE],
    current: Player,
}

impl BreakthroughState {
    pub fn new() -> Self {
        let mut board = [[None; SIZE]; SIZE];
        board[0] = [Some(Player::X); SIZE];
        board[SIZE - 1] = [Some(Player::O); SIZE];
        Self {
            board,
            current: Player::X,
        }
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Player> {
        self.board.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// The player that reached the far row, if any.
    pub fn winner(&self) -> Option<Player> {
        if self.board[SIZE - 1].contains(&Some(Player::X)) {
            Some(Player::X)
        } else if self.board[0].contains(&Some(Player::O)) {
            Some(Player::O)
        } else {
            None
        }
    }

    fn moves(&self) -> Vec<BreakthroughAction> {
        let forward: isize = match self.current {
            Player::X => 1,
            Player::O => -1,
        };

        let mut moves = Vec::new();
        for row in 0..SIZE {
            for col in 0..SIZE {
                if self.board[row][col] != Some(self.current) {
                    continue;
                }
                let to_row = row as isize + forward;
                if !(0..SIZE as isize).contains(&to_row) {
                    continue;
                }
                for dc in [-1isize, 0, 1] {
                    let to_col = col as isize + dc;
                    if (0..SIZE as isize).contains(&to_col)
                        && self.board[to_row as usize][to_col as usize].is_none()
                    {
                        moves.push(BreakthroughAction {
                            from: (row as u8, col as u8),
                            to: (to_row as u8, to_col as u8),
                        });
                    }
                }
            }
        }
        moves
    }
}

impl Default for BreakthroughState {
    fn default() -> Self {
        Self::new()
    }
}

impl Featurize for BreakthroughState {
    fn write_features(&self, out: &mut Vec<f32>) {
        self.board.write_features(out);
        self.current.write_features(out);
    }
}

impl fmt::Display for BreakthroughState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_grid(f, &self.board)
    }
}

/// Move of one piece, as `(row, col)` coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BreakthroughAction {
    pub from: (u8, u8),
    pub to: (u8, u8),
}

impl fmt::Display for BreakthroughAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.from, self.to)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Breakthrough;

impl Environment for Breakthrough {
    type State = BreakthroughState;
    type Action = BreakthroughAction;

    fn reset(&self) -> Self::State {
        BreakthroughState::new()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if state.winner().is_some() {
            return Vec::new();
        }
        state.moves()
    }

    fn apply(&self, state: &Self::State, action: &Self::Action) -> Result<Self::State> {
        if !self.legal_actions(state).contains(action) {
            return Err(Error::illegal(action, state));
        }

        let (from_row, from_col) = (action.from.0 as usize, action.from.1 as usize);
        let (to_row, to_col) = (action.to.0 as usize, action.to.1 as usize);

        let mut next = state.clone();
        next.board[to_row][to_col] = next.board[from_row][from_col].take();
        next.current = state.current.opposite();
        Ok(next)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.winner().is_some() || state.moves().is_empty()
    }
}
