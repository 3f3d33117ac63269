//! Environments for exercising the search engine.
//!
//! These implement the [`treesearch_core::Environment`] contract and
//! nothing more: the engine's simulations never look at who won, so the
//! games only need correct legal moves and terminal detection.

pub mod breakthrough;
pub mod connect_four;
pub mod tictactoe;
pub mod walk;

pub use breakthrough::{Breakthrough, BreakthroughAction, BreakthroughState};
pub use connect_four::{ConnectFour, ConnectFourAction, ConnectFourState};
pub use tictactoe::{TicTacToe, TicTacToeAction, TicTacToeState};
pub use walk::{RandomWalk, WalkAction};

use std::fmt;
use treesearch_core::Featurize;

/// Side in a two-player board game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opposing player.
    pub fn opposite(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// `1` for X, `-1` for O.
    pub fn sign(self) -> i8 {
        match self {
            Player::X => 1,
            Player::O => -1,
        }
    }
}

impl Featurize for Player {
    fn write_features(&self, out: &mut Vec<f32>) {
        out.push(self.sign() as f32);
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => write!(f, "X"),
            Player::O => write!(f, "O"),
        }
    }
}

/// Render a grid of cells, one row per line.
pub(crate) fn fmt_grid<const R: usize, const C: usize>(
    f: &mut fmt::Formatter<'_>,
    board: &[[Option<Player>; C]; R],
) -> fmt::Result {
    for row in board {
        for (col, cell) in row.iter().enumerate() {
            if col > 0 {
                write!(f, " ")?;
            }
            match cell {
                Some(player) => write!(f, "{}", player)?,
                None => write!(f, ".")?,
            }
        }
        writeln!(f)?;
    }
    Ok(())
}

/// Whether `player` has `length` in a row anywhere on the board.
pub(crate) fn has_line<const R: usize, const C: usize>(
    board: &[[Option<Player>; C]; R],
    player: Player,
    length: usize,
) -> bool {
    const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

    let owned = |r: isize, c: isize| {
        r >= 0
            && c >= 0
            && (r as usize) < R
            && (c as usize) < C
            && board[r as usize][c as usize] == Some(player)
    };

    (0..R as isize).any(|r| {
        (0..C as isize).any(|c| {
            DIRECTIONS.iter().any(|&(dr, dc)| {
                (0..length as isize).all(|k| owned(r + k * dr, c + k * dc))
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_opposite_and_sign() {
        assert_eq!(Player::X.opposite(), Player::O);
        assert_eq!(Player::O.sign(), -1);
        assert_eq!(Player::X.flatten(), vec![1.0]);
    }

    #[test]
    fn test_has_line_directions() {
        let mut board = [[None; 4]; 4];
        for i in 0..3 {
            board[i][2 - i] = Some(Player::O);
        }
        assert!(has_line(&board, Player::O, 3));
        assert!(!has_line(&board, Player::O, 4));
        assert!(!has_line(&board, Player::X, 1));
    }
}
