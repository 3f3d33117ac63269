//! Bounded one-dimensional random walk.
//!
//! The state is a position on the integer line starting at 0. The walk
//! ends once the position reaches `-bound` or `bound`.

use std::fmt;
use treesearch_core::{Environment, Error, Result};

/// Step taken by the walker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WalkAction {
    MoveLeft,
    MoveRight,
    Stay,
}

impl WalkAction {
    pub const ALL: [WalkAction; 3] = [WalkAction::MoveLeft, WalkAction::MoveRight, WalkAction::Stay];

    fn delta(self) -> i32 {
        match self {
            WalkAction::MoveLeft => -1,
            WalkAction::MoveRight => 1,
            WalkAction::Stay => 0,
        }
    }
}

impl fmt::Display for WalkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalkAction::MoveLeft => "move_left",
            WalkAction::MoveRight => "move_right",
            WalkAction::Stay => "stay",
        };
        f.write_str(name)
    }
}

/// Walk on the integers, terminal at `|position| >= bound`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWalk {
    bound: i32,
}

impl RandomWalk {
    /// # Panics
    /// Panics if `bound` is not positive.
    pub fn new(bound: i32) -> Self {
        assert!(bound > 0, "walk bound must be positive, got {}", bound);
        Self { bound }
    }

    pub fn bound(&self) -> i32 {
        self.bound
    }
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Environment for RandomWalk {
    type State = i32;
    type Action = WalkAction;

    fn reset(&self) -> Self::State {
        0
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(state) {
            Vec::new()
        } else {
            WalkAction::ALL.to_vec()
        }
    }

    fn apply(&self, state: &Self::State, action: &Self::Action) -> Result<Self::State> {
        if self.is_terminal(state) {
            return Err(Error::illegal(action, state));
        }
        Ok(state + action.delta())
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        *state >= self.bound || *state <= -self.bound
    }
}
