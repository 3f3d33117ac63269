use thiserror::Error;

/// Errors that can occur while searching an environment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An action was applied to a state in which it is not legal.
    ///
    /// This is a contract violation by the caller (or by an environment
    /// whose `legal_actions` disagrees with its `apply`), never a
    /// recoverable condition.
    #[error("Illegal action {action} in state {state}")]
    IllegalAction { action: String, state: String },

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
}

impl Error {
    /// Build an [`Error::IllegalAction`] from the debug renderings of the
    /// offending action and state.
    pub fn illegal<A: std::fmt::Debug, S: std::fmt::Debug>(action: &A, state: &S) -> Self {
        Self::IllegalAction {
            action: format!("{:?}", action),
            state: format!("{:?}", state),
        }
    }
}

/// Convenience Result type for treesearch operations
pub type Result<T> = std::result::Result<T, Error>;
