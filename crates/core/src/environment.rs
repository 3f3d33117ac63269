use crate::{Featurize, Result};
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// A decision process that can be searched.
///
/// This trait is the only thing the search engine knows about a game or
/// task. States are plain values: `apply` borrows a state and returns a
/// fresh one, so two tree branches can never alias each other's state.
///
/// Beyond the four transition operations, states must be [`Featurize`] so
/// that a learned evaluator can read them. Only the learned strategy ever
/// calls it; for the other strategies a state's features are never built.
pub trait Environment: Clone + Send + Sync {
    /// A point in the decision process (e.g. a board plus side to move).
    ///
    /// `Featurize` is implemented for numbers, arrays, `Option` and pairs, so a
    /// `(board, player)` style state usually gets it by composition.
    type State: Clone + Debug + Eq + Hash + Featurize;

    /// One legal transition out of a state
    type Action: Clone + Debug + PartialEq;

    /// Returns a fresh initial state.
    ///
    /// Used for top-level setup only, never during tree search.
    fn reset(&self) -> Self::State;

    /// Returns all legal actions from the given state.
    ///
    /// Must be non-empty unless the state is terminal.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Applies an action, returning the successor state.
    ///
    /// # Errors
    /// Returns [`crate::Error::IllegalAction`] if `action` is not legal in `state`.
    fn apply(&self, state: &Self::State, action: &Self::Action) -> Result<Self::State>;

    /// Returns true if the process has ended in this state
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Canonical identity of a state, used to key per-state tables.
    ///
    /// The default hashes the whole state. Environments whose states carry
    /// cached or redundant fields should override this to normalize them away.
    fn canonical_key(&self, state: &Self::State) -> u64 {
        let mut hasher = DefaultHasher::new();
        state.hash(&mut hasher);
        hasher.finish()
    }
}
