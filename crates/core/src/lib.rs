//! Treesearch Core - environment abstraction and common types
//!
//! This crate provides the [`Environment`] trait that any decision process
//! must implement to be searched by the `treesearch-mcts` engine.
//!
//! # Types
//!
//! - [`Environment`] - Trait for games and tasks
//! - [`Featurize`] - Flattening of states into numeric feature vectors
//! - [`Policy`] - Probability distribution over actions (sums to 1.0)

mod environment;
mod error;
mod features;
mod types;

pub use environment::Environment;
pub use error::{Error, Result};
pub use features::{fixed_width, Featurize, DEFAULT_FEATURE_WIDTH};
pub use types::Policy;
