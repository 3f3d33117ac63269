//! Small policy/value network for the learned search strategy.
//!
//! This crate provides an untrained multi-layer perceptron implementing the
//! `Evaluator` trait from `treesearch_mcts`, so a `Strategy::Learned`
//! search can run end to end without any model files.

mod network;

pub use network::{PolicyValueNetwork, DEFAULT_HIDDEN_DIM};
