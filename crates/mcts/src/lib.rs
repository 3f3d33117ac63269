//! Generic Monte Carlo Tree Search.
//!
//! This crate searches any environment implementing
//! [`treesearch_core::Environment`]. One driver runs the classic four-phase
//! loop (selection, expansion, simulation, backpropagation) over an arena
//! tree, with the simulation step chosen by a [`Strategy`]:
//!
//! - **Uct**: uniform random reward
//! - **Nested**: best of repeated recursive samples
//! - **Adaptive**: a weighted draw from a per-state action table
//! - **Learned**: an [`Evaluator`] guides selection and scores leaves
//!
//! Searches can be observed phase by phase through a [`SearchObserver`]
//! and stopped or paused from another thread through a [`SearchControl`].
//!
//! # Example
//!
//! ```
//! use treesearch_mcts::{games::RandomWalk, Mcts, SearchConfig, Strategy};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = SearchConfig::with_iterations(200).exploration(1.4);
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let mut mcts = Mcts::new(RandomWalk::default(), config, Strategy::Uct, rng);
//!
//! let result = mcts.search(0).unwrap();
//! println!("Best action: {:?}", result.best_action());
//! assert_eq!(result.tree().root().visit_count(), 200);
//! ```

pub mod config;
pub mod evaluator;
pub mod games;
pub mod node;
pub mod observer;
pub mod search;
pub mod simulation;
pub mod strategy;
pub mod tree;

pub use config::{FinalSelection, SearchConfig};
pub use evaluator::{Evaluation, Evaluator, EvaluatorError};
pub use node::{Node, NodeId, NodeStats, EPSILON};
pub use observer::{
    ChannelObserver, NoopObserver, Phase, SearchControl, SearchEvent, SearchMessage,
    SearchObserver, SnapshotNode, TreeSnapshot,
};
pub use search::{best_action, select_final, tree_stats, Mcts, SearchResult, SearchStats};
pub use simulation::{PolicyTable, NESTED_SAMPLES};
pub use strategy::Strategy;
pub use tree::Tree;
