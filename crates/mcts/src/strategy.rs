//! The closed set of search variants.
//!
//! Every variant runs the same select → expand → simulate → backpropagate
//! loop; they differ in how selection descends and how the frontier node
//! is scored:
//!
//! | Variant   | Selection            | Simulation                        |
//! |-----------|----------------------|-----------------------------------|
//! | `Uct`     | UCT                  | uniform random reward             |
//! | `Nested`  | UCT                  | best of nested random rollouts    |
//! | `Adaptive`| UCT                  | weight-table sampled rollout      |
//! | `Learned` | evaluator preference | evaluator value                   |

use crate::evaluator::{Evaluator, EvaluatorError};
use crate::node::NodeId;
use crate::tree::Tree;
use std::fmt;
use treesearch_core::{fixed_width, Featurize};

/// Search variant injected into [`crate::Mcts`] at construction.
#[derive(Default)]
pub enum Strategy {
    /// Plain UCT with random rewards.
    #[default]
    Uct,

    /// Nested rollouts at a fixed nesting level.
    Nested { level: u32 },

    /// Rollouts guided by the driver's [`crate::PolicyTable`].
    Adaptive,

    /// Selection and evaluation delegated to an external estimator, with
    /// UCT and random-reward fallbacks when it fails.
    Learned(Box<dyn Evaluator>),
}

impl Strategy {
    /// Wrap an evaluator in the `Learned` variant.
    pub fn learned(evaluator: impl Evaluator + 'static) -> Self {
        Self::Learned(Box::new(evaluator))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uct => "uct",
            Self::Nested { .. } => "nested",
            Self::Adaptive => "adaptive",
            Self::Learned(_) => "learned",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uct => f.write_str("Uct"),
            Self::Nested { level } => f.debug_struct("Nested").field("level", level).finish(),
            Self::Adaptive => f.write_str("Adaptive"),
            Self::Learned(_) => f.write_str("Learned(..)"),
        }
    }
}

/// Feature vector for a node's state, fitted to `width`.
pub fn node_features<S: Featurize, A>(tree: &Tree<S, A>, id: NodeId, width: usize) -> Vec<f32> {
    fixed_width(tree.get(id).state().flatten(), width)
}

/// The child of `id` the evaluator prefers.
///
/// Child `i` is scored by preference entry `i`, clamped to the last entry
/// when the evaluator returns fewer entries than there are children. Ties
/// go to the first child. Returns `Ok(None)` for a node without children.
///
/// # Errors
/// Any evaluator failure, including an empty preference vector.
pub fn preferred_child<S: Featurize, A>(
    tree: &Tree<S, A>,
    id: NodeId,
    evaluator: &dyn Evaluator,
    width: usize,
) -> Result<Option<NodeId>, EvaluatorError> {
    let children = tree.children(id);
    if children.is_empty() {
        return Ok(None);
    }

    let evaluation = evaluator.evaluate(&node_features(tree, id, width))?;

    let mut best = children[0];
    let mut best_score = f32::NEG_INFINITY;
    for (i, &child) in children.iter().enumerate() {
        let score = evaluation.preference(i)?;
        if score > best_score {
            best_score = score;
            best = child;
        }
    }
    Ok(Some(best))
}

/// The evaluator's value for the state at `id`, used directly as the reward.
///
/// # Errors
/// Any evaluator failure, including a non-finite value.
pub fn evaluated_reward<S: Featurize, A>(
    tree: &Tree<S, A>,
    id: NodeId,
    evaluator: &dyn Evaluator,
    width: usize,
) -> Result<f64, EvaluatorError> {
    evaluator.evaluate(&node_features(tree, id, width))?.reward()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluation;
    use crate::games::{RandomWalk, TicTacToe};
    use treesearch_core::Environment;

    fn fixed(policy: Vec<f32>, value: f32) -> impl Evaluator {
        move |_: &[f32]| -> Result<Evaluation, EvaluatorError> {
            Ok(Evaluation {
                policy: policy.clone(),
                value,
            })
        }
    }

    fn expanded_walk() -> Tree<i32, crate::games::WalkAction> {
        let env = RandomWalk::default();
        let mut tree = Tree::new(0);
        tree.expand(&env, NodeId::ROOT).unwrap();
        tree
    }

    #[test]
    fn test_preferred_child_picks_highest_preference() {
        let tree = expanded_walk();
        let evaluator = fixed(vec![0.1, 0.8, 0.1], 0.0);

        let child = preferred_child(&tree, NodeId::ROOT, &evaluator, 10).unwrap();
        assert_eq!(child, Some(tree.children(NodeId::ROOT)[1]));
    }

    #[test]
    fn test_preferred_child_clamps_short_policy() {
        let tree = expanded_walk();
        // Children 1 and 2 both read entry 1; the first of them wins.
        let evaluator = fixed(vec![0.2, 0.9], 0.0);

        let child = preferred_child(&tree, NodeId::ROOT, &evaluator, 10).unwrap();
        assert_eq!(child, Some(tree.children(NodeId::ROOT)[1]));
    }

    #[test]
    fn test_preferred_child_ties_go_first() {
        let tree = expanded_walk();
        let evaluator = fixed(vec![0.5; 3], 0.0);

        let child = preferred_child(&tree, NodeId::ROOT, &evaluator, 10).unwrap();
        assert_eq!(child, Some(tree.children(NodeId::ROOT)[0]));
    }

    #[test]
    fn test_preferred_child_empty_policy_is_error() {
        let tree = expanded_walk();
        let evaluator = fixed(Vec::new(), 0.0);

        let result = preferred_child(&tree, NodeId::ROOT, &evaluator, 10);
        assert_eq!(result, Err(EvaluatorError::EmptyPolicy));
    }

    #[test]
    fn test_preferred_child_nan_policy_is_error() {
        let tree = expanded_walk();
        let evaluator = fixed(vec![f32::NAN; 3], 0.5);

        let result = preferred_child(&tree, NodeId::ROOT, &evaluator, 10);
        assert_eq!(result, Err(EvaluatorError::NonFinite("policy")));
    }

    #[test]
    fn test_evaluator_sees_fixed_width_features() {
        let env = TicTacToe;
        let state = env.apply(&env.reset(), &crate::games::TicTacToeAction::new(0, 0)).unwrap();
        let tree: Tree<_, crate::games::TicTacToeAction> = Tree::new(state);

        let evaluator = |features: &[f32]| -> Result<Evaluation, EvaluatorError> {
            if features.len() != 10 {
                return Err(EvaluatorError::Shape {
                    expected: 10,
                    actual: features.len(),
                });
            }
            Ok(Evaluation {
                policy: vec![1.0],
                value: features[0],
            })
        };

        // X was placed in the top-left cell.
        assert_eq!(evaluated_reward(&tree, NodeId::ROOT, &evaluator, 10), Ok(1.0));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Uct.name(), "uct");
        assert_eq!(Strategy::Nested { level: 2 }.name(), "nested");
        assert_eq!(Strategy::Adaptive.name(), "adaptive");
        assert_eq!(Strategy::learned(fixed(vec![1.0], 0.0)).name(), "learned");
        assert_eq!(format!("{:?}", Strategy::Nested { level: 2 }), "Nested { level: 2 }");
    }
}
