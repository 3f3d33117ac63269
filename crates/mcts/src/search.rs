//! Monte Carlo Tree Search driver.
//!
//! Each iteration runs four phases in strict sequence on one shared tree:
//! 1. Selection: descend from the root to a frontier node
//! 2. Expansion: add one child per legal action of that node
//! 3. Simulation: score the selected node with the strategy's rollout
//! 4. Backpropagation: add the reward to every node on the path to the root

use crate::config::{FinalSelection, SearchConfig};
use crate::node::{NodeId, NodeStats};
use crate::observer::{NoopObserver, Phase, SearchControl, SearchEvent, SearchObserver};
use crate::simulation::{adaptive_reward, nested_reward, random_reward, PolicyTable};
use crate::strategy::{evaluated_reward, preferred_child, Strategy};
use crate::tree::Tree;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, trace, warn};
use treesearch_core::{Environment, Result};

/// Counters collected during one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Iterations that ran all four phases.
    pub iterations: usize,

    /// True if a stop request ended the search before its budget.
    pub stopped: bool,

    /// Selection steps where the evaluator failed and UCT was used instead.
    pub selection_fallbacks: usize,

    /// Simulations where the evaluator failed and a random reward was used.
    pub simulation_fallbacks: usize,
}

/// Result of an MCTS search: the finished tree plus counters.
#[derive(Clone, Debug)]
pub struct SearchResult<S, A> {
    tree: Tree<S, A>,
    stats: SearchStats,
    final_selection: FinalSelection,
    exploration_weight: f64,
}

impl<S, A> SearchResult<S, A> {
    pub fn tree(&self) -> &Tree<S, A> {
        &self.tree
    }

    pub fn into_tree(self) -> Tree<S, A> {
        self.tree
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// The root child chosen by the configured [`FinalSelection`].
    pub fn best_child(&self) -> Option<NodeId> {
        select_final(&self.tree, self.final_selection, self.exploration_weight)
    }

    /// Action leading to [`Self::best_child`], or `None` if the root has no
    /// children.
    pub fn best_action(&self) -> Option<&A> {
        self.best_child()
            .and_then(|child| self.tree.get(child).action())
    }

    /// Visit counts of the root's children, in expansion order.
    pub fn child_visits(&self) -> Vec<(&A, u32)> {
        self.tree
            .children(NodeId::ROOT)
            .iter()
            .filter_map(|&child| {
                let node = self.tree.get(child);
                node.action().map(|action| (action, node.visit_count()))
            })
            .collect()
    }
}

/// Rank the root's children by `selection`.
pub fn select_final<S, A>(
    tree: &Tree<S, A>,
    selection: FinalSelection,
    exploration_weight: f64,
) -> Option<NodeId> {
    match selection {
        FinalSelection::MostVisited => tree.most_visited_child(NodeId::ROOT),
        FinalSelection::HighestValue => tree.highest_value_child(NodeId::ROOT),
        FinalSelection::Uct => tree.best_child(NodeId::ROOT, exploration_weight),
    }
}

/// Action on the root's most visited child.
pub fn best_action<S, A>(tree: &Tree<S, A>) -> Option<&A> {
    tree.best_action()
}

/// Visit count and mean value of any node.
pub fn tree_stats<S, A>(tree: &Tree<S, A>, id: NodeId) -> NodeStats {
    tree.stats(id)
}

/// Monte Carlo Tree Search driver.
///
/// Generic over:
/// - `E`: The environment being searched
/// - `R`: The random number generator
///
/// The adaptive strategy's [`PolicyTable`] lives here and persists across
/// searches made with the same driver.
pub struct Mcts<E: Environment, R: Rng> {
    env: E,
    config: SearchConfig,
    strategy: Strategy,
    rng: R,
    policy_table: PolicyTable,
}

impl<E, R> Mcts<E, R>
where
    E: Environment,
    R: Rng,
{
    /// Create a new MCTS instance.
    pub fn new(env: E, config: SearchConfig, strategy: Strategy, rng: R) -> Self {
        Self {
            env,
            config,
            strategy,
            rng,
            policy_table: PolicyTable::new(),
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn policy_table(&self) -> &PolicyTable {
        &self.policy_table
    }

    /// Run a full search from `root_state`.
    ///
    /// # Errors
    /// `Error::InvalidConfig` for an unusable configuration, or
    /// `Error::IllegalAction` if the environment violates its contract.
    pub fn search(&mut self, root_state: E::State) -> Result<SearchResult<E::State, E::Action>> {
        self.search_with(root_state, &mut NoopObserver, &SearchControl::new())
    }

    /// Run a search that reports to `observer` and obeys `control`.
    ///
    /// A stop request returns the partial tree built so far.
    pub fn search_with<O>(
        &mut self,
        root_state: E::State,
        observer: &mut O,
        control: &SearchControl,
    ) -> Result<SearchResult<E::State, E::Action>>
    where
        O: SearchObserver<E::State, E::Action>,
    {
        self.config.validate()?;

        let mut tree = Tree::new(root_state);
        let mut stats = SearchStats::default();

        // Expanding the root up front makes every iteration's path run
        // through exactly one root child.
        tree.expand(&self.env, NodeId::ROOT)?;

        for iteration in 0..self.config.iterations {
            if !control.proceed() {
                stats.stopped = true;
                break;
            }

            let leaf = self.select(&tree, &mut stats);
            observer.on_event(SearchEvent::Phase {
                phase: Phase::Selection,
                iteration,
                tree: &tree,
            });

            tree.expand(&self.env, leaf)?;
            observer.on_event(SearchEvent::Phase {
                phase: Phase::Expansion,
                iteration,
                tree: &tree,
            });

            let reward = self.simulate(&tree, leaf, &mut stats)?;
            observer.on_event(SearchEvent::Phase {
                phase: Phase::Simulation,
                iteration,
                tree: &tree,
            });

            tree.backpropagate(leaf, reward);
            observer.on_event(SearchEvent::Phase {
                phase: Phase::Backpropagation,
                iteration,
                tree: &tree,
            });

            stats.iterations += 1;
            trace!(
                iteration,
                leaf = leaf.index(),
                depth = tree.depth_of(leaf),
                reward,
                "MCTS iteration complete"
            );
            observer.on_event(SearchEvent::Progress {
                iteration: iteration + 1,
            });
        }

        observer.on_event(SearchEvent::Finished {
            iterations: stats.iterations,
            stopped: stats.stopped,
        });

        let root = tree.root();
        debug!(
            strategy = self.strategy.name(),
            iterations = stats.iterations,
            stopped = stats.stopped,
            nodes = tree.len(),
            root_visits = root.visit_count(),
            root_mean = root.mean_value(),
            selection_fallbacks = stats.selection_fallbacks,
            simulation_fallbacks = stats.simulation_fallbacks,
            "Search finished"
        );

        Ok(SearchResult {
            tree,
            stats,
            final_selection: self.config.final_selection,
            exploration_weight: self.config.exploration_weight,
        })
    }

    /// Descend from the root until a node without children.
    fn select(&self, tree: &Tree<E::State, E::Action>, stats: &mut SearchStats) -> NodeId {
        let c = self.config.exploration_weight;
        let mut current = NodeId::ROOT;

        loop {
            let next = match &self.strategy {
                Strategy::Learned(evaluator) => {
                    match preferred_child(tree, current, evaluator.as_ref(), self.config.feature_width) {
                        Ok(next) => next,
                        Err(err) => {
                            warn!(node = current.index(), error = %err, "Evaluator failed during selection, using UCT");
                            stats.selection_fallbacks += 1;
                            tree.best_child(current, c)
                        }
                    }
                }
                _ => tree.best_child(current, c),
            };

            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Score `leaf` with the strategy's rollout.
    fn simulate(
        &mut self,
        tree: &Tree<E::State, E::Action>,
        leaf: NodeId,
        stats: &mut SearchStats,
    ) -> Result<f64> {
        let reward = match &self.strategy {
            Strategy::Uct => random_reward(&mut self.rng),
            Strategy::Nested { level } => nested_reward(&mut self.rng, *level).0,
            Strategy::Adaptive => {
                let state = tree.get(leaf).state();
                adaptive_reward(&self.env, &mut self.policy_table, state, &mut self.rng)?.reward
            }
            Strategy::Learned(evaluator) => {
                match evaluated_reward(tree, leaf, evaluator.as_ref(), self.config.feature_width) {
                    Ok(reward) => reward,
                    Err(err) => {
                        warn!(node = leaf.index(), error = %err, "Evaluator failed during simulation, using random reward");
                        stats.simulation_fallbacks += 1;
                        random_reward(&mut self.rng)
                    }
                }
            }
        };
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{Evaluation, EvaluatorError};
    use crate::games::{RandomWalk, WalkAction};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use treesearch_core::Error;

    fn walk_mcts(strategy: Strategy, iterations: usize) -> Mcts<RandomWalk, ChaCha8Rng> {
        Mcts::new(
            RandomWalk::default(),
            SearchConfig::with_iterations(iterations),
            strategy,
            ChaCha8Rng::seed_from_u64(42),
        )
    }

    #[test]
    fn test_search_basic() {
        let mut mcts = walk_mcts(Strategy::Uct, 100);
        let result = mcts.search(0).unwrap();

        assert_eq!(result.stats().iterations, 100);
        assert!(!result.stats().stopped);
        assert_eq!(result.tree().root().visit_count(), 100);
        assert!(result.best_action().is_some());
    }

    #[test]
    fn test_search_deterministic() {
        let run = |seed: u64| {
            let mut mcts = Mcts::new(
                RandomWalk::default(),
                SearchConfig::with_iterations(50),
                Strategy::Nested { level: 1 },
                ChaCha8Rng::seed_from_u64(seed),
            );
            let result = mcts.search(0).unwrap();
            result
                .child_visits()
                .into_iter()
                .map(|(a, n)| (*a, n))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(12345), run(12345));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut mcts = walk_mcts(Strategy::Uct, 0);
        assert!(matches!(mcts.search(0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_terminal_root_stays_childless() {
        let mut mcts = walk_mcts(Strategy::Uct, 20);
        let result = mcts.search(-10).unwrap();

        assert_eq!(result.tree().len(), 1);
        assert_eq!(result.tree().root().visit_count(), 20);
        assert_eq!(result.best_action(), None);
    }

    #[test]
    fn test_adaptive_table_persists_across_searches() {
        let mut mcts = walk_mcts(Strategy::Adaptive, 30);
        mcts.search(0).unwrap();
        let after_first = mcts.policy_table().len();
        assert!(after_first > 0);

        mcts.search(0).unwrap();
        assert!(mcts.policy_table().len() >= after_first);
    }

    #[test]
    fn test_learned_fallbacks_are_counted() {
        let failing = |_: &[f32]| -> std::result::Result<Evaluation, EvaluatorError> {
            Err(EvaluatorError::Failed("offline".to_string()))
        };
        let mut mcts = walk_mcts(Strategy::learned(failing), 40);
        let result = mcts.search(0).unwrap();

        let stats = result.stats();
        assert_eq!(stats.iterations, 40);
        assert_eq!(stats.simulation_fallbacks, 40);
        // Every iteration selects at least one step below the root.
        assert!(stats.selection_fallbacks >= 40);
        for (_, visits) in result.child_visits() {
            assert!(visits > 0);
        }
    }

    #[test]
    fn test_learned_value_is_used_as_reward() {
        let constant = |_: &[f32]| -> std::result::Result<Evaluation, EvaluatorError> {
            Ok(Evaluation {
                policy: vec![0.0, 1.0, 0.0],
                value: 0.25,
            })
        };
        let mut mcts = walk_mcts(Strategy::learned(constant), 10);
        let result = mcts.search(0).unwrap();

        let stats = result.stats();
        assert_eq!(stats.selection_fallbacks, 0);
        assert_eq!(stats.simulation_fallbacks, 0);
        assert!((result.tree().root().value_sum() - 2.5).abs() < 1e-9);
        // The evaluator always prefers the middle child.
        assert_eq!(result.best_action(), Some(&WalkAction::MoveRight));
        assert_eq!(result.child_visits()[1].1, 10);
    }

    #[test]
    fn test_final_selection_modes() {
        let mut config = SearchConfig::with_iterations(200);
        config.final_selection = FinalSelection::HighestValue;
        let mut mcts = Mcts::new(
            RandomWalk::default(),
            config,
            Strategy::Uct,
            ChaCha8Rng::seed_from_u64(9),
        );
        let result = mcts.search(0).unwrap();

        let tree = result.tree();
        assert_eq!(result.best_child(), tree.highest_value_child(NodeId::ROOT));
        assert_eq!(
            select_final(tree, FinalSelection::MostVisited, 1.4),
            tree.most_visited_child(NodeId::ROOT)
        );
        assert_eq!(best_action(tree), tree.best_action());
        assert_eq!(tree_stats(tree, NodeId::ROOT).visit_count, 200);
    }
}
