//! Rollout policies: the reward estimates produced in the simulation phase.
//!
//! All rollouts here return a reward in `[0, 1]`:
//! - [`random_reward`] ignores the state entirely
//! - [`nested_reward`] keeps the best of [`NESTED_SAMPLES`] recursive rollouts
//! - [`adaptive_reward`] samples an action from a per-state weight table
//!   before drawing its reward

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::HashMap;
use treesearch_core::{Environment, Policy, Result};

/// Recursive simulations performed at each nesting level above 0.
pub const NESTED_SAMPLES: usize = 10;

/// A reward drawn uniformly from `[0, 1]`.
pub fn random_reward<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..=1.0)
}

/// Bookkeeping from one nested rollout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NestedTrace {
    /// Total rollout calls, including the outermost one.
    pub calls: usize,

    /// Deepest recursion reached below the outermost call.
    pub max_depth: u32,
}

/// Nested rollout at `level`.
///
/// Level 0 is [`random_reward`]. Any higher level returns the maximum of
/// [`NESTED_SAMPLES`] rollouts at `level - 1`.
pub fn nested_reward<R: Rng + ?Sized>(rng: &mut R, level: u32) -> (f64, NestedTrace) {
    let mut trace = NestedTrace::default();
    let reward = nested(rng, level, 0, &mut trace);
    (reward, trace)
}

fn nested<R: Rng + ?Sized>(rng: &mut R, level: u32, depth: u32, trace: &mut NestedTrace) -> f64 {
    trace.calls += 1;
    trace.max_depth = trace.max_depth.max(depth);

    if level == 0 {
        return random_reward(rng);
    }

    let mut best = f64::NEG_INFINITY;
    for _ in 0..NESTED_SAMPLES {
        let reward = nested(rng, level - 1, depth + 1, trace);
        if reward > best {
            best = reward;
        }
    }
    best
}

/// Per-state action weights for the adaptive rollout.
///
/// Keyed by [`Environment::canonical_key`]. An entry is created the first
/// time a state is rolled out, with weight 1.0 for each legal action.
#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    weights: HashMap<u64, Vec<f32>>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weights recorded for a state key, if it has been rolled out.
    pub fn weights(&self, key: u64) -> Option<&[f32]> {
        self.weights.get(&key).map(Vec::as_slice)
    }

    /// Number of states with an entry.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn entry(&mut self, key: u64, num_actions: usize) -> &[f32] {
        self.weights
            .entry(key)
            .or_insert_with(|| vec![1.0; num_actions])
    }

    /// Weight update after a rollout. Currently a no-op.
    ///
    /// No learning rule has been chosen for the adaptive rollout yet, so the
    /// table keeps its initial uniform weights and the rollout does not
    /// actually adapt. A rule (e.g. a nested-rollout policy adaptation step)
    /// belongs here.
    pub fn adapt(&mut self, _key: u64, _action_index: usize, _reward: f64) {}
}

/// Outcome of one adaptive rollout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveRollout {
    pub reward: f64,

    /// Index of the sampled action, or `None` when sampling was skipped
    /// (no legal actions, or weights that cannot be normalized).
    pub sampled: Option<usize>,
}

/// Adaptive rollout from `state`.
///
/// Samples one legal action in proportion to the table weights and applies
/// it to a copy of the state; the reward is then drawn uniformly from
/// `[0, 1]` whatever the sampled action was. Sampling problems are never
/// fatal: they skip straight to the random reward.
///
/// # Errors
/// Propagates `Error::IllegalAction` if the environment rejects an action
/// it reported as legal.
pub fn adaptive_reward<E, R>(
    env: &E,
    table: &mut PolicyTable,
    state: &E::State,
    rng: &mut R,
) -> Result<AdaptiveRollout>
where
    E: Environment,
    R: Rng + ?Sized,
{
    let actions = env.legal_actions(state);
    let key = env.canonical_key(state);

    let sampled = match sample_index(table.entry(key, actions.len()), rng) {
        Some(index) if index < actions.len() => {
            let _successor = env.apply(state, &actions[index])?;
            Some(index)
        }
        _ => None,
    };

    let reward = random_reward(rng);
    if let Some(index) = sampled {
        table.adapt(key, index, reward);
    }
    Ok(AdaptiveRollout { reward, sampled })
}

fn sample_index<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> Option<usize> {
    let policy = Policy::from_weights(weights).ok()?;
    let distribution = WeightedIndex::new(policy.as_slice()).ok()?;
    Some(distribution.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{RandomWalk, TicTacToe};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_reward_in_unit_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let reward = random_reward(&mut rng);
            assert!((0.0..=1.0).contains(&reward));
        }
    }

    #[test]
    fn test_nested_level_zero_matches_random() {
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..100 {
            let (nested, trace) = nested_reward(&mut a, 0);
            assert_eq!(nested, random_reward(&mut b));
            assert_eq!(trace.calls, 1);
            assert_eq!(trace.max_depth, 0);
        }
    }

    #[test]
    fn test_nested_recursion_is_bounded_by_level() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for level in 0..4u32 {
            let (reward, trace) = nested_reward(&mut rng, level);
            let expected_calls: usize = (0..=level).map(|l| NESTED_SAMPLES.pow(l)).sum();

            assert!((0.0..=1.0).contains(&reward));
            assert_eq!(trace.max_depth, level);
            assert_eq!(trace.calls, expected_calls);
        }
    }

    #[test]
    fn test_nested_is_best_of_samples() {
        let mut nested_rng = ChaCha8Rng::seed_from_u64(5);
        let mut plain_rng = ChaCha8Rng::seed_from_u64(5);

        let (best, _) = nested_reward(&mut nested_rng, 1);
        let expected = (0..NESTED_SAMPLES)
            .map(|_| random_reward(&mut plain_rng))
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(best, expected);
    }

    #[test]
    fn test_adaptive_creates_uniform_entry() {
        let env = TicTacToe;
        let state = env.reset();
        let mut table = PolicyTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let rollout = adaptive_reward(&env, &mut table, &state, &mut rng).unwrap();

        assert!((0.0..=1.0).contains(&rollout.reward));
        assert!(rollout.sampled.is_some_and(|i| i < 9));
        let weights = table.weights(env.canonical_key(&state)).unwrap();
        assert_eq!(weights, &[1.0; 9]);
    }

    #[test]
    fn test_adaptive_no_legal_actions_falls_back() {
        let env = RandomWalk::default();
        let terminal = 10;
        let mut table = PolicyTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let rollout = adaptive_reward(&env, &mut table, &terminal, &mut rng).unwrap();

        assert!((0.0..=1.0).contains(&rollout.reward));
        assert_eq!(rollout.sampled, None);
        assert_eq!(table.weights(env.canonical_key(&terminal)), Some(&[][..]));
    }

    #[test]
    fn test_adaptive_unnormalizable_weights_fall_back() {
        let env = RandomWalk::default();
        let mut table = PolicyTable::new();
        let key = env.canonical_key(&0);
        table.weights.insert(key, vec![0.0, 0.0, 0.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let rollout = adaptive_reward(&env, &mut table, &0, &mut rng).unwrap();

        assert_eq!(rollout.sampled, None);
        assert!((0.0..=1.0).contains(&rollout.reward));
    }

    #[test]
    fn test_adaptive_mismatched_entry_falls_back() {
        let env = RandomWalk::default();
        let mut table = PolicyTable::new();
        let key = env.canonical_key(&0);
        // Only the last slot has weight, and it is past the 3 legal actions.
        table.weights.insert(key, vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let rollout = adaptive_reward(&env, &mut table, &0, &mut rng).unwrap();
        assert_eq!(rollout.sampled, None);
    }

    #[test]
    fn test_adaptive_weights_stay_uniform() {
        let env = RandomWalk::default();
        let mut table = PolicyTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        for _ in 0..50 {
            adaptive_reward(&env, &mut table, &0, &mut rng).unwrap();
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.weights(env.canonical_key(&0)), Some(&[1.0, 1.0, 1.0][..]));
    }
}
