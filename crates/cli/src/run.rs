//! Generic search and play loops behind the subcommands.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::Display;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};
use treesearch_core::Environment;
use treesearch_mcts::{
    ChannelObserver, Mcts, NodeId, SearchConfig, SearchControl, SearchMessage, SearchResult,
    Strategy,
};
use treesearch_network::PolicyValueNetwork;

/// Simulation variant, selected by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Plain UCT with random rewards.
    Uct,
    /// Nested Monte Carlo rewards.
    Nested,
    /// Rewards from a per-state action table.
    Adaptive,
    /// Selection and rewards from the policy/value network.
    Learned,
}

/// Everything a run needs besides the environment.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub config: SearchConfig,
    pub variant: Variant,
    pub nesting_level: u32,
    pub seed: u64,
}

impl RunSettings {
    /// Fresh strategy for one driver. Learned networks are seeded from `seed`.
    pub fn strategy<E: Environment>(&self, env: &E, seed: u64) -> Strategy {
        match self.variant {
            Variant::Uct => Strategy::Uct,
            Variant::Nested => Strategy::Nested {
                level: self.nesting_level,
            },
            Variant::Adaptive => Strategy::Adaptive,
            Variant::Learned => Strategy::learned(PolicyValueNetwork::for_environment(
                env,
                self.config.feature_width,
                seed,
            )),
        }
    }

    fn mcts<E: Environment>(&self, env: E, seed: u64) -> Mcts<E, ChaCha8Rng> {
        let strategy = self.strategy(&env, seed);
        Mcts::new(env, self.config.clone(), strategy, ChaCha8Rng::seed_from_u64(seed))
    }
}

#[derive(Debug, Serialize)]
pub struct ChildReport {
    pub action: String,
    pub visits: u32,
    pub mean_value: f64,
}

/// Summary of one search from the initial state.
#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub variant: Variant,
    pub root: String,
    pub iterations: usize,
    pub stopped: bool,
    pub nodes: usize,
    pub max_depth: usize,
    pub root_visits: u32,
    pub root_mean: f64,
    pub best_action: Option<String>,
    pub children: Vec<ChildReport>,
    pub selection_fallbacks: usize,
    pub simulation_fallbacks: usize,
    pub elapsed_ms: u128,
}

impl SearchReport {
    fn new<S: Display, A: Display>(
        variant: Variant,
        result: &SearchResult<S, A>,
        elapsed_ms: u128,
    ) -> Self {
        let tree = result.tree();
        let root = tree.root();
        let stats = result.stats();

        let children = tree
            .children(NodeId::ROOT)
            .iter()
            .filter_map(|&id| {
                let node = tree.get(id);
                node.action().map(|action| ChildReport {
                    action: action.to_string(),
                    visits: node.visit_count(),
                    mean_value: node.mean_value(),
                })
            })
            .collect();

        Self {
            variant,
            root: root.state().to_string(),
            iterations: stats.iterations,
            stopped: stats.stopped,
            nodes: tree.len(),
            max_depth: tree.max_depth(),
            root_visits: root.visit_count(),
            root_mean: root.mean_value(),
            best_action: result.best_action().map(ToString::to_string),
            children,
            selection_fallbacks: stats.selection_fallbacks,
            simulation_fallbacks: stats.simulation_fallbacks,
            elapsed_ms,
        }
    }
}

/// Search once from `env`'s initial state.
///
/// With `progress`, the search runs on a worker thread and reports each
/// tenth of its budget as it goes.
pub fn run_search<E>(env: E, settings: &RunSettings, progress: bool) -> Result<SearchReport>
where
    E: Environment,
    E::State: Display + Send,
    E::Action: Display + Send,
{
    let root = env.reset();
    let mut mcts = settings.mcts(env, settings.seed);
    let start = Instant::now();

    let result = if progress {
        search_with_progress(&mut mcts, root)?
    } else {
        mcts.search(root)?
    };

    Ok(SearchReport::new(
        settings.variant,
        &result,
        start.elapsed().as_millis(),
    ))
}

fn search_with_progress<E>(
    mcts: &mut Mcts<E, ChaCha8Rng>,
    root: E::State,
) -> Result<SearchResult<E::State, E::Action>>
where
    E: Environment,
    E::State: Send,
    E::Action: Send,
{
    let total = mcts.config().iterations;
    let step = (total / 10).max(1);
    let (sender, receiver) = mpsc::channel();
    let control = SearchControl::new();

    thread::scope(|scope| {
        let worker = scope.spawn(|| {
            let mut observer = ChannelObserver::progress_only(sender);
            mcts.search_with(root, &mut observer, &control)
        });

        for message in receiver {
            match message {
                SearchMessage::Progress { iteration } if iteration % step == 0 => {
                    info!("Progress: {}/{} iterations", iteration, total);
                }
                SearchMessage::Finished { iterations, stopped } => {
                    info!(iterations, stopped, "Search finished");
                }
                _ => {}
            }
        }

        worker
            .join()
            .map_err(|_| anyhow!("Search thread panicked"))?
            .map_err(Into::into)
    })
}

/// One played-out episode.
#[derive(Debug, Serialize)]
pub struct GameRecord {
    pub seed: u64,
    pub moves: Vec<String>,
    /// True if the episode reached a terminal state within the move limit.
    pub finished: bool,
    pub final_state: String,
}

/// Play from the initial state, searching before every move and taking the
/// search's chosen action.
///
/// The same driver serves the whole game, so an adaptive table carries over
/// from move to move.
pub fn play_game<E>(env: &E, settings: &RunSettings, seed: u64, max_moves: usize) -> Result<GameRecord>
where
    E: Environment,
    E::State: Display,
    E::Action: Display,
{
    let mut mcts = settings.mcts(env.clone(), seed);
    let mut state = env.reset();
    let mut moves = Vec::new();

    while !env.is_terminal(&state) && moves.len() < max_moves {
        let result = mcts.search(state.clone())?;
        let Some(action) = result.best_action().cloned() else {
            break;
        };

        debug!(seed, ply = moves.len(), action = %action, "Move chosen");
        state = env.apply(&state, &action)?;
        moves.push(action.to_string());
    }

    Ok(GameRecord {
        seed,
        moves,
        finished: env.is_terminal(&state),
        final_state: state.to_string(),
    })
}

/// Play `games` episodes in parallel, seeding game `i` with
/// `seed + 1000 * i`.
pub fn play_games<E>(
    env: &E,
    settings: &RunSettings,
    games: usize,
    max_moves: usize,
) -> Result<Vec<GameRecord>>
where
    E: Environment,
    E::State: Display,
    E::Action: Display,
{
    (0..games)
        .into_par_iter()
        .map(|i| {
            let game_seed = settings.seed.wrapping_add(i as u64 * 1000);
            play_game(env, settings, game_seed, max_moves)
        })
        .collect()
}
