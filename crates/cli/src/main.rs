//! Command line front end for the tree search engine.
//!
//! Runs a single search on one of the bundled environments and prints the
//! root statistics, or plays whole episodes move by move with a fresh
//! search before every move.

mod config;
mod run;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{load_config, Overrides};
use run::{play_games, run_search, GameRecord, RunSettings, SearchReport, Variant};
use std::path::PathBuf;
use tracing::info;
use treesearch_mcts::games::{Breakthrough, ConnectFour, RandomWalk, TicTacToe};

/// Monte Carlo Tree Search runner.
#[derive(Parser)]
#[command(name = "treesearch")]
#[command(about = "Run Monte Carlo Tree Search on toy environments")]
struct Cli {
    /// Default log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search once from the initial state and report the root's children.
    Search {
        #[command(flatten)]
        common: CommonArgs,

        /// Report progress while searching.
        #[arg(long)]
        progress: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Play episodes, searching before every move.
    Play {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of episodes, played in parallel.
        #[arg(short, long, default_value = "1")]
        games: usize,

        /// Moves after which an episode is cut off.
        #[arg(long, default_value = "200")]
        max_moves: usize,

        /// Print the game records as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EnvKind {
    /// Bounded one-dimensional random walk.
    Walk,
    /// Capture-less 5x5 breakthrough.
    Breakthrough,
    /// Connect four on a 6x7 board.
    ConnectFour,
    /// Tic-tac-toe.
    #[value(name = "tictactoe")]
    TicTacToe,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Environment to search.
    #[arg(short, long, value_enum, default_value_t = EnvKind::Walk)]
    env: EnvKind,

    /// Simulation variant.
    #[arg(short, long, value_enum, default_value_t = Variant::Uct)]
    variant: Variant,

    /// Iterations per search (overrides the config file).
    #[arg(short, long)]
    iterations: Option<usize>,

    /// UCT exploration constant (overrides the config file).
    #[arg(short = 'c', long)]
    exploration: Option<f64>,

    /// Recursion depth of the nested variant.
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(0..=5))]
    nesting_level: u32,

    /// Random seed for reproducibility.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// TOML file with search configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CommonArgs {
    fn settings(&self) -> Result<RunSettings> {
        let overrides = Overrides {
            iterations: self.iterations,
            exploration: self.exploration,
        };
        let config = load_config(self.config.as_deref(), overrides)?;

        Ok(RunSettings {
            config,
            variant: self.variant,
            nesting_level: self.nesting_level,
            seed: self.seed,
        })
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_report(env: EnvKind, report: &SearchReport) {
    println!("Environment: {:?}, variant: {:?}", env, report.variant);
    println!("Root state:\n{}", report.root);
    println!(
        "Iterations: {}{} in {}ms",
        report.iterations,
        if report.stopped { " (stopped)" } else { "" },
        report.elapsed_ms
    );
    println!("Tree: {} nodes, max depth {}", report.nodes, report.max_depth);
    println!("Root: {} visits, mean value {:.4}", report.root_visits, report.root_mean);
    println!("------------------------------------------------");
    for child in &report.children {
        println!(
            "  {:<16} visits {:>7}  mean {:.4}",
            child.action, child.visits, child.mean_value
        );
    }
    println!("------------------------------------------------");
    if report.selection_fallbacks + report.simulation_fallbacks > 0 {
        println!(
            "Evaluator fallbacks: {} selection, {} simulation",
            report.selection_fallbacks, report.simulation_fallbacks
        );
    }
    match &report.best_action {
        Some(action) => println!("Best action: {}", action),
        None => println!("Best action: none (terminal root)"),
    }
}

fn print_games(records: &[GameRecord]) {
    for record in records {
        println!(
            "Game (seed {}): {} moves{}",
            record.seed,
            record.moves.len(),
            if record.finished { "" } else { " (cut off)" }
        );
        println!("  {}", record.moves.join(", "));
        println!("{}", record.final_state);
    }
}

fn cmd_search(common: CommonArgs, progress: bool, json: bool) -> Result<()> {
    let settings = common.settings()?;
    info!(
        env = ?common.env,
        variant = ?settings.variant,
        iterations = settings.config.iterations,
        exploration = settings.config.exploration_weight,
        seed = settings.seed,
        "Starting search"
    );

    let report = match common.env {
        EnvKind::Walk => run_search(RandomWalk::default(), &settings, progress),
        EnvKind::Breakthrough => run_search(Breakthrough, &settings, progress),
        EnvKind::ConnectFour => run_search(ConnectFour, &settings, progress),
        EnvKind::TicTacToe => run_search(TicTacToe, &settings, progress),
    }
    .context("Search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(common.env, &report);
    }
    Ok(())
}

fn cmd_play(common: CommonArgs, games: usize, max_moves: usize, json: bool) -> Result<()> {
    let settings = common.settings()?;
    info!(
        env = ?common.env,
        variant = ?settings.variant,
        games,
        max_moves,
        "Playing episodes"
    );

    let records = match common.env {
        EnvKind::Walk => play_games(&RandomWalk::default(), &settings, games, max_moves),
        EnvKind::Breakthrough => play_games(&Breakthrough, &settings, games, max_moves),
        EnvKind::ConnectFour => play_games(&ConnectFour, &settings, games, max_moves),
        EnvKind::TicTacToe => play_games(&TicTacToe, &settings, games, max_moves),
    }
    .context("Episode failed")?;

    let finished = records.iter().filter(|r| r.finished).count();
    info!(games = records.len(), finished, "Episodes complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_games(&records);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Search {
            common,
            progress,
            json,
        } => cmd_search(common, progress, json),
        Commands::Play {
            common,
            games,
            max_moves,
            json,
        } => cmd_play(common, games, max_moves, json),
    }
}
