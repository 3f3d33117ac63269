//! MCTS configuration parameters.
//!
//! These parameters control the search driver. They deserialize from TOML
//! or JSON with every field optional, missing fields taking the defaults.

use serde::{Deserialize, Serialize};
use treesearch_core::{Error, Result, DEFAULT_FEATURE_WIDTH};

/// How the driver ranks root children when reporting its chosen action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSelection {
    /// Child with the highest visit count ("robust child").
    #[default]
    MostVisited,

    /// Visited child with the highest mean reward.
    HighestValue,

    /// Child with the highest UCT score, as used during selection.
    Uct,
}

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of select/expand/simulate/backpropagate iterations per search.
    pub iterations: usize,

    /// UCT exploration constant `c` in `mean + c * sqrt(ln(N + 1) / n)`.
    pub exploration_weight: f64,

    /// Length of the feature vector handed to a learned evaluator.
    pub feature_width: usize,

    /// Ranking used by [`crate::SearchResult::best_action`].
    pub final_selection: FinalSelection,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            exploration_weight: 1.4,
            feature_width: DEFAULT_FEATURE_WIDTH,
            final_selection: FinalSelection::MostVisited,
        }
    }
}

impl SearchConfig {
    /// Create a new config with the specified number of iterations.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    /// Set the exploration constant.
    pub fn exploration(mut self, exploration_weight: f64) -> Self {
        self.exploration_weight = exploration_weight;
        self
    }

    /// Check that the parameters describe a runnable search.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` for zero iterations, a negative or
    /// non-finite exploration constant, or a zero feature width.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfig(
                "iterations must be positive".to_string(),
            ));
        }
        if !self.exploration_weight.is_finite() || self.exploration_weight < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "exploration weight {} must be finite and non-negative",
                self.exploration_weight
            )));
        }
        if self.feature_width == 0 {
            return Err(Error::InvalidConfig(
                "feature width must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.iterations, 1000);
        assert!((config.exploration_weight - 1.4).abs() < 1e-12);
        assert_eq!(config.feature_width, 10);
        assert_eq!(config.final_selection, FinalSelection::MostVisited);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_iterations() {
        let config = SearchConfig::with_iterations(500).exploration(0.5);
        assert_eq!(config.iterations, 500);
        assert!((config.exploration_weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(SearchConfig::with_iterations(0).validate().is_err());
        assert!(SearchConfig::default().exploration(-1.0).validate().is_err());
        assert!(SearchConfig::default().exploration(f64::NAN).validate().is_err());

        let config = SearchConfig {
            feature_width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
