//! Search configuration from a TOML file plus command line overrides.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use treesearch_mcts::SearchConfig;

/// Values given explicitly on the command line. They win over the file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overrides {
    pub iterations: Option<usize>,
    pub exploration: Option<f64>,
}

/// Parse a `SearchConfig` from TOML text. Missing keys take defaults.
pub fn parse_config(content: &str) -> Result<SearchConfig> {
    toml::from_str(content).context("Failed to parse search configuration")
}

/// Build the configuration for a run and check it.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<SearchConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading search config from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            parse_config(&content).with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => {
            debug!("No config file given, using built-in defaults");
            SearchConfig::default()
        }
    };

    if let Some(iterations) = overrides.iterations {
        config.iterations = iterations;
    }
    if let Some(exploration) = overrides.exploration {
        config.exploration_weight = exploration;
    }

    config.validate().context("Invalid search configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesearch_mcts::FinalSelection;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config("iterations = 250\nfinal_selection = \"highest_value\"\n").unwrap();
        assert_eq!(config.iterations, 250);
        assert_eq!(config.exploration_weight, 1.4);
        assert_eq!(config.final_selection, FinalSelection::HighestValue);
    }

    #[test]
    fn test_parse_rejects_unknown_selection() {
        assert!(parse_config("final_selection = \"best\"").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            iterations: Some(10),
            exploration: Some(0.5),
        };
        let config = load_config(None, overrides).unwrap();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.exploration_weight, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero = Overrides {
            iterations: Some(0),
            ..Overrides::default()
        };
        assert!(load_config(None, zero).is_err());

        let negative = Overrides {
            exploration: Some(-1.0),
            ..Overrides::default()
        };
        assert!(load_config(None, negative).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let path = Path::new("/nonexistent/treesearch.toml");
        let err = load_config(Some(path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
