//! Game configuration loader.

use std::path::Path;

use anyhow::Context;
use match_core::GameConfig;
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
///
/// Every field is optional; missing ones keep their default value.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a [`GameConfig`] from a TOML file.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        let config = Self::parse(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        debug!(path = %path.display(), board_size = config.board_size, "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content).context("failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_core::ConfigError;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(ConfigLoader::parse("").unwrap(), GameConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = ConfigLoader::parse("board_size = 6\nstarting_hp = 40\n").unwrap();
        assert_eq!(config.board_size, 6);
        assert_eq!(config.starting_hp, 40);
        assert_eq!(config.moves_per_turn, GameConfig::DEFAULT_MOVES_PER_TURN);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ConfigLoader::parse("moves_per_turn = 0").unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
        assert!(ConfigLoader::parse("board_size = \"big\"").is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.toml");
        std::fs::write(&path, "min_match_size = 1").unwrap();
        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("game.toml"));
        assert!(ConfigLoader::load(&dir.path().join("missing.toml")).is_err());
    }
}
