//! Monster roster loader.

use std::path::Path;

use anyhow::Context;
use match_core::MonsterTemplate;

use crate::loaders::{LoadResult, read_file};
use crate::roster::Roster;

/// Loader for monster rosters from RON files.
///
/// RON format: `Vec<MonsterTemplate>`, see `data/monsters.ron`.
pub struct RosterLoader;

impl RosterLoader {
    pub fn load(path: &Path) -> LoadResult<Roster> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("invalid roster {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<Roster> {
        let templates: Vec<MonsterTemplate> =
            ron::from_str(content).context("failed to parse roster RON")?;
        Ok(Roster::new(templates)?)
    }
}
