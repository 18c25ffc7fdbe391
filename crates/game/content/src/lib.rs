//! Data-driven content for the battle: the monster roster, team selection,
//! and loaders for RON/TOML data files.
//!
//! Content feeds battle setup and never appears in battle state; a
//! [`match_core::Battle`] only sees the [`match_core::MonsterTemplate`]s
//! selected here.

pub mod roster;
pub mod selection;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use roster::{Roster, RosterError};
pub use selection::{
    AllPick, Draft, SelectionError, SelectionMode, TEAM_SIZE, Teams, random_teams,
};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, LoadResult, RosterLoader};
