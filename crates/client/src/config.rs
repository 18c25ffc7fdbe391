//! Client configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use directories::ProjectDirs;
use match_content::SelectionMode;

/// Settings for one headless match.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub seed: u64,
    /// TOML game config; built-in defaults when absent.
    pub config_path: Option<PathBuf>,
    /// RON roster; the embedded roster when absent.
    pub roster_path: Option<PathBuf>,
    pub selection: SelectionMode,
    pub save_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub max_turns: u32,
}

impl CliConfig {
    pub const DEFAULT_MAX_TURNS: u32 = 500;
    /// Slot the final position is saved under.
    pub const SAVE_SLOT: &'static str = "last";

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `MATCH_SEED` - Seed for team selection and the board (default: clock)
    /// - `MATCH_CONFIG` - Path to a TOML game config
    /// - `MATCH_ROSTER` - Path to a RON roster
    /// - `MATCH_SELECTION` - `draft`, `all_pick` or `random` (default: draft)
    /// - `MATCH_SAVE_DIR` - Directory for save data (default: platform-specific)
    /// - `MATCH_LOG_DIR` - Also write logs to this directory
    /// - `MATCH_MAX_TURNS` - Stop after this many turns (default: 500)
    pub fn from_env() -> Self {
        Self {
            seed: read_env("MATCH_SEED").unwrap_or_else(clock_seed),
            config_path: env::var_os("MATCH_CONFIG").map(PathBuf::from),
            roster_path: env::var_os("MATCH_ROSTER").map(PathBuf::from),
            selection: read_env("MATCH_SELECTION").unwrap_or_default(),
            save_dir: env::var_os("MATCH_SAVE_DIR").map(PathBuf::from),
            log_dir: env::var_os("MATCH_LOG_DIR").map(PathBuf::from),
            max_turns: read_env::<u32>("MATCH_MAX_TURNS")
                .unwrap_or(Self::DEFAULT_MAX_TURNS)
                .max(1),
        }
    }

    /// Explicit save directory, or the platform data directory.
    pub fn resolved_save_dir(&self) -> Option<PathBuf> {
        self.save_dir.clone().or_else(|| {
            ProjectDirs::from("", "", "match-battle").map(|dirs| dirs.data_dir().join("saves"))
        })
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            config_path: None,
            roster_path: None,
            selection: SelectionMode::default(),
            save_dir: None,
            log_dir: None,
            max_turns: Self::DEFAULT_MAX_TURNS,
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
