//! Headless match runner.
//!
//! Loads content, selects teams, and plays an AI-vs-AI battle through the
//! runtime. The final position is saved when a save directory is available.

pub mod config;
pub mod logging;
pub mod selection;

use std::sync::Arc;

use anyhow::{Context, Result};
use match_content::{ConfigLoader, Roster, RosterLoader};
use match_core::{BattleSetup, GameConfig, GameEvent, GameRng, Player};
use match_runtime::{
    AiProvider, FileSnapshotRepository, MatchReport, Runtime, RuntimeConfig, Topic,
};
use tokio::sync::broadcast::error::RecvError;

pub use config::CliConfig;

/// Plays one match to completion or the turn limit.
pub async fn play(config: &CliConfig) -> Result<MatchReport> {
    let game_config = match &config.config_path {
        Some(path) => ConfigLoader::load(path)?,
        None => GameConfig::default(),
    };
    let roster = match &config.roster_path {
        Some(path) => RosterLoader::load(path)?,
        None => Roster::builtin().context("embedded roster is invalid")?,
    };

    let mut rng = GameRng::new(config.seed);
    let teams = selection::pick_teams(&roster, config.selection, &mut rng)?;
    let setup = BattleSetup::new(game_config, teams.teams, teams.first_player, config.seed);

    let mut builder = Runtime::builder()
        .setup(setup)
        .config(RuntimeConfig {
            max_turns: Some(config.max_turns),
            ..RuntimeConfig::default()
        })
        .provider(Player::One, AiProvider::new())
        .provider(Player::Two, AiProvider::new());

    let save_dir = config.resolved_save_dir();
    if let Some(dir) = &save_dir {
        let repository = FileSnapshotRepository::new(dir)
            .with_context(|| format!("failed to open save directory {}", dir.display()))?;
        builder = builder.repository(Arc::new(repository));
    }

    let mut runtime = builder.build().await?;
    let narrator = tokio::spawn(narrate(runtime.handle().subscribe(Topic::Battle)));

    let report = runtime.run().await?;
    if save_dir.is_some() {
        runtime.save(CliConfig::SAVE_SLOT).await?;
    }
    runtime.shutdown().await?;
    narrator.await.context("event narrator panicked")?;

    Ok(report)
}

/// Logs the highlights of the battle topic until the bus closes.
async fn narrate(mut events: tokio::sync::broadcast::Receiver<match_runtime::Event>) {
    loop {
        match events.recv().await {
            Ok(event) => match event.game_event() {
                GameEvent::AbilityActivated { result } => {
                    tracing::info!(
                        caster = %result.caster,
                        ability = %result.ability,
                        damage = result.damage,
                        "ability"
                    );
                }
                GameEvent::MonsterEvolved { combatant, name } => {
                    tracing::info!(%combatant, %name, "evolved");
                }
                GameEvent::GameEnded { winner, summary } => {
                    tracing::info!(%winner, turns = summary.turns, moves = summary.moves, "game over");
                }
                _ => {}
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "narrator lagged behind the battle");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
