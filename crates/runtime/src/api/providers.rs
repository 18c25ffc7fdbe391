//! Asynchronous abstraction for sourcing player intent.
//!
//! Runtime users plug in [`ActionProvider`] implementations so a battle can
//! run with human input, scripted fixtures, or AI policies.
use async_trait::async_trait;
use match_core::{Move, Player};

use super::errors::Result;
use super::view::BattleView;

/// Trait for choosing a move from the current battle view.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - AI decisions
/// - Scripted/replayed moves
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Provide a move for `player`, who owns the current turn in `view`.
    async fn provide_move(&self, player: Player, view: &BattleView) -> Result<Move>;
}
