//! Turn and move state machine tying the board to the combatants.
//!
//! A [`Battle`] owns the grid, every combatant, and the [`BattleState`].
//! Moves enter through [`Battle::submit`] and advance one phase per
//! [`Battle::step`]; [`Battle::apply_move`] drives a move to completion.
mod abilities;
mod engine;
mod errors;
mod player;
mod rewards;
mod snapshot;
mod state;

pub use engine::Battle;
pub use errors::{IllegalMove, MoveError, SetupError, SnapshotError};
pub use player::{PerPlayer, Player};
pub use snapshot::BattleSnapshot;
pub use state::{BattlePhase, BattleState, BattleStats, BoardLock};

use crate::board::{CascadeReport, Grid, Position};
use crate::combatant::{CombatantId, MonsterTemplate};
use crate::config::GameConfig;
use crate::element::Element;

/// A player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Move {
    Swap { a: Position, b: Position },
    Evolve(CombatantId),
    Boost(CombatantId),
}

impl Move {
    pub const fn swap(a: Position, b: Position) -> Self {
        Move::Swap { a, b }
    }
}

/// Observable phases of an in-flight move, in the order they can occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Swap,
    Resolve,
    Collapse,
    Refill,
    Abilities,
    TurnTransition,
}

/// Returned by [`Battle::step`] after each completed phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseReport {
    pub phase: Phase,
    /// Turn owner after the phase.
    pub player: Player,
    pub turn: u32,
    /// No further phase is pending.
    pub settled: bool,
}

/// What an accepted move did.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveOutcome {
    /// The swap made no match and was rolled back; no move was spent.
    Rejected,
    /// Aggregate of the cascade the swap started.
    Swapped { report: CascadeReport },
    Evolved { combatant: CombatantId },
    Boosted { combatant: CombatantId },
}

/// Result of an input request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveResponse {
    Applied(MoveOutcome),
    /// The battle was not accepting this input; nothing changed.
    Ignored,
}

impl MoveResponse {
    pub fn is_ignored(&self) -> bool {
        matches!(self, MoveResponse::Ignored)
    }
}

/// Everything needed to start a battle.
#[derive(Clone, Debug)]
pub struct BattleSetup {
    pub config: GameConfig,
    pub teams: PerPlayer<Vec<MonsterTemplate>>,
    pub first_player: Player,
    pub seed: u64,
    /// Starting board; generated from the seed when absent.
    pub board: Option<Grid>,
    /// Fixed refill sequence replacing weighted spawns.
    pub refill_script: Option<Vec<Element>>,
}

impl BattleSetup {
    pub fn new(
        config: GameConfig,
        teams: PerPlayer<Vec<MonsterTemplate>>,
        first_player: Player,
        seed: u64,
    ) -> Self {
        Self {
            config,
            teams,
            first_player,
            seed,
            board: None,
            refill_script: None,
        }
    }

    pub fn with_board(mut self, board: Grid) -> Self {
        self.board = Some(board);
        self
    }

    pub fn with_refill_script(mut self, script: impl IntoIterator<Item = Element>) -> Self {
        self.refill_script = Some(script.into_iter().collect());
        self
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::combatant::{Ability, AbilityEffect, CombatStats};

    pub(crate) fn monster(
        name: &str,
        element: Element,
        mana_cost: u32,
        damage: u32,
        effect: AbilityEffect,
    ) -> MonsterTemplate {
        MonsterTemplate {
            species_id: 1,
            name: name.into(),
            element,
            base_stats: CombatStats::new(30, 6, 6, mana_cost),
            ability: Ability {
                name: format!("{name} strike"),
                damage,
                effect,
            },
            evolution: None,
        }
    }

    pub(crate) fn heal(name: &str, element: Element, mana_cost: u32) -> MonsterTemplate {
        monster(name, element, mana_cost, 0, AbilityEffect::Heal { amount: 5 })
    }
}
