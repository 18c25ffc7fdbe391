//! Data-driven ability descriptors and their evaluated outcomes.

use super::stats::{Stat, StatBoosts};
use super::status::StatusEffect;
use super::CombatantId;
use crate::board::Position;
use crate::element::{Effectiveness, Element};

/// What an ability does beyond its damage.
///
/// One variant per effect kind; the interpreter in
/// [`Combatant::activate_ability`](super::Combatant::activate_ability)
/// dispatches over it exhaustively.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEffect {
    /// Force-clear `columns` distinct random columns.
    MatchColumn { columns: u8 },
    /// Force-clear `rows` distinct random rows.
    MatchRow { rows: u8 },
    /// Force-clear a random `width × height` rectangle.
    MatchGrid { width: u8, height: u8 },
    /// Force-clear one row and one column crossing at a random cell.
    MatchCross,
    /// Retype `count` random tiles to `element`.
    ConvertTiles { element: Element, count: u8 },
    /// Restore HP to the caster's player.
    Heal { amount: u32 },
    /// Heal the caster's player at each of the caster's turn starts.
    HealOverTime { amount: u32, duration: u8 },
    /// Remove mana from every opposing combatant.
    DrainMana { amount: u32 },
    /// Add mana to every ally except the caster.
    GiveMana { amount: u32 },
    /// Grant `moves` at each of the caster's next `duration` turn starts
    /// (at least one).
    ExtraMove { moves: u8, duration: u8 },
    DamageOverTime { damage: u32, duration: u8 },
    Buff { stat: Stat, amount: u32, duration: u8 },
    Debuff { stat: Stat, amount: u32, duration: u8 },
}

impl AbilityEffect {
    /// Effects that act on the caster's side and never need an opponent.
    pub const fn is_target_independent(&self) -> bool {
        matches!(
            self,
            AbilityEffect::Heal { .. }
                | AbilityEffect::HealOverTime { .. }
                | AbilityEffect::ExtraMove { .. }
                | AbilityEffect::GiveMana { .. }
        )
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            AbilityEffect::MatchColumn { .. } => "match_column",
            AbilityEffect::MatchRow { .. } => "match_row",
            AbilityEffect::MatchGrid { .. } => "match_grid",
            AbilityEffect::MatchCross => "match_cross",
            AbilityEffect::ConvertTiles { .. } => "convert_tiles",
            AbilityEffect::Heal { .. } => "heal",
            AbilityEffect::HealOverTime { .. } => "heal_over_time",
            AbilityEffect::DrainMana { .. } => "drain_mana",
            AbilityEffect::GiveMana { .. } => "give_mana",
            AbilityEffect::ExtraMove { .. } => "extra_move",
            AbilityEffect::DamageOverTime { .. } => "damage_over_time",
            AbilityEffect::Buff { .. } => "buff",
            AbilityEffect::Debuff { .. } => "debuff",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ability {
    pub name: String,
    pub damage: u32,
    pub effect: AbilityEffect,
}

/// Ability changes applied on evolution.
///
/// `damage` adds to the current value; `name` and `effect` replace the
/// current ones wholesale when present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilityBoost {
    pub damage: u32,
    pub name: Option<String>,
    pub effect: Option<AbilityEffect>,
}

/// The one-time upgrade a base form can undergo.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionDescriptor {
    /// Name of the evolved form.
    pub name: String,
    /// Roster id of the evolved form, if it has its own entry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub species_id: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stat_boosts: StatBoosts,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability_boost: AbilityBoost,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Board mutation requested by an ability. Positions are already chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardDirective {
    /// Remove these tiles as if matched, then cascade.
    Clear { positions: Vec<Position> },
    /// Retype these tiles, then cascade any resulting matches.
    Convert {
        positions: Vec<Position>,
        element: Element,
    },
}

impl BoardDirective {
    pub fn positions(&self) -> &[Position] {
        match self {
            BoardDirective::Clear { positions } | BoardDirective::Convert { positions, .. } => {
                positions
            }
        }
    }
}

/// Side effect of an activation, applied by the battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectOutcome {
    Board(BoardDirective),
    HealOwner {
        amount: u32,
    },
    /// Attach `status` to combatant `on`.
    ApplyStatus {
        on: CombatantId,
        status: StatusEffect,
    },
    DrainOpponents {
        amount: u32,
    },
    GiveAllies {
        amount: u32,
    },
    /// Target-dependent effect with nobody to target.
    NoTarget,
}

/// Structured result of one ability activation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityResult {
    pub caster: CombatantId,
    pub ability: String,
    pub target: Option<CombatantId>,
    /// Elemental-adjusted damage before the target's defense.
    pub damage: u32,
    pub effectiveness: Effectiveness,
    pub effect: AbilityEffect,
    pub outcome: EffectOutcome,
}
