//! Battling monsters: mana, berries, status effects, and the ability interpreter.
//!
//! A [`Combatant`] never touches the board or the other side directly. Its
//! ability interpreter returns an [`AbilityResult`] describing what should
//! happen, and the battle applies it.
mod ability;
mod stats;
mod status;

use core::fmt;

pub use ability::{
    Ability, AbilityBoost, AbilityEffect, AbilityResult, BoardDirective, EffectOutcome,
    EvolutionDescriptor,
};
pub use stats::{CombatStats, Stat, StatBoosts};
pub use status::{ProcessedEffect, StatusEffect, StatusEffects, StatusKind};

use crate::battle::Player;
use crate::board::Position;
use crate::element::{Effectiveness, Element, ElementRelationships};
use crate::env::{GameRng, RollContext};

/// Stable id of a combatant within one battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Roster entry a combatant is created from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonsterTemplate {
    pub species_id: u32,
    pub name: String,
    pub element: Element,
    pub base_stats: CombatStats,
    pub ability: Ability,
    #[cfg_attr(feature = "serde", serde(default))]
    pub evolution: Option<EvolutionDescriptor>,
}

/// What the ability interpreter needs to know about a potential target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilityTarget {
    pub id: CombatantId,
    pub owner: Player,
    pub element: Element,
}

/// Inputs of the ability interpreter beyond the caster itself.
pub struct AbilityContext<'a> {
    pub relationships: &'a ElementRelationships,
    pub board_size: u8,
    pub rng: &'a mut GameRng,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub species_id: u32,
    pub name: String,
    pub element: Element,
    pub owner: Player,
    pub base_stats: CombatStats,
    pub current_stats: CombatStats,
    pub ability: Ability,
    /// Pending evolution; consumed by [`Combatant::evolve`].
    pub evolution: Option<EvolutionDescriptor>,
    /// The evolution that has been applied, if any.
    pub applied_evolution: Option<EvolutionDescriptor>,
    pub evolved: bool,
    current_mana: u32,
    berry_count: u32,
    status_effects: StatusEffects,
}

impl Combatant {
    pub fn from_template(id: CombatantId, owner: Player, template: &MonsterTemplate) -> Self {
        Self {
            id,
            species_id: template.species_id,
            name: template.name.clone(),
            element: template.element,
            owner,
            base_stats: template.base_stats,
            current_stats: template.base_stats,
            ability: template.ability.clone(),
            evolution: template.evolution.clone(),
            applied_evolution: None,
            evolved: false,
            current_mana: 0,
            berry_count: 0,
            status_effects: StatusEffects::new(),
        }
    }

    /// Evolved name once evolved.
    pub fn display_name(&self) -> &str {
        match &self.applied_evolution {
            Some(evolution) => &evolution.name,
            None => &self.name,
        }
    }

    pub fn as_target(&self) -> AbilityTarget {
        AbilityTarget {
            id: self.id,
            owner: self.owner,
            element: self.element,
        }
    }

    pub fn effective_stats(&self) -> CombatStats {
        self.status_effects.modify(self.current_stats)
    }

    pub fn status_effects(&self) -> &StatusEffects {
        &self.status_effects
    }

    // ========================================================================
    // Mana
    // ========================================================================

    pub fn mana_capacity(&self) -> u32 {
        self.current_stats.mana_cost
    }

    pub fn current_mana(&self) -> u32 {
        self.current_mana
    }

    /// Adds mana up to capacity; returns whether the pool is now full.
    pub fn add_mana(&mut self, amount: u32) -> bool {
        self.current_mana = self
            .current_mana
            .saturating_add(amount)
            .min(self.mana_capacity());
        self.is_ability_ready()
    }

    /// Removes up to `amount`; returns how much was removed.
    pub fn drain_mana(&mut self, amount: u32) -> u32 {
        let drained = amount.min(self.current_mana);
        self.current_mana -= drained;
        drained
    }

    pub fn reset_mana(&mut self) {
        self.current_mana = 0;
    }

    pub fn is_ability_ready(&self) -> bool {
        self.current_mana >= self.mana_capacity()
    }

    // ========================================================================
    // Berries, evolution, boost
    // ========================================================================

    pub fn berry_count(&self) -> u32 {
        self.berry_count
    }

    /// Adds berries, stopping at `cap`; returns the new count.
    pub fn add_berries(&mut self, count: u32, cap: u32) -> u32 {
        self.berry_count = self.berry_count.saturating_add(count).min(cap);
        self.berry_count
    }

    pub fn can_evolve(&self, threshold: u32) -> bool {
        !self.evolved && self.evolution.is_some() && self.berry_count >= threshold
    }

    /// Applies the pending evolution. Returns false, changing nothing, when
    /// [`Combatant::can_evolve`] does not hold.
    pub fn evolve(&mut self, threshold: u32) -> bool {
        if !self.can_evolve(threshold) {
            return false;
        }
        let Some(evolution) = self.evolution.take() else {
            return false;
        };

        self.evolved = true;
        self.berry_count = 0;
        self.current_stats = self.current_stats.boosted(&evolution.stat_boosts);

        let boost = &evolution.ability_boost;
        self.ability.damage += boost.damage;
        if let Some(name) = &boost.name {
            self.ability.name = name.clone();
        }
        if let Some(effect) = &boost.effect {
            self.ability.effect = effect.clone();
        }

        self.applied_evolution = Some(evolution);
        true
    }

    pub fn can_boost(&self, threshold: u32) -> bool {
        self.evolved && self.berry_count >= threshold
    }

    /// Spends `threshold` berries for `mana` mana (capped at capacity).
    pub fn boost(&mut self, threshold: u32, mana: u32) -> bool {
        if !self.can_boost(threshold) {
            return false;
        }
        self.berry_count -= threshold;
        self.add_mana(mana);
        true
    }

    // ========================================================================
    // Damage and status effects
    // ========================================================================

    /// `max(1, amount - floor(defense / 3))` against effective defense.
    pub fn take_damage(&self, amount: u32) -> u32 {
        let mitigation = self.effective_stats().defense / 3;
        amount.saturating_sub(mitigation).max(1)
    }

    pub fn apply_status(&mut self, effect: StatusEffect) -> bool {
        self.status_effects.push(effect)
    }

    /// Ticks every status effect once and removes the expired ones.
    ///
    /// Damage-over-time is reported after this combatant's defense; the
    /// battle applies the per-tick values to player HP and move budgets.
    pub fn process_status_effects(&mut self) -> Vec<ProcessedEffect> {
        let mitigation = self.effective_stats().defense / 3;
        let mut processed = Vec::new();
        self.status_effects.tick(|effect| {
            let value = match effect.kind {
                StatusKind::DamageOverTime { damage } => damage.saturating_sub(mitigation).max(1),
                StatusKind::HealOverTime { amount } => amount,
                StatusKind::ExtraMove { moves } => u32::from(moves),
                StatusKind::Buff { amount, .. } | StatusKind::Debuff { amount, .. } => amount,
            };
            processed.push(ProcessedEffect {
                kind: effect.kind,
                value,
                turns_remaining: effect.turns_remaining,
            });
        });
        processed
    }

    // ========================================================================
    // Ability interpreter
    // ========================================================================

    /// Fires the ability if mana is full; `None` otherwise.
    ///
    /// The first opponent-owned entry of `targets` takes the damage. Mana is
    /// reset whenever the ability fires, whatever the effect resolves to.
    pub fn activate_ability(
        &mut self,
        targets: &[AbilityTarget],
        ctx: &mut AbilityContext<'_>,
    ) -> Option<AbilityResult> {
        if !self.is_ability_ready() {
            return None;
        }

        let target = targets.iter().find(|t| t.owner != self.owner).copied();
        let (damage, effectiveness) = match target {
            Some(target) => {
                let effectiveness = ctx.relationships.effectiveness(self.element, target.element);
                (effectiveness.apply(self.ability.damage), effectiveness)
            }
            None => (0, Effectiveness::Neutral),
        };

        let effect = self.ability.effect.clone();
        let outcome = if target.is_none() && !effect.is_target_independent() {
            EffectOutcome::NoTarget
        } else {
            self.interpret(&effect, target.map(|t| t.id), ctx)
        };

        self.reset_mana();

        Some(AbilityResult {
            caster: self.id,
            ability: self.ability.name.clone(),
            target: target.map(|t| t.id),
            damage,
            effectiveness,
            effect,
            outcome,
        })
    }

    fn interpret(
        &self,
        effect: &AbilityEffect,
        target: Option<CombatantId>,
        ctx: &mut AbilityContext<'_>,
    ) -> EffectOutcome {
        let size = ctx.board_size;
        let source = Some(self.id);
        let on_target = |status: StatusKind, duration: u8| match target {
            Some(on) => EffectOutcome::ApplyStatus {
                on,
                status: StatusEffect::new(status, duration, source),
            },
            None => EffectOutcome::NoTarget,
        };

        match *effect {
            AbilityEffect::MatchColumn { columns } => {
                let picked = ctx
                    .rng
                    .sample_distinct(RollContext::Ability, usize::from(size), usize::from(columns));
                let positions = picked
                    .into_iter()
                    .flat_map(|col| (0..size).map(move |row| Position::new(row, col as u8)))
                    .collect();
                EffectOutcome::Board(BoardDirective::Clear { positions })
            }
            AbilityEffect::MatchRow { rows } => {
                let picked = ctx
                    .rng
                    .sample_distinct(RollContext::Ability, usize::from(size), usize::from(rows));
                let positions = picked
                    .into_iter()
                    .flat_map(|row| (0..size).map(move |col| Position::new(row as u8, col)))
                    .collect();
                EffectOutcome::Board(BoardDirective::Clear { positions })
            }
            AbilityEffect::MatchGrid { width, height } => {
                let width = width.clamp(1, size);
                let height = height.clamp(1, size);
                let top = ctx
                    .rng
                    .below(RollContext::Ability, usize::from(size - height) + 1) as u8;
                let left = ctx
                    .rng
                    .below(RollContext::Ability, usize::from(size - width) + 1) as u8;
                let positions = (top..top + height)
                    .flat_map(|row| (left..left + width).map(move |col| Position::new(row, col)))
                    .collect();
                EffectOutcome::Board(BoardDirective::Clear { positions })
            }
            AbilityEffect::MatchCross => {
                let row = ctx.rng.below(RollContext::Ability, usize::from(size)) as u8;
                let col = ctx.rng.below(RollContext::Ability, usize::from(size)) as u8;
                let mut positions: Vec<Position> =
                    (0..size).map(|c| Position::new(row, c)).collect();
                positions.extend((0..size).filter(|r| *r != row).map(|r| Position::new(r, col)));
                EffectOutcome::Board(BoardDirective::Clear { positions })
            }
            AbilityEffect::ConvertTiles { element, count } => {
                let cells = usize::from(size) * usize::from(size);
                let positions = ctx
                    .rng
                    .sample_distinct(RollContext::Ability, cells, usize::from(count))
                    .into_iter()
                    .map(|index| {
                        let size = usize::from(size);
                        Position::new((index / size) as u8, (index % size) as u8)
                    })
                    .collect();
                EffectOutcome::Board(BoardDirective::Convert { positions, element })
            }
            AbilityEffect::Heal { amount } => EffectOutcome::HealOwner { amount },
            AbilityEffect::HealOverTime { amount, duration } => EffectOutcome::ApplyStatus {
                on: self.id,
                status: StatusEffect::new(StatusKind::HealOverTime { amount }, duration, source),
            },
            AbilityEffect::DrainMana { amount } => EffectOutcome::DrainOpponents { amount },
            AbilityEffect::GiveMana { amount } => EffectOutcome::GiveAllies { amount },
            AbilityEffect::ExtraMove { moves, duration } => EffectOutcome::ApplyStatus {
                on: self.id,
                status: StatusEffect::new(StatusKind::ExtraMove { moves }, duration.max(1), source),
            },
            AbilityEffect::DamageOverTime { damage, duration } => {
                on_target(StatusKind::DamageOverTime { damage }, duration)
            }
            AbilityEffect::Buff {
                stat,
                amount,
                duration,
            } => on_target(StatusKind::Buff { stat, amount }, duration),
            AbilityEffect::Debuff {
                stat,
                amount,
                duration,
            } => on_target(StatusKind::Debuff { stat, amount }, duration),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn template(element: Element, mana_cost: u32, effect: AbilityEffect) -> MonsterTemplate {
        MonsterTemplate {
            species_id: 1,
            name: "Bonzumi".into(),
            element,
            base_stats: CombatStats::new(25, 8, 5, mana_cost),
            ability: Ability {
                name: "Flare".into(),
                damage: 20,
                effect,
            },
            evolution: Some(EvolutionDescriptor {
                name: "Bonzire".into(),
                species_id: Some(2),
                stat_boosts: StatBoosts {
                    hp: 5,
                    attack: 3,
                    defense: 2,
                    mana_cost: 0,
                },
                ability_boost: AbilityBoost {
                    damage: 5,
                    name: Some("Flare+".into()),
                    effect: Some(AbilityEffect::MatchColumn { columns: 2 }),
                },
            }),
        }
    }

    fn fire(mana_cost: u32) -> Combatant {
        Combatant::from_template(
            CombatantId(1),
            Player::One,
            &template(
                Element::Fire,
                mana_cost,
                AbilityEffect::MatchColumn { columns: 1 },
            ),
        )
    }

    fn opponent(element: Element) -> AbilityTarget {
        AbilityTarget {
            id: CombatantId(9),
            owner: Player::Two,
            element,
        }
    }

    fn activate(caster: &mut Combatant, targets: &[AbilityTarget]) -> Option<AbilityResult> {
        let relationships = ElementRelationships::default();
        let mut rng = GameRng::new(1);
        let mut ctx = AbilityContext {
            relationships: &relationships,
            board_size: 8,
            rng: &mut rng,
        };
        caster.activate_ability(targets, &mut ctx)
    }

    #[test]
    fn mana_never_exceeds_capacity() {
        let mut monster = fire(8);
        for amount in [3, 0, 4, 7, 100] {
            monster.add_mana(amount);
            assert!(monster.current_mana() <= monster.mana_capacity());
        }
        assert!(monster.is_ability_ready());
    }

    #[test]
    fn add_mana_reports_when_full() {
        let mut monster = fire(8);
        assert!(!monster.add_mana(5));
        assert!(monster.add_mana(5));
        assert_eq!(monster.current_mana(), 8);
    }

    #[test]
    fn full_mana_activation_resets_and_second_call_is_none() {
        let mut monster = fire(8);
        monster.add_mana(8);
        assert_eq!(monster.current_mana(), 8);

        let result = activate(&mut monster, &[opponent(Element::Earth)]);
        let result = result.expect("ability should fire at full mana");
        assert_eq!(monster.current_mana(), 0);
        assert_eq!(result.damage, 30);
        assert_eq!(result.effectiveness, Effectiveness::Strong);
        assert_eq!(result.target, Some(CombatantId(9)));

        assert!(activate(&mut monster, &[opponent(Element::Earth)]).is_none());
    }

    #[test]
    fn ability_below_full_mana_is_a_no_op() {
        let mut monster = fire(8);
        monster.add_mana(7);
        assert!(activate(&mut monster, &[opponent(Element::Water)]).is_none());
        assert_eq!(monster.current_mana(), 7);
    }

    #[test]
    fn match_column_targets_whole_columns() {
        let mut monster = fire(8);
        monster.add_mana(8);
        let result = activate(&mut monster, &[opponent(Element::Fire)]).unwrap();
        let EffectOutcome::Board(BoardDirective::Clear { positions }) = result.outcome else {
            panic!("expected a clear directive");
        };
        assert_eq!(positions.len(), 8);
        let col = positions[0].col;
        assert!(positions.iter().all(|p| p.col == col));
    }

    #[test]
    fn target_dependent_effect_without_opponent_still_resets_mana() {
        let mut monster = fire(8);
        monster.add_mana(8);
        let ally = AbilityTarget {
            id: CombatantId(2),
            owner: Player::One,
            element: Element::Water,
        };
        let result = activate(&mut monster, &[ally]).unwrap();
        assert_eq!(result.outcome, EffectOutcome::NoTarget);
        assert_eq!(result.target, None);
        assert_eq!(monster.current_mana(), 0);
    }

    #[test]
    fn heal_needs_no_opponent() {
        let mut monster = Combatant::from_template(
            CombatantId(3),
            Player::One,
            &template(Element::Earth, 6, AbilityEffect::Heal { amount: 10 }),
        );
        monster.add_mana(6);
        let result = activate(&mut monster, &[]).unwrap();
        assert_eq!(result.outcome, EffectOutcome::HealOwner { amount: 10 });
        assert_eq!(result.damage, 0);
    }

    #[test]
    fn evolution_gating_and_application() {
        let mut monster = fire(8);
        monster.add_berries(4, 4);
        assert!(monster.can_evolve(4));
        assert!(monster.evolve(4));
        assert!(monster.evolved);
        assert_eq!(monster.berry_count(), 0);
        assert!(!monster.can_evolve(4));
        assert_eq!(monster.current_stats, CombatStats::new(30, 11, 7, 8));
        assert_eq!(monster.ability.damage, 25);
        assert_eq!(monster.ability.name, "Flare+");
        assert_eq!(
            monster.ability.effect,
            AbilityEffect::MatchColumn { columns: 2 }
        );
        assert_eq!(monster.display_name(), "Bonzire");
        assert!(monster.evolution.is_none());
        assert!(!monster.evolve(4));
    }

    #[test]
    fn evolve_without_berries_changes_nothing() {
        let mut monster = fire(8);
        monster.add_berries(3, 4);
        let before = monster.clone();
        assert!(!monster.evolve(4));
        assert_eq!(monster, before);
    }

    #[test]
    fn boost_requires_evolution_and_berries() {
        let mut monster = fire(8);
        monster.add_berries(4, 4);
        assert!(!monster.can_boost(4));
        assert!(monster.evolve(4));
        assert!(!monster.boost(4, 4));
        monster.add_berries(4, 4);
        monster.add_mana(6);
        assert!(monster.boost(4, 4));
        assert_eq!(monster.berry_count(), 0);
        assert_eq!(monster.current_mana(), 8);
    }

    #[test]
    fn take_damage_is_at_least_one() {
        let monster = fire(8);
        assert_eq!(monster.take_damage(20), 19);
        assert_eq!(monster.take_damage(0), 1);
        assert_eq!(monster.take_damage(1), 1);
    }

    #[test]
    fn status_effects_tick_and_expire() {
        let mut monster = fire(8);
        monster.apply_status(StatusEffect::new(
            StatusKind::DamageOverTime { damage: 5 },
            2,
            None,
        ));
        monster.apply_status(StatusEffect::new(
            StatusKind::HealOverTime { amount: 3 },
            1,
            None,
        ));

        let first = monster.process_status_effects();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].value, 4);
        assert!(!first[0].expired());
        assert!(first[1].expired());
        assert_eq!(monster.status_effects().len(), 1);

        let second = monster.process_status_effects();
        assert_eq!(second.len(), 1);
        assert!(monster.status_effects().is_empty());
        assert!(monster.process_status_effects().is_empty());
    }

    #[test]
    fn debuff_lowers_effective_defense() {
        let mut monster = fire(8);
        monster.apply_status(StatusEffect::new(
            StatusKind::Debuff {
                stat: Stat::Defense,
                amount: 5,
            },
            2,
            None,
        ));
        assert_eq!(monster.take_damage(20), 20);
    }

    #[test]
    fn extra_move_ability_becomes_a_status_on_the_caster() {
        let mut monster = Combatant::from_template(
            CombatantId(4),
            Player::One,
            &template(
                Element::Electric,
                5,
                AbilityEffect::ExtraMove {
                    moves: 1,
                    duration: 2,
                },
            ),
        );
        monster.add_mana(5);
        let result = activate(&mut monster, &[]).unwrap();
        let EffectOutcome::ApplyStatus { on, status } = result.outcome else {
            panic!("expected a status on the caster");
        };
        assert_eq!(on, monster.id);
        assert_eq!(status.kind, StatusKind::ExtraMove { moves: 1 });
        assert_eq!(status.turns_remaining, 2);
    }
}
