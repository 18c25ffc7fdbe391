use tracing::{debug, info};

use super::Phase;
use super::engine::{Battle, CascadeOrigin, Stage};
use super::player::Player;
use crate::combatant::{
    AbilityContext, AbilityTarget, BoardDirective, Combatant, CombatantId, EffectOutcome,
};
use crate::event::GameEvent;

impl Battle {
    /// Fires the next full-mana ability of the turn owner.
    ///
    /// Damage lands before the effect, and a knockout stops resolution on the
    /// spot. Board effects run as a cascade before the next ability.
    pub(super) fn resolve_next_ability(&mut self, mut fired: Vec<CombatantId>) -> Option<Phase> {
        let owner = self.state.turn_owner;
        let next = self.combatants.iter().position(|c| {
            c.owner == owner && !fired.contains(&c.id) && c.is_ability_ready()
        });

        let Some(index) = next else {
            self.stage = Some(Stage::TurnTransition);
            return None;
        };

        let caster_id = self.combatants[index].id;
        fired.push(caster_id);

        let targets: Vec<AbilityTarget> = self
            .combatants
            .iter()
            .filter(|c| c.owner != owner)
            .map(Combatant::as_target)
            .collect();
        let result = {
            let mut ctx = AbilityContext {
                relationships: &self.config.relationships,
                board_size: self.config.board_size,
                rng: &mut self.rng,
            };
            self.combatants[index].activate_ability(&targets, &mut ctx)
        };
        let Some(result) = result else {
            self.stage = Some(Stage::Abilities { fired });
            return None;
        };

        self.state.stats.abilities_cast += 1;
        info!(
            caster = %caster_id,
            ability = %result.ability,
            effect = result.effect.kind(),
            damage = result.damage,
            "ability activated"
        );
        let caster = &self.combatants[index];
        let mana = GameEvent::ManaUpdated {
            combatant: caster_id,
            mana: caster.current_mana(),
            capacity: caster.mana_capacity(),
        };
        self.emit(mana);
        self.emit(GameEvent::AbilityActivated {
            result: result.clone(),
        });

        if let Some(target) = result.target
            && result.damage > 0
            && self.strike(owner, target, result.damage)
        {
            return Some(Phase::Abilities);
        }

        match self.apply_effect(index, owner, result.outcome) {
            Some(BoardDirective::Clear { positions }) => {
                self.stage = Some(Stage::Cascade {
                    cascade: self.engine.start_forced(positions),
                    origin: CascadeOrigin::Ability { fired },
                    falls: Vec::new(),
                });
            }
            Some(BoardDirective::Convert { positions, element }) => {
                for pos in positions {
                    self.grid.retype(pos, element);
                }
                self.stage = Some(Stage::Cascade {
                    cascade: self.engine.start(),
                    origin: CascadeOrigin::Ability { fired },
                    falls: Vec::new(),
                });
            }
            None => self.stage = Some(Stage::Abilities { fired }),
        }
        Some(Phase::Abilities)
    }

    /// Applies ability damage to `target`; returns whether the game ended.
    fn strike(&mut self, attacker: Player, target: CombatantId, damage: u32) -> bool {
        let Some(defender) = self.combatant(target) else {
            return false;
        };
        let actual = defender.take_damage(damage);
        let defending = defender.owner;

        self.emit(GameEvent::MonsterDamaged {
            combatant: target,
            amount: actual,
        });
        self.state.stats.damage_dealt[attacker] += actual;
        self.state.damage(defending, actual);
        self.emit_hp(defending);
        self.check_defeat(defending)
    }

    /// Carries out a non-damage outcome; board work is handed back.
    fn apply_effect(
        &mut self,
        caster: usize,
        owner: Player,
        outcome: EffectOutcome,
    ) -> Option<BoardDirective> {
        let caster_id = self.combatants[caster].id;
        let mut events = Vec::new();

        match outcome {
            EffectOutcome::Board(directive) => return Some(directive),
            EffectOutcome::HealOwner { amount } => {
                self.state.heal(owner, amount);
                self.emit_hp(owner);
            }
            EffectOutcome::ApplyStatus { on, status } => {
                if let Some(target) = self.combatants.iter_mut().find(|c| c.id == on)
                    && !target.apply_status(status)
                {
                    debug!(combatant = %on, "status effect dropped; list full");
                }
            }
            EffectOutcome::DrainOpponents { amount } => {
                for monster in self.combatants.iter_mut().filter(|c| c.owner != owner) {
                    monster.drain_mana(amount);
                    events.push(GameEvent::ManaUpdated {
                        combatant: monster.id,
                        mana: monster.current_mana(),
                        capacity: monster.mana_capacity(),
                    });
                }
            }
            EffectOutcome::GiveAllies { amount } => {
                for monster in self
                    .combatants
                    .iter_mut()
                    .filter(|c| c.owner == owner && c.id != caster_id)
                {
                    monster.add_mana(amount);
                    events.push(GameEvent::ManaUpdated {
                        combatant: monster.id,
                        mana: monster.current_mana(),
                        capacity: monster.mana_capacity(),
                    });
                }
            }
            EffectOutcome::NoTarget => {
                debug!(combatant = %caster_id, "ability effect had no target");
            }
        }

        events.into_iter().for_each(|event| self.emit(event));
        None
    }
}
