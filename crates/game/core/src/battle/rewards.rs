use tracing::debug;

use super::engine::Battle;
use super::player::Player;
use crate::board::CascadeReport;
use crate::event::GameEvent;

impl Battle {
    /// Pays out one resolution to the turn owner's team.
    ///
    /// Each combat element feeds mana to the owner's combatants of that
    /// element; berries go to every combatant of the owner. A qualifying
    /// match grants the extra move unless one is already pending or the
    /// per-turn grant limit is spent.
    pub fn distribute_rewards(&mut self, report: &CascadeReport) {
        self.pay_out(report);
        if report.granted_extra_move {
            self.grant_extra_move(self.state.turn_owner);
        }
    }

    /// Mana and berries only; used once the turn has already ended.
    pub(super) fn pay_out(&mut self, report: &CascadeReport) {
        let player = self.state.turn_owner;
        let berry_cap = self.config.berry_cap();
        let mut events = Vec::new();

        for (element, count) in report.per_element.iter() {
            for monster in self.combatants.iter_mut().filter(|c| c.owner == player) {
                if element.is_bonus() {
                    monster.add_berries(count, berry_cap);
                    events.push(GameEvent::BerriesUpdated {
                        combatant: monster.id,
                        berries: monster.berry_count(),
                    });
                } else if monster.element == element {
                    monster.add_mana(count);
                    events.push(GameEvent::ManaUpdated {
                        combatant: monster.id,
                        mana: monster.current_mana(),
                        capacity: monster.mana_capacity(),
                    });
                }
            }
        }
        events.into_iter().for_each(|event| self.emit(event));
    }

    fn grant_extra_move(&mut self, player: Player) -> bool {
        if self.state.extra_move[player] {
            return false;
        }
        if self.state.extra_moves_granted >= self.config.max_extra_moves_per_turn {
            debug!(%player, "extra move limit reached this turn");
            return false;
        }
        self.state.extra_move[player] = true;
        self.state.extra_moves_granted += 1;
        debug!(%player, "extra move granted");
        self.emit(GameEvent::ExtraMoveGained { player });
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::battle::test_support::{heal, monster};
    use crate::battle::{Battle, BattleSetup, PerPlayer, Player};
    use crate::board::CascadeReport;
    use crate::combatant::{AbilityEffect, CombatantId};
    use crate::config::GameConfig;
    use crate::element::Element;
    use crate::event::RecordingSink;

    fn battle(sink: &RecordingSink) -> Battle {
        let teams = PerPlayer::new(
            vec![
                monster("Bonzumi", Element::Fire, 8, 10, AbilityEffect::MatchCross),
                monster("Pelijet", Element::Water, 6, 10, AbilityEffect::MatchCross),
            ],
            vec![heal("Turtlelisk", Element::Fire, 6)],
        );
        let setup = BattleSetup::new(GameConfig::default(), teams, Player::One, 42);
        Battle::new(setup, Box::new(sink.clone())).unwrap()
    }

    fn report(entries: &[(Element, u32)], extra: bool) -> CascadeReport {
        let mut report = CascadeReport::default();
        for (element, count) in entries {
            report.per_element.add(*element, *count);
        }
        report.granted_extra_move = extra;
        report
    }

    #[test]
    fn mana_goes_to_matching_elements_of_the_turn_owner() {
        let sink = RecordingSink::new();
        let mut battle = battle(&sink);
        battle.distribute_rewards(&report(&[(Element::Fire, 3), (Element::Earth, 5)], false));

        assert_eq!(battle.combatant(CombatantId(1)).unwrap().current_mana(), 3);
        assert_eq!(battle.combatant(CombatantId(2)).unwrap().current_mana(), 0);
        // Same element on the other side gets nothing.
        assert_eq!(battle.combatant(CombatantId(3)).unwrap().current_mana(), 0);
    }

    #[test]
    fn berries_go_to_the_whole_team_and_stop_at_the_cap() {
        let sink = RecordingSink::new();
        let mut battle = battle(&sink);
        battle.distribute_rewards(&report(&[(Element::Berry, 3)], false));
        battle.distribute_rewards(&report(&[(Element::Berry, 3)], false));

        for id in [CombatantId(1), CombatantId(2)] {
            assert_eq!(battle.combatant(id).unwrap().berry_count(), 4);
        }
        assert_eq!(battle.combatant(CombatantId(3)).unwrap().berry_count(), 0);
    }

    #[test]
    fn extra_move_does_not_stack() {
        let sink = RecordingSink::new();
        let mut battle = battle(&sink);
        sink.drain();
        battle.distribute_rewards(&report(&[(Element::Water, 4)], true));
        battle.distribute_rewards(&report(&[(Element::Water, 5)], true));

        assert!(battle.state().extra_move[Player::One]);
        assert_eq!(battle.state().extra_moves_granted, 1);
        let gained = sink
            .names()
            .into_iter()
            .filter(|name| *name == "extra_move_gained")
            .count();
        assert_eq!(gained, 1);
    }
}
