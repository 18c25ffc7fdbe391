//! Team selection: draft, all-pick, and random assignment.
//!
//! Every mode produces [`Teams`]: two teams of [`TEAM_SIZE`] monsters with no
//! element repeated within a team, plus the player who moves first.

use match_core::env::{GameRng, RollContext};
use match_core::{Element, MonsterTemplate, PerPlayer, Player};
use tracing::debug;

use crate::roster::Roster;

/// Monsters per team.
pub const TEAM_SIZE: usize = 2;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SelectionMode {
    #[default]
    Draft,
    AllPick,
    Random,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("it is {expected}'s pick, not {got}'s")]
    NotYourPick { expected: Player, got: Player },

    #[error("all picks have been made")]
    SelectionComplete,

    #[error("species {0} is not in the roster")]
    UnknownSpecies(u32),

    #[error("species {0} is no longer available")]
    Unavailable(u32),

    #[error("{player} already has a {element} monster")]
    DuplicateElement { player: Player, element: Element },

    #[error("{player} already has {max} monsters", max = TEAM_SIZE)]
    TeamFull { player: Player },

    #[error("selection is not complete")]
    Incomplete,

    #[error("roster cannot supply {max} monsters of distinct elements", max = TEAM_SIZE)]
    RosterTooSmall,
}

/// Result of a finished selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Teams {
    pub teams: PerPlayer<Vec<MonsterTemplate>>,
    pub first_player: Player,
}

fn duplicate_element(
    team: &[MonsterTemplate],
    player: Player,
    element: Element,
) -> Result<(), SelectionError> {
    if team.iter().any(|m| m.element == element) {
        return Err(SelectionError::DuplicateElement { player, element });
    }
    Ok(())
}

// ============================================================================
// Draft
// ============================================================================

/// Alternating picks from a shared pool.
///
/// Picks go first, second, second, first. A pick removes every monster of
/// its element from the pool, so no element appears twice across both teams.
/// The player who picks last moves first.
#[derive(Clone, Debug)]
pub struct Draft<'r> {
    roster: &'r Roster,
    pool: Vec<u32>,
    order: [Player; 2 * TEAM_SIZE],
    picks: PerPlayer<Vec<MonsterTemplate>>,
    made: usize,
}

impl<'r> Draft<'r> {
    pub fn new(roster: &'r Roster, first: Player) -> Self {
        let second = first.other();
        Self {
            roster,
            pool: roster.templates().iter().map(|t| t.species_id).collect(),
            order: [first, second, second, first],
            picks: PerPlayer::default(),
            made: 0,
        }
    }

    /// Whose pick it is, or `None` once the draft is complete.
    pub fn current_player(&self) -> Option<Player> {
        self.order.get(self.made).copied()
    }

    pub fn available(&self) -> impl Iterator<Item = &'r MonsterTemplate> + '_ {
        let roster = self.roster;
        self.pool.iter().filter_map(move |id| roster.get(*id))
    }

    pub fn picks(&self) -> &PerPlayer<Vec<MonsterTemplate>> {
        &self.picks
    }

    pub fn pick(&mut self, player: Player, species_id: u32) -> Result<(), SelectionError> {
        let expected = self
            .current_player()
            .ok_or(SelectionError::SelectionComplete)?;
        if expected != player {
            return Err(SelectionError::NotYourPick {
                expected,
                got: player,
            });
        }
        let roster = self.roster;
        let template = roster
            .get(species_id)
            .ok_or(SelectionError::UnknownSpecies(species_id))?;
        if !self.pool.contains(&species_id) {
            return Err(SelectionError::Unavailable(species_id));
        }

        let element = template.element;
        self.pool
            .retain(|id| roster.get(*id).is_some_and(|t| t.element != element));
        self.picks[player].push(template.clone());
        self.made += 1;
        debug!(%player, monster = %template.name, %element, "draft pick");
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.made == self.order.len()
    }

    pub fn finish(self) -> Result<Teams, SelectionError> {
        if !self.is_complete() {
            return Err(SelectionError::Incomplete);
        }
        Ok(Teams {
            first_player: self.order[self.order.len() - 1],
            teams: self.picks,
        })
    }
}

// ============================================================================
// All-pick
// ============================================================================

/// Independent picks; both players may take the same species.
#[derive(Clone, Debug)]
pub struct AllPick<'r> {
    roster: &'r Roster,
    picks: PerPlayer<Vec<MonsterTemplate>>,
}

impl<'r> AllPick<'r> {
    pub fn new(roster: &'r Roster) -> Self {
        Self {
            roster,
            picks: PerPlayer::default(),
        }
    }

    /// Monsters `player` may still pick.
    pub fn available(&self, player: Player) -> impl Iterator<Item = &'r MonsterTemplate> + '_ {
        let team = &self.picks[player];
        let roster = self.roster;
        roster
            .templates()
            .iter()
            .filter(move |t| team.iter().all(|m| m.element != t.element))
    }

    pub fn picks(&self) -> &PerPlayer<Vec<MonsterTemplate>> {
        &self.picks
    }

    pub fn pick(&mut self, player: Player, species_id: u32) -> Result<(), SelectionError> {
        let roster = self.roster;
        let template = roster
            .get(species_id)
            .ok_or(SelectionError::UnknownSpecies(species_id))?;
        let team = &self.picks[player];
        if team.len() >= TEAM_SIZE {
            return Err(SelectionError::TeamFull { player });
        }
        duplicate_element(team, player, template.element)?;
        self.picks[player].push(template.clone());
        debug!(%player, monster = %template.name, "all-pick");
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        Player::BOTH
            .iter()
            .all(|p| self.picks[*p].len() == TEAM_SIZE)
    }

    /// Closes the selection; the first player is drawn from `rng`.
    pub fn finish(self, rng: &mut GameRng) -> Result<Teams, SelectionError> {
        if !self.is_complete() {
            return Err(SelectionError::Incomplete);
        }
        Ok(Teams {
            teams: self.picks,
            first_player: coin_flip(rng),
        })
    }
}

// ============================================================================
// Random
// ============================================================================

/// Two random monsters of different elements for each player.
pub fn random_teams(roster: &Roster, rng: &mut GameRng) -> Result<Teams, SelectionError> {
    let mut teams: PerPlayer<Vec<MonsterTemplate>> = PerPlayer::default();
    for player in Player::BOTH {
        let mut candidates: Vec<&MonsterTemplate> = roster.templates().iter().collect();
        rng.shuffle(RollContext::Selection, &mut candidates);
        for template in candidates {
            if teams[player].len() == TEAM_SIZE {
                break;
            }
            if duplicate_element(&teams[player], player, template.element).is_ok() {
                teams[player].push(template.clone());
            }
        }
        if teams[player].len() < TEAM_SIZE {
            return Err(SelectionError::RosterTooSmall);
        }
    }
    Ok(Teams {
        teams,
        first_player: coin_flip(rng),
    })
}

fn coin_flip(rng: &mut GameRng) -> Player {
    if rng.below(RollContext::Selection, 2) == 0 {
        Player::One
    } else {
        Player::Two
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_core::{Ability, AbilityEffect, CombatStats};

    fn roster() -> Roster {
        let entries = [
            (1, Element::Fire),
            (2, Element::Fire),
            (3, Element::Water),
            (4, Element::Earth),
            (5, Element::Electric),
            (6, Element::Psychic),
        ];
        Roster::new(
            entries
                .iter()
                .map(|(id, element)| MonsterTemplate {
                    species_id: *id,
                    name: format!("mon{id}"),
                    element: *element,
                    base_stats: CombatStats::new(20, 5, 5, 5),
                    ability: Ability {
                        name: "Poke".into(),
                        damage: 5,
                        effect: AbilityEffect::MatchCross,
                    },
                    evolution: None,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn draft_alternates_first_second_second_first() {
        let roster = roster();
        let mut draft = Draft::new(&roster, Player::Two);
        assert_eq!(draft.current_player(), Some(Player::Two));

        draft.pick(Player::Two, 1).unwrap();
        assert_eq!(draft.current_player(), Some(Player::One));
        draft.pick(Player::One, 3).unwrap();
        draft.pick(Player::One, 4).unwrap();
        assert_eq!(
            draft.pick(Player::One, 5),
            Err(SelectionError::NotYourPick {
                expected: Player::Two,
                got: Player::One
            })
        );
        draft.pick(Player::Two, 5).unwrap();
        assert_eq!(
            draft.pick(Player::Two, 6),
            Err(SelectionError::SelectionComplete)
        );

        let teams = draft.finish().unwrap();
        assert_eq!(teams.first_player, Player::Two);
        assert_eq!(teams.teams[Player::One].len(), TEAM_SIZE);
        assert_eq!(teams.teams[Player::Two].len(), TEAM_SIZE);
    }

    #[test]
    fn draft_pick_removes_its_element_from_the_pool() {
        let roster = roster();
        let mut draft = Draft::new(&roster, Player::One);
        draft.pick(Player::One, 1).unwrap();
        assert!(draft.available().all(|t| t.element != Element::Fire));
        assert_eq!(
            draft.pick(Player::Two, 2),
            Err(SelectionError::Unavailable(2))
        );
        assert_eq!(
            draft.pick(Player::Two, 99),
            Err(SelectionError::UnknownSpecies(99))
        );
    }

    #[test]
    fn incomplete_draft_cannot_finish() {
        let roster = roster();
        let draft = Draft::new(&roster, Player::One);
        assert_eq!(draft.finish(), Err(SelectionError::Incomplete));
    }

    #[test]
    fn all_pick_enforces_distinct_elements_per_player() {
        let roster = roster();
        let mut picks = AllPick::new(&roster);
        picks.pick(Player::One, 1).unwrap();
        assert_eq!(
            picks.pick(Player::One, 2),
            Err(SelectionError::DuplicateElement {
                player: Player::One,
                element: Element::Fire
            })
        );
        // The other player may take the same species.
        picks.pick(Player::Two, 1).unwrap();
        picks.pick(Player::One, 3).unwrap();
        assert_eq!(
            picks.pick(Player::One, 4),
            Err(SelectionError::TeamFull {
                player: Player::One
            })
        );
        assert!(picks.available(Player::Two).all(|t| t.element != Element::Fire));
        picks.pick(Player::Two, 3).unwrap();

        let teams = picks.finish(&mut GameRng::new(1)).unwrap();
        assert_eq!(teams.teams[Player::One], teams.teams[Player::Two]);
    }

    #[test]
    fn random_teams_have_distinct_elements() {
        let roster = roster();
        for seed in 0..20 {
            let teams = random_teams(&roster, &mut GameRng::new(seed)).unwrap();
            for player in Player::BOTH {
                let team = &teams.teams[player];
                assert_eq!(team.len(), TEAM_SIZE);
                assert_ne!(team[0].element, team[1].element);
            }
        }
    }

    #[test]
    fn random_teams_are_reproducible() {
        let roster = roster();
        let a = random_teams(&roster, &mut GameRng::new(7)).unwrap();
        let b = random_teams(&roster, &mut GameRng::new(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mode_parses_from_env_strings() {
        assert_eq!("all_pick".parse::<SelectionMode>(), Ok(SelectionMode::AllPick));
        assert_eq!("DRAFT".parse::<SelectionMode>(), Ok(SelectionMode::Draft));
        assert!("chaos".parse::<SelectionMode>().is_err());
    }
}
