//! Unattended team selection for headless matches.
use anyhow::{Context, Result};
use match_content::{AllPick, Draft, Roster, SelectionMode, TEAM_SIZE, Teams, random_teams};
use match_core::env::RollContext;
use match_core::{GameRng, MonsterTemplate, Player};
use tracing::info;

/// Strongest-looking monster first.
fn rating(template: &MonsterTemplate) -> u32 {
    let stats = &template.base_stats;
    stats.hp + 2 * stats.attack + stats.defense + template.ability.damage
}

fn best<'a>(candidates: impl Iterator<Item = &'a MonsterTemplate>) -> Option<u32> {
    let mut top: Option<&MonsterTemplate> = None;
    for candidate in candidates {
        if top.is_none_or(|t| rating(candidate) > rating(t)) {
            top = Some(candidate);
        }
    }
    top.map(|t| t.species_id)
}

/// Builds both teams with `mode`, each seat greedily taking its best option.
pub fn pick_teams(roster: &Roster, mode: SelectionMode, rng: &mut GameRng) -> Result<Teams> {
    let teams = match mode {
        SelectionMode::Random => random_teams(roster, rng)?,
        SelectionMode::Draft => {
            let first = if rng.below(RollContext::Selection, 2) == 0 {
                Player::One
            } else {
                Player::Two
            };
            let mut draft = Draft::new(roster, first);
            while let Some(player) = draft.current_player() {
                let species = best(draft.available()).context("draft pool ran dry")?;
                draft.pick(player, species)?;
            }
            draft.finish()?
        }
        SelectionMode::AllPick => {
            let mut picks = AllPick::new(roster);
            while !picks.is_complete() {
                for player in Player::BOTH {
                    if picks.picks()[player].len() < TEAM_SIZE {
                        let species = best(picks.available(player))
                            .context("roster has too few elements")?;
                        picks.pick(player, species)?;
                    }
                }
            }
            picks.finish(rng)?
        }
    };

    for player in Player::BOTH {
        let names: Vec<&str> = teams.teams[player].iter().map(|t| t.name.as_str()).collect();
        info!(%player, team = ?names, %mode, "team selected");
    }
    Ok(teams)
}
