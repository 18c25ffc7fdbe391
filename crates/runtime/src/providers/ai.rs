//! Greedy heuristic opponent.
//!
//! Evolves whenever it can, then boosts, then plays the swap with the best
//! immediate score. It never looks past the current board. Evolving and
//! boosting need a regular move, so on the extra move it only swaps.

use async_trait::async_trait;
use tracing::debug;

use match_core::{Combatant, Element, GameConfig, Move, Player, PossibleMove};

use crate::api::{ActionProvider, BattleView, Result, RuntimeError};

/// Per-tile weight of any match.
const TILE_SCORE: i64 = 10;
/// Per-tile bonus when the tiles charge one of our monsters.
const OWN_MANA_SCORE: i64 = 20;
const BERRY_SCORE: i64 = 15;
const EXTRA_MOVE_SCORE: i64 = 30;
/// Bonus when a match brings a monster's ability within reach.
const NEAR_FULL_SCORE: i64 = 5;

#[derive(Clone, Copy, Debug, Default)]
pub struct AiProvider;

impl AiProvider {
    pub fn new() -> Self {
        Self
    }

    /// Picks a move for `player`, or `None` if the board offers nothing.
    pub fn choose(&self, player: Player, view: &BattleView) -> Option<Move> {
        let team: Vec<&Combatant> = view.team(player).collect();

        if view.state.moves_remaining[player] > 0 {
            if let Some(monster) = team
                .iter()
                .find(|c| c.can_evolve(view.config.berries_for_evolution))
            {
                return Some(Move::Evolve(monster.id));
            }

            if let Some(monster) = team
                .iter()
                .filter(|c| c.can_boost(view.config.berries_for_boost))
                .max_by_key(|c| c.current_mana())
            {
                return Some(Move::Boost(monster.id));
            }
        }

        best_swap(&view.moves, &team, &view.config).map(|m| Move::swap(m.a, m.b))
    }
}

#[async_trait]
impl ActionProvider for AiProvider {
    async fn provide_move(&self, player: Player, view: &BattleView) -> Result<Move> {
        let mv = self
            .choose(player, view)
            .ok_or(RuntimeError::NoMoveAvailable { player })?;
        debug!(%player, ?mv, "ai move");
        Ok(mv)
    }
}

/// First move with the strictly highest score.
fn best_swap<'a>(
    moves: &'a [PossibleMove],
    team: &[&Combatant],
    config: &GameConfig,
) -> Option<&'a PossibleMove> {
    let mut best: Option<(&PossibleMove, i64)> = None;
    for candidate in moves {
        let score = score_swap(candidate, team, config);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(m, _)| m)
}

pub(crate) fn score_swap(candidate: &PossibleMove, team: &[&Combatant], config: &GameConfig) -> i64 {
    let mut score = candidate.tile_count() as i64 * TILE_SCORE;

    for found in &candidate.matches {
        let tiles = found.size() as i64;
        if found.element == Element::Berry {
            score += tiles * BERRY_SCORE;
            continue;
        }
        for monster in team.iter().filter(|c| c.element == found.element) {
            score += tiles * OWN_MANA_SCORE;
            let after = monster.current_mana() + found.size() as u32;
            if !monster.is_ability_ready() && after >= monster.mana_capacity() {
                score += NEAR_FULL_SCORE;
            }
        }
    }

    if candidate.largest_match() >= usize::from(config.extra_move_match_size) {
        score += EXTRA_MOVE_SCORE;
    }
    score
}
