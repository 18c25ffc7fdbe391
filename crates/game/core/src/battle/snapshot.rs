//! Settled-state export and all-or-nothing restore.

use std::collections::HashSet;

use tracing::info;

use super::engine::{Battle, TileFeed, tile_stream_seed};
use super::errors::SnapshotError;
use super::player::Player;
use super::state::{BattlePhase, BattleState, BoardLock};
use crate::board::Grid;
use crate::combatant::Combatant;
use crate::config::GameConfig;
use crate::element::Element;
use crate::env::{GameRng, RngState};
use crate::event::EventSink;

/// Everything needed to rebuild a settled battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSnapshot {
    pub config: GameConfig,
    /// Row-major cell contents.
    pub board: Vec<Option<Element>>,
    pub state: BattleState,
    pub combatants: Vec<Combatant>,
    pub rng: RngState,
    /// Absent when refills came from a script; a restore then spawns from a
    /// fresh weighted stream.
    pub tile_rng: Option<RngState>,
}

/// A snapshot that passed validation.
struct Validated {
    config: GameConfig,
    grid: Grid,
    state: BattleState,
    combatants: Vec<Combatant>,
    rng: GameRng,
    tiles: TileFeed,
}

impl Battle {
    /// Exports the battle. Only allowed between moves.
    pub fn snapshot(&self) -> Result<BattleSnapshot, SnapshotError> {
        if !self.is_settled() {
            return Err(SnapshotError::NotSettled);
        }
        Ok(BattleSnapshot {
            config: self.config.clone(),
            board: self.grid.elements(),
            state: self.state.clone(),
            combatants: self.combatants.clone(),
            rng: self.rng.state(),
            tile_rng: match &self.tiles {
                TileFeed::Weighted(rng) => Some(rng.state()),
                TileFeed::Scripted(_) => None,
            },
        })
    }

    /// Replaces this battle's board, state and combatants with `snapshot`.
    ///
    /// The snapshot is fully validated first; on error nothing changes.
    pub fn restore(&mut self, snapshot: BattleSnapshot) -> Result<(), SnapshotError> {
        let validated = validate(snapshot)?;
        self.install(validated);
        Ok(())
    }

    /// Builds a battle from a snapshot, delivering events to `sink`.
    pub fn from_snapshot(
        snapshot: BattleSnapshot,
        sink: Box<dyn EventSink>,
    ) -> Result<Self, SnapshotError> {
        let Validated {
            config,
            grid,
            state,
            combatants,
            rng,
            tiles,
        } = validate(snapshot)?;
        let mut battle = Self {
            engine: Self::engine_for(&config),
            config,
            grid,
            state,
            combatants,
            tiles,
            rng,
            stage: None,
            outcome: None,
            sink,
        };
        battle.announce_board();
        Ok(battle)
    }

    fn install(&mut self, validated: Validated) {
        self.engine = Self::engine_for(&validated.config);
        self.config = validated.config;
        self.grid = validated.grid;
        self.state = validated.state;
        self.combatants = validated.combatants;
        self.rng = validated.rng;
        self.tiles = validated.tiles;
        self.stage = None;
        self.outcome = None;
        info!(turn = self.state.turn, player = %self.state.turn_owner, "battle restored");
        self.announce_board();
    }
}

fn validate(snapshot: BattleSnapshot) -> Result<Validated, SnapshotError> {
    let BattleSnapshot {
        config,
        board,
        mut state,
        combatants,
        rng,
        tile_rng,
    } = snapshot;

    config.validate()?;

    let grid = Grid::from_elements(config.board_size, board)?;
    let empty = grid.empty_positions().len();
    if empty > 0 {
        return Err(SnapshotError::IncompleteBoard { empty });
    }

    let expected = BattleState::new(&config, state.first_player).max_hp;
    for player in Player::BOTH {
        let (hp, max) = (state.hp[player], state.max_hp[player]);
        if max != expected[player] {
            return Err(SnapshotError::MaxHpMismatch {
                player,
                max,
                expected: expected[player],
            });
        }
        if hp > max {
            return Err(SnapshotError::HpOutOfRange { player, hp, max });
        }
    }
    match state.phase {
        BattlePhase::GameOver { winner } if state.hp[winner.other()] == 0 => {}
        BattlePhase::PlayerTurn if Player::BOTH.iter().all(|p| state.hp[*p] > 0) => {}
        _ => return Err(SnapshotError::InconsistentPhase),
    }

    let mut seen = HashSet::new();
    for player in Player::BOTH {
        let size = combatants.iter().filter(|c| c.owner == player).count();
        if size == 0 || size > GameConfig::MAX_TEAM_SIZE {
            return Err(SnapshotError::TeamSize {
                player,
                size,
                max: GameConfig::MAX_TEAM_SIZE,
            });
        }
    }
    let berry_cap = config.berry_cap();
    for monster in &combatants {
        if !seen.insert(monster.id) {
            return Err(SnapshotError::DuplicateCombatant(monster.id));
        }
        check_combatant(monster, berry_cap)?;
    }

    // Transient locks never survive a settled point.
    state.lock &= BoardLock::PAUSED;
    if state.is_game_over() {
        state.lock.insert(BoardLock::GAME_OVER);
    }

    let tiles = TileFeed::Weighted(match tile_rng {
        Some(tile_rng) => GameRng::from_state(tile_rng),
        None => GameRng::new(tile_stream_seed(rng.seed)),
    });

    Ok(Validated {
        config,
        grid,
        state,
        combatants,
        rng: GameRng::from_state(rng),
        tiles,
    })
}

fn check_combatant(monster: &Combatant, berry_cap: u32) -> Result<(), SnapshotError> {
    let id = monster.id;
    let (mana, capacity) = (monster.current_mana(), monster.mana_capacity());
    if mana > capacity {
        return Err(SnapshotError::ManaOutOfRange { id, mana, capacity });
    }
    let berries = monster.berry_count();
    if berries > berry_cap {
        return Err(SnapshotError::BerriesOutOfRange {
            id,
            berries,
            cap: berry_cap,
        });
    }

    let consistent = match (&monster.applied_evolution, monster.evolved) {
        (Some(applied), true) => {
            monster.evolution.is_none()
                && monster.current_stats == monster.base_stats.boosted(&applied.stat_boosts)
        }
        (None, false) => monster.current_stats == monster.base_stats,
        _ => false,
    };
    if !consistent {
        return Err(SnapshotError::EvolutionMismatch(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::test_support::{heal, monster};
    use crate::battle::{BattleSetup, Move, PerPlayer};
    use crate::combatant::{AbilityEffect, CombatantId};
    use crate::event::{NullSink, RecordingSink};

    fn battle() -> Battle {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, AbilityEffect::MatchCross)],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let setup = BattleSetup::new(GameConfig::default(), teams, Player::One, 99);
        Battle::new(setup, Box::new(NullSink)).unwrap()
    }

    fn play_hint(battle: &mut Battle) {
        let player = battle.current_player();
        let hint = battle.request_show_hint(player).unwrap();
        battle
            .apply_move(player, Move::swap(hint.a, hint.b))
            .unwrap();
    }

    #[test]
    fn snapshot_requires_a_settled_battle() {
        let mut battle = battle();
        let hint = battle.request_show_hint(Player::One).unwrap();
        battle.submit(Player::One, Move::swap(hint.a, hint.b)).unwrap();
        assert_eq!(battle.snapshot(), Err(SnapshotError::NotSettled));
    }

    #[test]
    fn restored_battle_replays_identically() {
        let mut original = battle();
        play_hint(&mut original);
        let snapshot = original.snapshot().unwrap();

        let mut restored = Battle::from_snapshot(snapshot.clone(), Box::new(NullSink)).unwrap();
        assert_eq!(restored.snapshot().unwrap(), snapshot);

        play_hint(&mut original);
        play_hint(&mut restored);
        assert_eq!(original.grid().elements(), restored.grid().elements());
        assert_eq!(original.state(), restored.state());
    }

    #[test]
    fn invalid_snapshot_leaves_battle_untouched() {
        let mut battle = battle();
        let before = battle.snapshot().unwrap();

        let mut bad = before.clone();
        bad.state.hp[Player::One] = 999;
        assert!(matches!(
            battle.restore(bad),
            Err(SnapshotError::HpOutOfRange { hp: 999, .. })
        ));

        let mut bad = before.clone();
        bad.board[3] = None;
        assert_eq!(
            battle.restore(bad),
            Err(SnapshotError::IncompleteBoard { empty: 1 })
        );

        let mut bad = before.clone();
        bad.board.pop();
        assert!(matches!(battle.restore(bad), Err(SnapshotError::Grid(_))));

        assert_eq!(battle.snapshot().unwrap(), before);
    }

    #[test]
    fn inflated_max_hp_is_rejected() {
        let mut battle = battle();
        let before = battle.snapshot().unwrap();

        let mut bad = before.clone();
        bad.state.max_hp[Player::One] = 9999;
        bad.state.hp[Player::One] = 9999;
        assert_eq!(
            battle.restore(bad),
            Err(SnapshotError::MaxHpMismatch {
                player: Player::One,
                max: 9999,
                expected: 30,
            })
        );

        // The second seat's bonus is part of its expected maximum.
        let mut bad = before.clone();
        bad.state.max_hp[Player::Two] = 30;
        bad.state.hp[Player::Two] = 30;
        assert!(matches!(
            battle.restore(bad),
            Err(SnapshotError::MaxHpMismatch { player: Player::Two, expected: 35, .. })
        ));

        assert_eq!(battle.snapshot().unwrap(), before);
    }

    #[test]
    fn evolved_flag_must_match_applied_boosts() {
        let battle = battle();
        let mut bad = battle.snapshot().unwrap();
        bad.combatants[0].evolved = true;
        assert_eq!(
            validate(bad).err(),
            Some(SnapshotError::EvolutionMismatch(CombatantId(1)))
        );

        let mut bad = battle.snapshot().unwrap();
        bad.combatants[0].current_stats.attack += 3;
        assert_eq!(
            validate(bad).err(),
            Some(SnapshotError::EvolutionMismatch(CombatantId(1)))
        );
    }

    #[test]
    fn game_over_phase_must_match_hp() {
        let battle = battle();
        let mut bad = battle.snapshot().unwrap();
        bad.state.hp[Player::Two] = 0;
        assert_eq!(validate(bad).err(), Some(SnapshotError::InconsistentPhase));
    }

    #[test]
    fn restore_announces_the_board() {
        let mut battle = battle();
        let snapshot = battle.snapshot().unwrap();
        let sink = RecordingSink::new();
        let restored = Battle::from_snapshot(snapshot, Box::new(sink.clone())).unwrap();
        assert_eq!(sink.names()[0], "board_created");
        assert!(restored.is_settled());
        assert!(battle.restore(restored.snapshot().unwrap()).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_survives_json() {
        let mut battle = battle();
        play_hint(&mut battle);
        let snapshot = battle.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: BattleSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
