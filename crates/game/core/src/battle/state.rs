//! Per-battle mutable state: HP, move budget, turn owner, locks, counters.

use bitflags::bitflags;

use super::player::{PerPlayer, Player};
use crate::config::GameConfig;

bitflags! {
    /// Reasons the board currently refuses input.
    ///
    /// Any set bit makes every move request a no-op.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BoardLock: u8 {
        const SHUFFLING     = 1 << 0;
        const CASCADING     = 1 << 1;
        /// Reported to the seat that is not the turn owner.
        const OPPONENT_TURN = 1 << 2;
        const PAUSED        = 1 << 3;
        const GAME_OVER     = 1 << 4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlePhase {
    PlayerTurn,
    MoveInProgress,
    GameOver { winner: Player },
}

/// Running totals reported with the final notification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleStats {
    pub turns: u32,
    pub moves: u32,
    pub matches: u32,
    pub damage_dealt: PerPlayer<u32>,
    pub evolutions: u32,
    pub boosts: u32,
    pub abilities_cast: u32,
    pub highest_cascade: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    pub hp: PerPlayer<u32>,
    /// Starting HP per seat; heals never exceed it.
    pub max_hp: PerPlayer<u32>,
    pub moves_remaining: PerPlayer<u8>,
    pub extra_move: PerPlayer<bool>,
    /// Extra moves granted during the current turn.
    pub extra_moves_granted: u8,
    pub first_player: Player,
    pub turn_owner: Player,
    /// 1-based; 0 before the first turn starts.
    pub turn: u32,
    pub phase: BattlePhase,
    pub lock: BoardLock,
    /// Resolve rounds of the current swap.
    pub cascade_count: u32,
    /// Matches resolved by the current swap.
    pub combo_count: u32,
    pub stats: BattleStats,
}

impl BattleState {
    /// Fresh state; the second seat gets the configured HP bonus.
    pub fn new(config: &GameConfig, first_player: Player) -> Self {
        let mut max_hp = PerPlayer::splat(config.starting_hp);
        max_hp[first_player.other()] += config.second_player_bonus_hp;
        Self {
            hp: max_hp,
            max_hp,
            moves_remaining: PerPlayer::splat(0),
            extra_move: PerPlayer::splat(false),
            extra_moves_granted: 0,
            first_player,
            turn_owner: first_player,
            turn: 0,
            phase: BattlePhase::PlayerTurn,
            lock: BoardLock::empty(),
            cascade_count: 0,
            combo_count: 0,
            stats: BattleStats::default(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, BattlePhase::GameOver { .. })
    }

    pub fn winner(&self) -> Option<Player> {
        match self.phase {
            BattlePhase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    /// Whether `player` still has a regular or extra move this turn.
    pub fn has_move(&self, player: Player) -> bool {
        self.moves_remaining[player] > 0 || self.extra_move[player]
    }

    /// Spends a regular move, or the extra move once regular ones are gone.
    pub(crate) fn consume_move(&mut self, player: Player) {
        if self.moves_remaining[player] > 0 {
            self.moves_remaining[player] -= 1;
        } else {
            self.extra_move[player] = false;
        }
        self.stats.moves += 1;
    }

    /// Locks as seen from `player`.
    pub fn lock_for(&self, player: Player) -> BoardLock {
        let mut lock = self.lock;
        if player != self.turn_owner {
            lock |= BoardLock::OPPONENT_TURN;
        }
        lock
    }

    /// Subtracts `amount` from `player`'s HP, stopping at zero.
    pub(crate) fn damage(&mut self, player: Player, amount: u32) -> u32 {
        self.hp[player] = self.hp[player].saturating_sub(amount);
        self.hp[player]
    }

    /// Adds `amount` to `player`'s HP, stopping at their starting HP.
    pub(crate) fn heal(&mut self, player: Player, amount: u32) -> u32 {
        self.hp[player] = self.hp[player].saturating_add(amount).min(self.max_hp[player]);
        self.hp[player]
    }
}
