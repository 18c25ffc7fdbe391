use crate::element::{ElementRelationships, ElementWeights};
use crate::error::{ErrorSeverity, GameError};

/// Game configuration constants and tunable parameters.
///
/// Supplied once at battle construction; the engine never mutates it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Board is `board_size × board_size`.
    pub board_size: u8,
    pub min_match_size: u8,
    /// Matches at least this long grant the extra move.
    pub extra_move_match_size: u8,
    /// How many times the extra move can be granted within a single turn.
    pub max_extra_moves_per_turn: u8,
    pub moves_per_turn: u8,
    pub starting_hp: u32,
    /// Added to the starting HP of whoever moves second.
    pub second_player_bonus_hp: u32,
    pub berries_for_evolution: u32,
    pub berries_for_boost: u32,
    pub mana_from_boost: u32,
    pub element_weights: ElementWeights,
    pub relationships: ElementRelationships,
    /// Cap on fill/shuffle retry loops before falling back.
    pub max_fill_attempts: u32,
    /// Cap on resolve rounds within one cascade.
    pub max_cascade_rounds: u32,
}

impl GameConfig {
    // ===== compile-time constants =====
    pub const MAX_BOARD_SIZE: u8 = 16;
    pub const MAX_STATUS_EFFECTS: usize = 8;
    pub const MAX_TEAM_SIZE: usize = 4;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_BOARD_SIZE: u8 = 8;
    pub const DEFAULT_MIN_MATCH_SIZE: u8 = 3;
    pub const DEFAULT_EXTRA_MOVE_MATCH_SIZE: u8 = 4;
    pub const DEFAULT_MAX_EXTRA_MOVES_PER_TURN: u8 = 1;
    pub const DEFAULT_MOVES_PER_TURN: u8 = 2;
    pub const DEFAULT_STARTING_HP: u32 = 30;
    pub const DEFAULT_SECOND_PLAYER_BONUS_HP: u32 = 5;
    pub const DEFAULT_BERRIES_FOR_EVOLUTION: u32 = 4;
    pub const DEFAULT_BERRIES_FOR_BOOST: u32 = 4;
    pub const DEFAULT_MANA_FROM_BOOST: u32 = 4;
    pub const DEFAULT_MAX_FILL_ATTEMPTS: u32 = 500;
    pub const DEFAULT_MAX_CASCADE_ROUNDS: u32 = 64;

    pub fn new() -> Self {
        Self {
            board_size: Self::DEFAULT_BOARD_SIZE,
            min_match_size: Self::DEFAULT_MIN_MATCH_SIZE,
            extra_move_match_size: Self::DEFAULT_EXTRA_MOVE_MATCH_SIZE,
            max_extra_moves_per_turn: Self::DEFAULT_MAX_EXTRA_MOVES_PER_TURN,
            moves_per_turn: Self::DEFAULT_MOVES_PER_TURN,
            starting_hp: Self::DEFAULT_STARTING_HP,
            second_player_bonus_hp: Self::DEFAULT_SECOND_PLAYER_BONUS_HP,
            berries_for_evolution: Self::DEFAULT_BERRIES_FOR_EVOLUTION,
            berries_for_boost: Self::DEFAULT_BERRIES_FOR_BOOST,
            mana_from_boost: Self::DEFAULT_MANA_FROM_BOOST,
            element_weights: ElementWeights::default(),
            relationships: ElementRelationships::default(),
            max_fill_attempts: Self::DEFAULT_MAX_FILL_ATTEMPTS,
            max_cascade_rounds: Self::DEFAULT_MAX_CASCADE_ROUNDS,
        }
    }

    pub fn with_board_size(mut self, board_size: u8) -> Self {
        self.board_size = board_size;
        self
    }

    /// Berries beyond this are useless, so accumulation stops here.
    pub fn berry_cap(&self) -> u32 {
        self.berries_for_evolution.max(self.berries_for_boost)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_match_size < 2 {
            return Err(ConfigError::MinMatchTooSmall(self.min_match_size));
        }
        if self.board_size < self.min_match_size || self.board_size > Self::MAX_BOARD_SIZE {
            return Err(ConfigError::BoardSize {
                size: self.board_size,
                min: self.min_match_size,
                max: Self::MAX_BOARD_SIZE,
            });
        }
        if self.moves_per_turn == 0 {
            return Err(ConfigError::NoMovesPerTurn);
        }
        if !self.element_weights.validate() {
            return Err(ConfigError::WeightsNotDistribution(
                self.element_weights.total(),
            ));
        }
        if self.max_fill_attempts == 0 || self.max_cascade_rounds == 0 {
            return Err(ConfigError::ZeroRetryCap);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejected configuration values.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("minimum match size {0} must be at least 2")]
    MinMatchTooSmall(u8),

    #[error("board size {size} must be within {min}..={max}")]
    BoardSize { size: u8, min: u8, max: u8 },

    #[error("moves per turn must be positive")]
    NoMovesPerTurn,

    #[error("element weights must be non-negative and sum to 1 (got {0})")]
    WeightsNotDistribution(f64),

    #[error("retry caps must be positive")]
    ZeroRetryCap,
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MinMatchTooSmall(_) => "CONFIG_MIN_MATCH",
            Self::BoardSize { .. } => "CONFIG_BOARD_SIZE",
            Self::NoMovesPerTurn => "CONFIG_MOVES_PER_TURN",
            Self::WeightsNotDistribution(_) => "CONFIG_WEIGHTS",
            Self::ZeroRetryCap => "CONFIG_RETRY_CAP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn board_smaller_than_match_is_rejected() {
        let config = GameConfig::new().with_board_size(2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BoardSize { size: 2, .. })
        ));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = GameConfig::new();
        config.element_weights.berry = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsNotDistribution(_))
        ));
    }

    #[test]
    fn berry_cap_is_largest_threshold() {
        let mut config = GameConfig::new();
        config.berries_for_boost = 6;
        assert_eq!(config.berry_cap(), 6);
    }
}
