use super::player::Player;
use super::state::BoardLock;
use crate::board::{GridError, SwapError};
use crate::combatant::CombatantId;
use crate::config::ConfigError;
use crate::error::{ErrorSeverity, GameError};

/// A move that is not allowed in the current battle state.
///
/// Input requests treat these as silent no-ops; the lower-level move API
/// returns them so callers can tell why nothing happened.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("it is {owner}'s turn")]
    NotYourTurn { owner: Player },

    #[error("no moves remaining this turn")]
    NoMovesRemaining,

    #[error("board is locked ({0:?})")]
    BoardLocked(BoardLock),

    #[error("the battle is over")]
    GameOver,

    #[error("combatant {0} is not on the acting side")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} cannot evolve")]
    EvolutionUnavailable(CombatantId),

    #[error("combatant {0} cannot boost")]
    BoostUnavailable(CombatantId),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error(transparent)]
    Illegal(#[from] IllegalMove),
}

impl GameError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            MoveError::Swap(error) => error.severity(),
            MoveError::Illegal(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            MoveError::Swap(error) => error.error_code(),
            MoveError::Illegal(IllegalMove::NotYourTurn { .. }) => "MOVE_NOT_YOUR_TURN",
            MoveError::Illegal(IllegalMove::NoMovesRemaining) => "MOVE_NO_MOVES_REMAINING",
            MoveError::Illegal(IllegalMove::BoardLocked(_)) => "MOVE_BOARD_LOCKED",
            MoveError::Illegal(IllegalMove::GameOver) => "MOVE_GAME_OVER",
            MoveError::Illegal(IllegalMove::UnknownCombatant(_)) => "MOVE_UNKNOWN_COMBATANT",
            MoveError::Illegal(IllegalMove::EvolutionUnavailable(_)) => {
                "MOVE_EVOLUTION_UNAVAILABLE"
            }
            MoveError::Illegal(IllegalMove::BoostUnavailable(_)) => "MOVE_BOOST_UNAVAILABLE",
        }
    }
}

/// Why a battle could not be created.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{player} fields {size} monsters (allowed 1..={max})")]
    TeamSize { player: Player, size: usize, max: usize },

    #[error("board is {actual}x{actual}, config expects {expected}x{expected}")]
    BoardSizeMismatch { expected: u8, actual: u8 },

    #[error("{player}'s {name} has an ability that costs no mana")]
    ZeroManaCost { player: Player, name: String },
}

impl GameError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            SetupError::Config(error) => error.error_code(),
            SetupError::TeamSize { .. } => "SETUP_TEAM_SIZE",
            SetupError::BoardSizeMismatch { .. } => "SETUP_BOARD_SIZE",
            SetupError::ZeroManaCost { .. } => "SETUP_ZERO_MANA_COST",
        }
    }
}

/// Snapshot export or restore failure. A failed restore changes nothing.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("a move is still in progress")]
    NotSettled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("board has {empty} empty cells")]
    IncompleteBoard { empty: usize },

    #[error("{player} has {hp} HP (max {max})")]
    HpOutOfRange { player: Player, hp: u32, max: u32 },

    #[error("{player} has max HP {max}, config gives {expected}")]
    MaxHpMismatch { player: Player, max: u32, expected: u32 },

    #[error("combatant {id} has {mana} mana (capacity {capacity})")]
    ManaOutOfRange { id: CombatantId, mana: u32, capacity: u32 },

    #[error("combatant {id} has {berries} berries (cap {cap})")]
    BerriesOutOfRange { id: CombatantId, berries: u32, cap: u32 },

    #[error("combatant {0} has stats inconsistent with its evolution state")]
    EvolutionMismatch(CombatantId),

    #[error("combatant id {0} appears twice")]
    DuplicateCombatant(CombatantId),

    #[error("{player} fields {size} monsters (allowed 1..={max})")]
    TeamSize { player: Player, size: usize, max: usize },

    #[error("game-over phase does not match HP")]
    InconsistentPhase,
}

impl GameError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SnapshotError::NotSettled => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SnapshotError::NotSettled => "SNAPSHOT_NOT_SETTLED",
            SnapshotError::Config(_) => "SNAPSHOT_CONFIG",
            SnapshotError::Grid(_) => "SNAPSHOT_GRID",
            SnapshotError::IncompleteBoard { .. } => "SNAPSHOT_INCOMPLETE_BOARD",
            SnapshotError::HpOutOfRange { .. } => "SNAPSHOT_HP_RANGE",
            SnapshotError::MaxHpMismatch { .. } => "SNAPSHOT_MAX_HP",
            SnapshotError::ManaOutOfRange { .. } => "SNAPSHOT_MANA_RANGE",
            SnapshotError::BerriesOutOfRange { .. } => "SNAPSHOT_BERRY_RANGE",
            SnapshotError::EvolutionMismatch(_) => "SNAPSHOT_EVOLUTION",
            SnapshotError::DuplicateCombatant(_) => "SNAPSHOT_DUPLICATE_COMBATANT",
            SnapshotError::TeamSize { .. } => "SNAPSHOT_TEAM_SIZE",
            SnapshotError::InconsistentPhase => "SNAPSHOT_PHASE",
        }
    }
}
