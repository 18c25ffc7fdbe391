//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, and action providers
//! so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use match_core::{Player, SetupError, SnapshotError, SwapError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no action provider set for {player}")]
    ProviderNotSet { player: Player },

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("runtime requires a battle setup or snapshot before building")]
    MissingBattle,

    #[error("runtime has no snapshot repository")]
    RepositoryNotSet,

    #[error("no snapshot saved under slot {0:?}")]
    SlotNotFound(String),

    #[error("failed to start battle")]
    Setup(#[from] SetupError),

    #[error("snapshot rejected")]
    Snapshot(#[from] SnapshotError),

    #[error("malformed swap")]
    Swap(#[from] SwapError),

    #[error("scripted provider for {player} ran out of moves")]
    ScriptExhausted { player: Player },

    #[error("{player} has no move to offer")]
    NoMoveAvailable { player: Player },

    #[error("{player} made no progress after {attempts} consecutive inputs")]
    Stalled { player: Player, attempts: u32 },
}
