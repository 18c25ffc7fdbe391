//! Deterministic match-3 board rules and the monster battle built on them.
//!
//! `match-core` owns the canonical rules: the grid and its cascades, the
//! combatant model, and the two-player [`Battle`] state machine. It performs
//! no I/O. Randomness flows through seeded [`GameRng`] streams and every
//! observable change is reported to an [`EventSink`], so runtimes and tests
//! drive the same code.
pub mod battle;
pub mod board;
pub mod combatant;
pub mod config;
pub mod element;
pub mod env;
pub mod error;
pub mod event;

pub use battle::{
    Battle, BattlePhase, BattleSetup, BattleSnapshot, BattleState, BattleStats, BoardLock,
    IllegalMove, Move, MoveError, MoveOutcome, MoveResponse, PerPlayer, Phase, PhaseReport,
    Player, SetupError, SnapshotError,
};
pub use board::{
    CascadeEngine, CascadeReport, Grid, GridError, Match, MatchResolver, Position, PossibleMove,
    SwapController, SwapError, SwapResult, Tile,
};
pub use combatant::{
    Ability, AbilityEffect, AbilityResult, CombatStats, Combatant, CombatantId,
    EvolutionDescriptor, MonsterTemplate, StatusEffect,
};
pub use config::{ConfigError, GameConfig};
pub use element::{Effectiveness, Element, ElementRelationships, ElementWeights};
pub use env::{GameRng, RngState, ScriptedTiles, TileSource, WeightedTiles};
pub use error::{ErrorSeverity, GameError};
pub use event::{EventSink, GameEvent, NullSink, RecordingSink};
