//! Async orchestration for match-3 battles.
//!
//! This crate wraps a [`match_core::Battle`] in a background worker, feeds it
//! moves from pluggable providers, and fans its notifications out to
//! subscribers. Consumers embed [`Runtime`] to play a whole match, or drive a
//! battle step by step through a cloneable [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`providers`] ships the built-in move providers
//! - [`repository`] persists battle snapshots
//! - `workers` keeps the session task internal to the crate
pub mod api;
pub mod events;
pub mod providers;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{
    AckBarrier, ActionProvider, BattleView, ImmediateBarrier, Result, RuntimeError,
    RuntimeHandle, SettleAck, SettleBarrier,
};
pub use events::{BusSink, Event, EventBus, Topic};
pub use providers::{AiProvider, ScriptedProvider};
pub use repository::{
    FileSnapshotRepository, InMemorySnapshotRepo, RepositoryError, SnapshotRepository,
};
pub use runtime::{MatchReport, Runtime, RuntimeBuilder, RuntimeConfig, StepOutcome};
