//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires up command/event channels, and
//! exposes a builder-based API for clients to play a battle to completion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use match_core::{
    Battle, BattleSetup, BattleSnapshot, BattleStats, Move, MoveOutcome, MoveResponse, PerPlayer,
    Player,
};

use crate::api::{
    ActionProvider, ImmediateBarrier, Result, RuntimeError, RuntimeHandle, SettleBarrier,
};
use crate::events::{BusSink, EventBus};
use crate::repository::SnapshotRepository;
use crate::workers::{Command, SessionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// [`Runtime::run`] stops once this turn would begin.
    pub max_turns: Option<u32>,
    /// Consecutive inputs without progress before [`Runtime::run`] gives up.
    pub max_stalled_inputs: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            command_buffer_size: 32,
            max_turns: None,
            max_stalled_inputs: 16,
        }
    }
}

/// Result of one [`Runtime::step`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved {
        player: Player,
        mv: Move,
        response: MoveResponse,
    },
    Finished {
        winner: Player,
    },
    TurnLimit {
        turn: u32,
    },
}

/// Summary returned by [`Runtime::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchReport {
    /// `None` when the turn limit ended the run.
    pub winner: Option<Player>,
    pub turn: u32,
    pub hp: PerPlayer<u32>,
    pub stats: BattleStats,
}

/// Main runtime that orchestrates a battle
///
/// Design: Runtime owns the worker and coordinates providers.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    config: RuntimeConfig,
    providers: PerPlayer<Option<Box<dyn ActionProvider>>>,
    repository: Option<Arc<dyn SnapshotRepository>>,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Ask the turn owner's provider for a move and submit it.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let view = self.handle.view().await?;
        if let Some(winner) = view.winner() {
            return Ok(StepOutcome::Finished { winner });
        }
        if let Some(limit) = self.config.max_turns
            && view.turn() > limit
        {
            return Ok(StepOutcome::TurnLimit { turn: view.turn() });
        }

        let player = view.current_player();
        let provider = self.providers[player]
            .as_ref()
            .ok_or(RuntimeError::ProviderNotSet { player })?;

        let mv = provider.provide_move(player, &view).await?;
        let response = self.handle.submit(player, mv).await?;

        Ok(StepOutcome::Moved {
            player,
            mv,
            response,
        })
    }

    /// Step until the battle ends or the turn limit is reached.
    pub async fn run(&mut self) -> Result<MatchReport> {
        let mut stalled = 0;
        loop {
            match self.step().await? {
                StepOutcome::Moved {
                    player, response, ..
                } => {
                    let progressed = matches!(
                        response,
                        MoveResponse::Applied(ref outcome) if *outcome != MoveOutcome::Rejected
                    );
                    if progressed {
                        stalled = 0;
                        continue;
                    }
                    stalled += 1;
                    if stalled >= self.config.max_stalled_inputs {
                        warn!(%player, attempts = stalled, "provider made no progress");
                        return Err(RuntimeError::Stalled {
                            player,
                            attempts: stalled,
                        });
                    }
                }
                StepOutcome::Finished { .. } | StepOutcome::TurnLimit { .. } => break,
            }
        }

        let view = self.handle.view().await?;
        let report = MatchReport {
            winner: view.winner(),
            turn: view.turn(),
            hp: view.state.hp,
            stats: view.state.stats,
        };
        info!(winner = ?report.winner, turn = report.turn, "match finished");
        Ok(report)
    }

    /// Set the provider for `player`
    pub fn set_provider(&mut self, player: Player, provider: impl ActionProvider + 'static) {
        self.providers[player] = Some(Box::new(provider));
    }

    /// Save the settled battle under `slot`.
    pub async fn save(&self, slot: &str) -> Result<()> {
        let repository = self.repository.as_ref().ok_or(RuntimeError::RepositoryNotSet)?;
        let snapshot = self.handle.snapshot().await?;
        repository.save(slot, &snapshot)?;
        info!(slot, turn = snapshot.state.turn, "battle saved");
        Ok(())
    }

    /// Replace the battle with the one saved under `slot`.
    pub async fn load(&self, slot: &str) -> Result<()> {
        let repository = self.repository.as_ref().ok_or(RuntimeError::RepositoryNotSet)?;
        let snapshot = repository
            .load(slot)?
            .ok_or_else(|| RuntimeError::SlotNotFound(slot.to_owned()))?;
        self.handle.restore(snapshot).await?;
        info!(slot, "battle loaded");
        Ok(())
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Where the battle comes from.
enum Origin {
    Setup(BattleSetup),
    Snapshot(Box<BattleSnapshot>),
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    origin: Option<Origin>,
    barrier: Arc<dyn SettleBarrier>,
    providers: PerPlayer<Option<Box<dyn ActionProvider>>>,
    repository: Option<Arc<dyn SnapshotRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            origin: None,
            barrier: Arc::new(ImmediateBarrier),
            providers: PerPlayer::default(),
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Start a new battle from `setup`
    pub fn setup(mut self, setup: BattleSetup) -> Self {
        self.origin = Some(Origin::Setup(setup));
        self
    }

    /// Resume a saved battle
    pub fn snapshot(mut self, snapshot: BattleSnapshot) -> Self {
        self.origin = Some(Origin::Snapshot(Box::new(snapshot)));
        self
    }

    /// Wait on `barrier` between phases (default: [`ImmediateBarrier`])
    pub fn barrier(mut self, barrier: impl SettleBarrier + 'static) -> Self {
        self.barrier = Arc::new(barrier);
        self
    }

    /// Set the provider for `player`
    pub fn provider(mut self, player: Player, provider: impl ActionProvider + 'static) -> Self {
        self.providers[player] = Some(Box::new(provider));
        self
    }

    /// Set the repository used by [`Runtime::save`] and [`Runtime::load`]
    pub fn repository(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let origin = self.origin.ok_or(RuntimeError::MissingBattle)?;

        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let sink = Box::new(BusSink::new(event_bus.clone()));
        let battle = match origin {
            Origin::Setup(setup) => Battle::new(setup, sink)?,
            Origin::Snapshot(snapshot) => Battle::from_snapshot(*snapshot, sink)?,
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let worker = SessionWorker::new(battle, self.barrier, command_rx, event_bus);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            config: self.config,
            providers: self.providers,
            repository: self.repository,
            worker_handle,
        })
    }
}
