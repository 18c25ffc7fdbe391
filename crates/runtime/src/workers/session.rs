//! Session worker that owns the authoritative [`Battle`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), drives
//! accepted moves phase by phase, and waits on the [`SettleBarrier`] between
//! phases. Commands that arrive while a move is in flight are still answered;
//! the battle itself refuses input until the move settles.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use match_core::{
    Battle, BattleSnapshot, GameEvent, Move, MoveError, MoveOutcome, MoveResponse, Player,
    PossibleMove, SnapshotError,
};

use crate::api::{BattleView, Result, RuntimeError, SettleBarrier};
use crate::events::{Event, EventBus};

/// Commands that can be sent to the session worker
pub enum Command {
    /// Submit a move and reply once it has settled.
    Submit {
        player: Player,
        mv: Move,
        reply: oneshot::Sender<Result<MoveResponse>>,
    },
    Hint {
        player: Player,
        reply: oneshot::Sender<Option<PossibleMove>>,
    },
    View {
        reply: oneshot::Sender<BattleView>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<BattleSnapshot>>,
    },
    Restore {
        snapshot: Box<BattleSnapshot>,
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Resume {
        reply: oneshot::Sender<bool>,
    },
}

fn send<T>(reply: oneshot::Sender<T>, value: T, command: &str) {
    if reply.send(value).is_err() {
        debug!("{command} reply channel closed (caller dropped)");
    }
}

/// Background task that processes battle commands.
pub struct SessionWorker {
    battle: Battle,
    barrier: Arc<dyn SettleBarrier>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SessionWorker {
    pub fn new(
        battle: Battle,
        barrier: Arc<dyn SettleBarrier>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            turn = battle.state().turn,
            player = %battle.current_player(),
            combatants = battle.combatants().len(),
            "SessionWorker initialized"
        );

        Self {
            battle,
            barrier,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd).await;
                }
                else => break,
            }
        }
        debug!("SessionWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { player, mv, reply } => {
                let result = self.handle_submit(player, mv).await;
                send(reply, result, "Submit");
            }
            other => self.handle_query(other),
        }
    }

    /// Answers everything that never waits on the barrier.
    fn handle_query(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { player, mv, reply } => {
                // Only reached while another move is in flight.
                debug!(%player, ?mv, "input ignored while a move resolves");
                send(reply, Ok(MoveResponse::Ignored), "Submit");
            }
            Command::Hint { player, reply } => {
                send(reply, self.battle.request_show_hint(player), "Hint");
            }
            Command::View { reply } => {
                send(reply, BattleView::capture(&self.battle), "View");
            }
            Command::Snapshot { reply } => {
                let result = self.battle.snapshot().map_err(RuntimeError::from);
                send(reply, result, "Snapshot");
            }
            Command::Restore { snapshot, reply } => {
                let result = if self.battle.is_settled() {
                    self.battle.restore(*snapshot).map_err(RuntimeError::from)
                } else {
                    Err(SnapshotError::NotSettled.into())
                };
                send(reply, result, "Restore");
            }
            Command::Pause { reply } => {
                send(reply, self.battle.pause(), "Pause");
            }
            Command::Resume { reply } => {
                send(reply, self.battle.resume(), "Resume");
            }
        }
    }

    async fn handle_submit(&mut self, player: Player, mv: Move) -> Result<MoveResponse> {
        match self.battle.submit(player, mv) {
            Ok(()) => {}
            Err(MoveError::Illegal(reason)) => {
                debug!(%player, ?mv, %reason, "move ignored");
                return Ok(MoveResponse::Ignored);
            }
            Err(MoveError::Swap(err)) => return Err(err.into()),
        }

        self.drive().await;

        let outcome = self.battle.take_outcome().unwrap_or(MoveOutcome::Rejected);
        Ok(MoveResponse::Applied(outcome))
    }

    /// Runs the in-flight move to completion, one phase per barrier.
    async fn drive(&mut self) {
        while let Some(report) = self.battle.step() {
            debug!(phase = %report.phase, player = %report.player, settled = report.settled, "phase complete");

            let barrier = Arc::clone(&self.barrier);
            let mut settled = barrier.settled(&report);
            loop {
                tokio::select! {
                    () = &mut settled => break,
                    Some(cmd) = self.command_rx.recv() => self.handle_query(cmd),
                }
            }

            self.event_bus.publish(Event::new(GameEvent::PhaseSettled {
                phase: report.phase,
            }));
        }

        if let Some(winner) = self.battle.winner() {
            info!(%winner, turn = self.battle.state().turn, "battle finished");
        } else if !self.battle.is_settled() {
            warn!("battle stopped stepping before it settled");
        }
    }
}
