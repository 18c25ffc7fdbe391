//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! submitting moves, querying the battle, or streaming events from specific
//! topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use match_core::{BattleSnapshot, CombatantId, Move, MoveResponse, Player, Position, PossibleMove};

use super::errors::{Result, RuntimeError};
use super::view::BattleView;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Submit a move and wait until it has settled.
    ///
    /// Returns [`MoveResponse::Ignored`] when the battle is not accepting
    /// input from `player`. Malformed swaps are errors.
    pub async fn submit(&self, player: Player, mv: Move) -> Result<MoveResponse> {
        self.request(|reply| Command::Submit { player, mv, reply })
            .await?
    }

    pub async fn request_swap(&self, player: Player, a: Position, b: Position) -> Result<MoveResponse> {
        self.submit(player, Move::swap(a, b)).await
    }

    pub async fn request_evolve(&self, player: Player, id: CombatantId) -> Result<MoveResponse> {
        self.submit(player, Move::Evolve(id)).await
    }

    pub async fn request_boost(&self, player: Player, id: CombatantId) -> Result<MoveResponse> {
        self.submit(player, Move::Boost(id)).await
    }

    /// A legal swap for `player`, if the board is accepting their input.
    pub async fn hint(&self, player: Player) -> Result<Option<PossibleMove>> {
        self.request(|reply| Command::Hint { player, reply }).await
    }

    /// Query the current battle (read-only copy)
    pub async fn view(&self) -> Result<BattleView> {
        self.request(|reply| Command::View { reply }).await
    }

    /// Export the battle; fails while a move is in flight.
    pub async fn snapshot(&self) -> Result<BattleSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await?
    }

    /// Replace the battle with `snapshot`; fails while a move is in flight.
    pub async fn restore(&self, snapshot: BattleSnapshot) -> Result<()> {
        self.request(|reply| Command::Restore {
            snapshot: Box::new(snapshot),
            reply,
        })
        .await?
    }

    /// Returns `false` if the battle was already paused.
    pub async fn pause(&self) -> Result<bool> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Returns `false` if the battle was not paused.
    pub async fn resume(&self) -> Result<bool> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Board` - Board creation, swaps, matches, refills, shuffles
    /// - `Topic::Battle` - Mana, berries, abilities, damage, HP, game end
    /// - `Topic::Turn` - Turn boundaries, extra moves, settled phases
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use match_runtime::Topic;
    ///
    /// let mut board_rx = handle.subscribe(Topic::Board);
    /// while let Ok(event) = board_rx.recv().await {
    ///     // Animate the board
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
