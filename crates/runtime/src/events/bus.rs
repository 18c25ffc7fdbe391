//! Topic-based event bus implementation.

use std::collections::HashMap;

use match_core::{EventSink, GameEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Board creation, swaps, matches, refills and shuffles
    Board,
    /// Mana, berries, evolutions, abilities, damage and the game result
    Battle,
    /// Turn boundaries, extra moves and settled phases
    Turn,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Board, Topic::Battle, Topic::Turn];

    pub fn of(event: &GameEvent) -> Self {
        match event {
            GameEvent::BoardCreated { .. }
            | GameEvent::BoardRefilled { .. }
            | GameEvent::BoardShuffled { .. }
            | GameEvent::TileSwapped { .. }
            | GameEvent::MatchFound { .. } => Topic::Board,
            GameEvent::ManaUpdated { .. }
            | GameEvent::BerriesUpdated { .. }
            | GameEvent::MonsterEvolved { .. }
            | GameEvent::MonsterBoosted { .. }
            | GameEvent::AbilityActivated { .. }
            | GameEvent::MonsterDamaged { .. }
            | GameEvent::PlayerHpUpdated { .. }
            | GameEvent::StatusTicked { .. }
            | GameEvent::GameEnded { .. } => Topic::Battle,
            GameEvent::ExtraMoveGained { .. }
            | GameEvent::TurnStarted { .. }
            | GameEvent::TurnEnded { .. }
            | GameEvent::PhaseSettled { .. } => Topic::Turn,
        }
    }
}

/// Event wrapper that carries the topic and the battle notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Board(GameEvent),
    Battle(GameEvent),
    Turn(GameEvent),
}

impl Event {
    pub fn new(event: GameEvent) -> Self {
        match Topic::of(&event) {
            Topic::Board => Event::Board(event),
            Topic::Battle => Event::Battle(event),
            Topic::Turn => Event::Turn(event),
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Event::Board(_) => Topic::Board,
            Event::Battle(_) => Topic::Battle,
            Event::Turn(_) => Topic::Turn,
        }
    }

    pub fn game_event(&self) -> &GameEvent {
        match self {
            Event::Board(event) | Event::Battle(event) | Event::Turn(event) => event,
        }
    }

    pub fn into_game_event(self) -> GameEvent {
        match self {
            Event::Board(event) | Event::Battle(event) | Event::Turn(event) => event,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Each topic has its own broadcast channel, so a
/// slow board animator never lags the turn listener.
#[derive(Clone, Debug)]
pub struct EventBus {
    board: broadcast::Sender<Event>,
    battle: broadcast::Sender<Event>,
    turn: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            board: broadcast::channel(capacity).0,
            battle: broadcast::channel(capacity).0,
            turn: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Board => &self.board,
            Topic::Battle => &self.battle,
            Topic::Turn => &self.turn,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|topic| (*topic, self.subscribe(*topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards battle notifications onto an [`EventBus`].
#[derive(Clone, Debug)]
pub struct BusSink {
    bus: EventBus,
}

impl BusSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl EventSink for BusSink {
    fn emit(&mut self, event: GameEvent) {
        tracing::trace!(event = event.name(), "battle event");
        self.bus.publish(Event::new(event));
    }
}
