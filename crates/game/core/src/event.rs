//! Outbound notifications and the sink they are delivered through.
//!
//! The battle owns one [`EventSink`] injected at construction; there is no
//! global listener registry.
use std::sync::{Arc, Mutex};

use crate::battle::{BattleStats, Phase, Player};
use crate::board::{CascadeReport, Match, Position, Tile, TileFall};
use crate::combatant::{AbilityResult, CombatantId, ProcessedEffect};
use crate::element::Element;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum GameEvent {
    BoardCreated {
        size: u8,
        /// Row-major cell contents.
        cells: Vec<Option<Element>>,
    },
    BoardRefilled {
        falls: Vec<TileFall>,
        spawned: Vec<Tile>,
    },
    BoardShuffled {
        attempts: u32,
        has_moves: bool,
    },
    TileSwapped {
        a: Position,
        b: Position,
        valid: bool,
    },
    MatchFound {
        round: u32,
        matches: Vec<Match>,
        /// Rewards of this round only.
        report: CascadeReport,
    },
    ManaUpdated {
        combatant: CombatantId,
        mana: u32,
        capacity: u32,
    },
    BerriesUpdated {
        combatant: CombatantId,
        berries: u32,
    },
    MonsterEvolved {
        combatant: CombatantId,
        name: String,
    },
    MonsterBoosted {
        combatant: CombatantId,
        mana: u32,
    },
    AbilityActivated {
        result: AbilityResult,
    },
    MonsterDamaged {
        combatant: CombatantId,
        amount: u32,
    },
    PlayerHpUpdated {
        player: Player,
        hp: u32,
        max_hp: u32,
    },
    ExtraMoveGained {
        player: Player,
    },
    StatusTicked {
        combatant: CombatantId,
        effect: ProcessedEffect,
    },
    TurnStarted {
        player: Player,
        turn: u32,
    },
    TurnEnded {
        player: Player,
    },
    GameEnded {
        winner: Player,
        summary: BattleStats,
    },
    /// A phase was acknowledged by the presentation layer.
    PhaseSettled {
        phase: Phase,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::BoardCreated { .. } => "board_created",
            GameEvent::BoardRefilled { .. } => "board_refilled",
            GameEvent::BoardShuffled { .. } => "board_shuffled",
            GameEvent::TileSwapped { .. } => "tile_swapped",
            GameEvent::MatchFound { .. } => "match_found",
            GameEvent::ManaUpdated { .. } => "mana_updated",
            GameEvent::BerriesUpdated { .. } => "berries_updated",
            GameEvent::MonsterEvolved { .. } => "monster_evolved",
            GameEvent::MonsterBoosted { .. } => "monster_boosted",
            GameEvent::AbilityActivated { .. } => "ability_activated",
            GameEvent::MonsterDamaged { .. } => "monster_damaged",
            GameEvent::PlayerHpUpdated { .. } => "player_hp_updated",
            GameEvent::ExtraMoveGained { .. } => "extra_move_gained",
            GameEvent::StatusTicked { .. } => "status_ticked",
            GameEvent::TurnStarted { .. } => "turn_started",
            GameEvent::TurnEnded { .. } => "turn_ended",
            GameEvent::GameEnded { .. } => "game_ended",
            GameEvent::PhaseSettled { .. } => "phase_settled",
        }
    }
}

/// Receives every notification the battle emits, in emission order.
pub trait EventSink: Send {
    fn emit(&mut self, event: GameEvent);
}

impl<F> EventSink for F
where
    F: FnMut(GameEvent) + Send,
{
    fn emit(&mut self, event: GameEvent) {
        self(event)
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: GameEvent) {}
}

/// Collects events into a shared buffer; clones observe the same buffer.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the events recorded so far.
    pub fn events(&self) -> Vec<GameEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Removes and returns the recorded events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(GameEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: GameEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
