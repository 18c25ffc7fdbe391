//! Replays a fixed list of moves.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use match_core::{Move, Player};

use crate::api::{ActionProvider, BattleView, Result, RuntimeError};

/// Hands out moves in order; errors once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    moves: Mutex<VecDeque<Move>>,
}

impl ScriptedProvider {
    pub fn new(moves: impl IntoIterator<Item = Move>) -> Self {
        Self {
            moves: Mutex::new(moves.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.moves.lock().map(|moves| moves.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ActionProvider for ScriptedProvider {
    async fn provide_move(&self, player: Player, _view: &BattleView) -> Result<Move> {
        let next = match self.moves.lock() {
            Ok(mut moves) => moves.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.ok_or(RuntimeError::ScriptExhausted { player })
    }
}
