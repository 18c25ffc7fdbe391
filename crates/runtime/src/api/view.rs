//! Read-only copy of a battle handed to providers and clients.

use match_core::{
    Battle, BattleState, BoardLock, Combatant, CombatantId, GameConfig, Grid, Player,
    PossibleMove,
};

/// Everything a decision needs, detached from the worker.
#[derive(Clone, Debug)]
pub struct BattleView {
    pub config: GameConfig,
    pub grid: Grid,
    pub state: BattleState,
    pub combatants: Vec<Combatant>,
    /// Every legal swap on `grid`.
    pub moves: Vec<PossibleMove>,
    /// Whether the battle was between moves when the view was taken.
    pub settled: bool,
}

impl BattleView {
    pub(crate) fn capture(battle: &Battle) -> Self {
        Self {
            config: battle.config().clone(),
            grid: battle.grid().clone(),
            state: battle.state().clone(),
            combatants: battle.combatants().to_vec(),
            moves: battle.possible_moves(),
            settled: battle.is_settled(),
        }
    }

    pub fn current_player(&self) -> Player {
        self.state.turn_owner
    }

    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    pub fn winner(&self) -> Option<Player> {
        self.state.winner()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    pub fn lock_for(&self, player: Player) -> BoardLock {
        self.state.lock_for(player)
    }

    pub fn team(&self, player: Player) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(move |c| c.owner == player)
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }
}
