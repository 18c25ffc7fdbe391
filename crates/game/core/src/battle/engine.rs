use tracing::{debug, info, warn};

use super::errors::{IllegalMove, MoveError, SetupError};
use super::player::Player;
use super::state::{BattlePhase, BattleState, BoardLock};
use super::{BattleSetup, Move, MoveOutcome, MoveResponse, Phase, PhaseReport};
use crate::board::{
    Cascade, CascadeEngine, CascadeStep, Grid, MatchResolver, Position, PossibleMove,
    SwapController, SwapError, SwapResult, TileFall,
};
use crate::combatant::{Combatant, CombatantId, StatusKind};
use crate::config::GameConfig;
use crate::element::{Element, ElementWeights};
use crate::env::{GameRng, ScriptedTiles, TileSource, WeightedTiles};
use crate::event::{EventSink, GameEvent};

/// Salt separating the spawn stream from the rules stream of one seed.
const TILE_STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

pub(super) fn tile_stream_seed(seed: u64) -> u64 {
    seed.rotate_left(32) ^ TILE_STREAM_SALT
}

/// Where refill elements come from.
#[derive(Clone, Debug)]
pub(super) enum TileFeed {
    Weighted(GameRng),
    Scripted(ScriptedTiles),
}

struct FeedSource<'a> {
    feed: &'a mut TileFeed,
    weights: &'a ElementWeights,
}

impl TileSource for FeedSource<'_> {
    fn next_element(&mut self) -> Element {
        match self.feed {
            TileFeed::Weighted(rng) => WeightedTiles::new(rng, self.weights).next_element(),
            TileFeed::Scripted(script) => script.next_element(),
        }
    }
}

#[derive(Clone, Debug)]
pub(super) enum CascadeOrigin {
    Swap,
    /// Board effect of an ability; resolution continues afterwards.
    Ability { fired: Vec<CombatantId> },
}

/// Work left for the in-flight move.
#[derive(Clone, Debug)]
pub(super) enum Stage {
    Swap {
        a: Position,
        b: Position,
    },
    Cascade {
        cascade: Cascade,
        origin: CascadeOrigin,
        falls: Vec<TileFall>,
    },
    /// Full-mana abilities of the turn owner; each combatant fires once.
    Abilities {
        fired: Vec<CombatantId>,
    },
    TurnTransition,
}

/// One battle between two players.
///
/// Combatants are addressed by [`CombatantId`]; callers only ever see shared
/// references, and every mutation goes through a move.
pub struct Battle {
    pub(super) config: GameConfig,
    pub(super) engine: CascadeEngine,
    pub(super) grid: Grid,
    pub(super) state: BattleState,
    pub(super) combatants: Vec<Combatant>,
    pub(super) tiles: TileFeed,
    pub(super) rng: GameRng,
    pub(super) stage: Option<Stage>,
    pub(super) outcome: Option<MoveOutcome>,
    pub(super) sink: Box<dyn EventSink>,
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("state", &self.state)
            .field("combatants", &self.combatants)
            .field("in_progress", &self.stage.is_some())
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Validates the setup, builds the board, and starts the first turn.
    pub fn new(setup: BattleSetup, sink: Box<dyn EventSink>) -> Result<Self, SetupError> {
        let BattleSetup {
            config,
            teams,
            first_player,
            seed,
            board,
            refill_script,
        } = setup;

        config.validate()?;
        for player in Player::BOTH {
            let size = teams[player].len();
            if size == 0 || size > GameConfig::MAX_TEAM_SIZE {
                return Err(SetupError::TeamSize {
                    player,
                    size,
                    max: GameConfig::MAX_TEAM_SIZE,
                });
            }
            if let Some(template) = teams[player].iter().find(|t| t.base_stats.mana_cost == 0) {
                return Err(SetupError::ZeroManaCost {
                    player,
                    name: template.name.clone(),
                });
            }
        }

        let mut combatants = Vec::new();
        let mut next_id = 1;
        for player in Player::BOTH {
            for template in &teams[player] {
                combatants.push(Combatant::from_template(
                    CombatantId(next_id),
                    player,
                    template,
                ));
                next_id += 1;
            }
        }

        let engine = Self::engine_for(&config);
        let mut rng = GameRng::new(seed);
        let mut tiles = match refill_script {
            Some(script) => TileFeed::Scripted(ScriptedTiles::new(script)),
            None => TileFeed::Weighted(GameRng::new(tile_stream_seed(seed))),
        };

        let grid = match board {
            Some(grid) if grid.size() != config.board_size => {
                return Err(SetupError::BoardSizeMismatch {
                    expected: config.board_size,
                    actual: grid.size(),
                });
            }
            Some(grid) => grid,
            None => {
                let mut grid = Grid::new(config.board_size);
                let mut source = FeedSource {
                    feed: &mut tiles,
                    weights: &config.element_weights,
                };
                let outcome = grid.fill_board(
                    &mut source,
                    engine.resolver(),
                    true,
                    config.max_fill_attempts,
                    &mut rng,
                );
                debug!(
                    attempts = outcome.attempts,
                    fallback = outcome.used_fallback,
                    "initial board generated"
                );
                grid
            }
        };

        let state = BattleState::new(&config, first_player);
        let mut battle = Self {
            config,
            engine,
            grid,
            state,
            combatants,
            tiles,
            rng,
            stage: None,
            outcome: None,
            sink,
        };

        battle.announce_board();
        battle.start_turn(first_player);
        Ok(battle)
    }

    pub(super) fn engine_for(config: &GameConfig) -> CascadeEngine {
        CascadeEngine::new(
            MatchResolver::new(config.min_match_size),
            config.extra_move_match_size,
            config.max_cascade_rounds,
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn team(&self, player: Player) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(move |c| c.owner == player)
    }

    pub fn current_player(&self) -> Player {
        self.state.turn_owner
    }

    pub fn resolver(&self) -> &MatchResolver {
        self.engine.resolver()
    }

    /// No move is in flight.
    pub fn is_settled(&self) -> bool {
        self.stage.is_none()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    pub fn winner(&self) -> Option<Player> {
        self.state.winner()
    }

    // ========================================================================
    // Input boundary
    // ========================================================================

    /// Swaps two tiles on behalf of `player`.
    ///
    /// Geometry errors are reported; every other refusal is a silent no-op.
    pub fn request_swap(
        &mut self,
        player: Player,
        a: Position,
        b: Position,
    ) -> Result<MoveResponse, SwapError> {
        match self.apply_move(player, Move::swap(a, b)) {
            Ok(outcome) => Ok(MoveResponse::Applied(outcome)),
            Err(MoveError::Swap(error)) => Err(error),
            Err(MoveError::Illegal(reason)) => {
                debug!(%player, %reason, "swap request ignored");
                Ok(MoveResponse::Ignored)
            }
        }
    }

    pub fn request_evolve(&mut self, player: Player, id: CombatantId) -> MoveResponse {
        self.request(player, Move::Evolve(id))
    }

    pub fn request_boost(&mut self, player: Player, id: CombatantId) -> MoveResponse {
        self.request(player, Move::Boost(id))
    }

    fn request(&mut self, player: Player, mv: Move) -> MoveResponse {
        match self.apply_move(player, mv) {
            Ok(outcome) => MoveResponse::Applied(outcome),
            Err(error) => {
                debug!(%player, ?mv, %error, "request ignored");
                MoveResponse::Ignored
            }
        }
    }

    /// First legal swap for `player`, if the board is accepting their input.
    ///
    /// Never mutates state and emits nothing.
    pub fn request_show_hint(&self, player: Player) -> Option<PossibleMove> {
        self.check_accepting(player).ok()?;
        self.grid.possible_moves(self.engine.resolver()).into_iter().next()
    }

    /// Every legal swap on the current board.
    pub fn possible_moves(&self) -> Vec<PossibleMove> {
        self.grid.possible_moves(self.engine.resolver())
    }

    pub fn pause(&mut self) -> bool {
        if self.state.lock.contains(BoardLock::PAUSED) {
            return false;
        }
        self.state.lock.insert(BoardLock::PAUSED);
        debug!("battle paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.state.lock.contains(BoardLock::PAUSED) {
            return false;
        }
        self.state.lock.remove(BoardLock::PAUSED);
        debug!("battle resumed");
        true
    }

    // ========================================================================
    // Move pipeline
    // ========================================================================

    /// Submits and settles a move in one call.
    pub fn apply_move(&mut self, player: Player, mv: Move) -> Result<MoveOutcome, MoveError> {
        self.submit(player, mv)?;
        while self.step().is_some() {}
        Ok(self.outcome.take().unwrap_or(MoveOutcome::Rejected))
    }

    /// Outcome of the last submitted move, available once it has settled.
    pub fn take_outcome(&mut self) -> Option<MoveOutcome> {
        if self.stage.is_some() {
            return None;
        }
        self.outcome.take()
    }

    /// Starts a move. Swaps only queue work for [`Battle::step`]; evolve and
    /// boost apply at once and may queue end-of-turn work.
    pub fn submit(&mut self, player: Player, mv: Move) -> Result<(), MoveError> {
        self.check_accepting(player)?;
        // The extra move only swaps.
        if !matches!(mv, Move::Swap { .. }) && self.state.moves_remaining[player] == 0 {
            return Err(IllegalMove::NoMovesRemaining.into());
        }
        self.outcome = None;

        match mv {
            Move::Swap { a, b } => {
                SwapController::validate(&self.grid, a, b)?;
                self.begin();
                self.stage = Some(Stage::Swap { a, b });
            }
            Move::Evolve(id) => {
                let index = self.acting_index(player, id)?;
                let threshold = self.config.berries_for_evolution;
                if !self.combatants[index].evolve(threshold) {
                    return Err(IllegalMove::EvolutionUnavailable(id).into());
                }
                self.state.consume_move(player);
                self.state.stats.evolutions += 1;

                let monster = &self.combatants[index];
                info!(combatant = %id, name = monster.display_name(), "monster evolved");
                let events = [
                    GameEvent::MonsterEvolved {
                        combatant: id,
                        name: monster.display_name().to_owned(),
                    },
                    GameEvent::BerriesUpdated {
                        combatant: id,
                        berries: monster.berry_count(),
                    },
                    GameEvent::ManaUpdated {
                        combatant: id,
                        mana: monster.current_mana(),
                        capacity: monster.mana_capacity(),
                    },
                ];
                events.into_iter().for_each(|event| self.emit(event));
                self.outcome = Some(MoveOutcome::Evolved { combatant: id });
                self.follow_up();
            }
            Move::Boost(id) => {
                let index = self.acting_index(player, id)?;
                let threshold = self.config.berries_for_boost;
                let mana = self.config.mana_from_boost;
                if !self.combatants[index].boost(threshold, mana) {
                    return Err(IllegalMove::BoostUnavailable(id).into());
                }
                self.state.consume_move(player);
                self.state.stats.boosts += 1;

                let monster = &self.combatants[index];
                let events = [
                    GameEvent::MonsterBoosted {
                        combatant: id,
                        mana: monster.current_mana(),
                    },
                    GameEvent::BerriesUpdated {
                        combatant: id,
                        berries: monster.berry_count(),
                    },
                    GameEvent::ManaUpdated {
                        combatant: id,
                        mana: monster.current_mana(),
                        capacity: monster.mana_capacity(),
                    },
                ];
                events.into_iter().for_each(|event| self.emit(event));
                self.outcome = Some(MoveOutcome::Boosted { combatant: id });
                self.follow_up();
            }
        }
        Ok(())
    }

    /// Advances the in-flight move by one phase.
    ///
    /// Returns `None` once nothing is pending; the caller must treat every
    /// returned phase as complete before stepping again.
    pub fn step(&mut self) -> Option<PhaseReport> {
        loop {
            let stage = self.stage.take()?;
            let phase = self.run_stage(stage);
            let settled = self.stage.is_none();
            if settled {
                self.settle();
            }
            if let Some(phase) = phase {
                return Some(PhaseReport {
                    phase,
                    player: self.state.turn_owner,
                    turn: self.state.turn,
                    settled,
                });
            }
        }
    }

    /// Ends the turn once the owner has neither regular nor extra moves left.
    ///
    /// The turn end is announced at once; ability resolution and the hand-off
    /// are queued for [`Battle::step`]. Returns whether the turn ended.
    pub fn end_turn_if_exhausted(&mut self) -> bool {
        let ending = self.state.turn_owner;
        if self.stage.is_some() || self.state.is_game_over() || self.state.has_move(ending) {
            return false;
        }
        info!(player = %ending, turn = self.state.turn, "turn ended");
        self.emit(GameEvent::TurnEnded { player: ending });
        self.begin();
        self.stage = Some(Stage::Abilities { fired: Vec::new() });
        true
    }

    /// Begins `player`'s turn: resets the budget, ticks their status effects,
    /// and reshuffles a board without moves.
    ///
    /// Ignored while a move is in flight or after the game ended.
    pub fn start_turn(&mut self, player: Player) -> bool {
        if self.stage.is_some() || self.state.is_game_over() {
            return false;
        }

        self.state.turn_owner = player;
        self.state.moves_remaining[player] = self.config.moves_per_turn;
        self.state.extra_move[player] = false;
        self.state.extra_moves_granted = 0;
        self.state.turn += 1;
        self.state.stats.turns += 1;
        info!(%player, turn = self.state.turn, "turn started");
        self.emit(GameEvent::TurnStarted {
            player,
            turn: self.state.turn,
        });

        self.tick_status_effects(player);
        if self.state.is_game_over() {
            return true;
        }

        if !self.grid.has_possible_moves(self.engine.resolver()) {
            self.reshuffle();
        }
        true
    }

    fn run_stage(&mut self, stage: Stage) -> Option<Phase> {
        match stage {
            Stage::Swap { a, b } => {
                self.run_swap(a, b);
                Some(Phase::Swap)
            }
            Stage::Cascade {
                cascade,
                origin,
                falls,
            } => self.run_cascade_step(cascade, origin, falls),
            Stage::Abilities { fired } => self.resolve_next_ability(fired),
            Stage::TurnTransition => {
                self.start_turn(self.state.turn_owner.other());
                Some(Phase::TurnTransition)
            }
        }
    }

    fn run_swap(&mut self, a: Position, b: Position) {
        let player = self.state.turn_owner;
        let result = SwapController::attempt_swap(&mut self.grid, self.engine.resolver(), a, b);
        match result {
            Ok(SwapResult::Accepted { .. }) => {
                debug!(%a, %b, "swap accepted");
                self.emit(GameEvent::TileSwapped { a, b, valid: true });
                self.state.consume_move(player);
                self.state.cascade_count = 0;
                self.state.combo_count = 0;
                self.outcome = Some(MoveOutcome::Swapped {
                    report: Default::default(),
                });
                self.stage = Some(Stage::Cascade {
                    cascade: self.engine.start(),
                    origin: CascadeOrigin::Swap,
                    falls: Vec::new(),
                });
            }
            Ok(SwapResult::Rejected) => {
                debug!(%a, %b, "swap rejected; no match");
                self.emit(GameEvent::TileSwapped { a, b, valid: false });
                self.outcome = Some(MoveOutcome::Rejected);
            }
            Err(error) => {
                warn!(%error, "swap failed validation after submission");
                self.outcome = Some(MoveOutcome::Rejected);
            }
        }
    }

    fn run_cascade_step(
        &mut self,
        mut cascade: Cascade,
        origin: CascadeOrigin,
        mut falls: Vec<TileFall>,
    ) -> Option<Phase> {
        let step = {
            let mut source = FeedSource {
                feed: &mut self.tiles,
                weights: &self.config.element_weights,
            };
            self.engine.advance(&mut cascade, &mut self.grid, &mut source)
        };

        let phase = match step {
            CascadeStep::Resolved {
                round,
                matches,
                report,
                ..
            } => {
                if matches!(origin, CascadeOrigin::Swap) {
                    self.state.cascade_count = cascade.report().cascade_rounds;
                    self.state.combo_count += report.total_matches;
                }
                self.state.stats.matches += report.total_matches;
                self.emit(GameEvent::MatchFound {
                    round,
                    matches,
                    report: report.clone(),
                });
                match origin {
                    CascadeOrigin::Swap => self.distribute_rewards(&report),
                    CascadeOrigin::Ability { .. } => self.pay_out(&report),
                }
                Phase::Resolve
            }
            CascadeStep::Collapsed { falls: fallen } => {
                falls = fallen;
                Phase::Collapse
            }
            CascadeStep::Refilled { spawned } => {
                self.emit(GameEvent::BoardRefilled {
                    falls: std::mem::take(&mut falls),
                    spawned,
                });
                Phase::Refill
            }
            CascadeStep::Finished { report } => {
                let stats = &mut self.state.stats;
                stats.highest_cascade = stats.highest_cascade.max(report.cascade_rounds);
                match origin {
                    CascadeOrigin::Swap => {
                        debug!(
                            rounds = report.cascade_rounds,
                            matches = report.total_matches,
                            "swap cascade settled"
                        );
                        self.outcome = Some(MoveOutcome::Swapped { report });
                        self.follow_up();
                    }
                    CascadeOrigin::Ability { fired } => {
                        self.stage = Some(Stage::Abilities { fired });
                    }
                }
                return None;
            }
        };

        self.stage = Some(Stage::Cascade {
            cascade,
            origin,
            falls,
        });
        Some(phase)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub(super) fn emit(&mut self, event: GameEvent) {
        self.sink.emit(event);
    }

    pub(super) fn announce_board(&mut self) {
        let event = GameEvent::BoardCreated {
            size: self.grid.size(),
            cells: self.grid.elements(),
        };
        self.emit(event);
        for player in Player::BOTH {
            self.emit_hp(player);
        }
    }

    pub(super) fn emit_hp(&mut self, player: Player) {
        let event = GameEvent::PlayerHpUpdated {
            player,
            hp: self.state.hp[player],
            max_hp: self.state.max_hp[player],
        };
        self.emit(event);
    }

    fn check_accepting(&self, player: Player) -> Result<(), IllegalMove> {
        if self.state.is_game_over() {
            return Err(IllegalMove::GameOver);
        }
        if player != self.state.turn_owner {
            return Err(IllegalMove::NotYourTurn {
                owner: self.state.turn_owner,
            });
        }
        if self.stage.is_some() || !self.state.lock.is_empty() {
            return Err(IllegalMove::BoardLocked(self.state.lock));
        }
        if !self.state.has_move(player) {
            return Err(IllegalMove::NoMovesRemaining);
        }
        Ok(())
    }

    fn acting_index(&self, player: Player, id: CombatantId) -> Result<usize, IllegalMove> {
        self.combatants
            .iter()
            .position(|c| c.id == id && c.owner == player)
            .ok_or(IllegalMove::UnknownCombatant(id))
    }

    fn begin(&mut self) {
        self.state.phase = BattlePhase::MoveInProgress;
        self.state.lock.insert(BoardLock::CASCADING);
    }

    /// Hands control back to the turn owner, never on a board without moves.
    fn settle(&mut self) {
        self.state.lock.remove(BoardLock::CASCADING);
        if self.state.is_game_over() {
            return;
        }
        self.state.phase = BattlePhase::PlayerTurn;
        if !self.grid.has_possible_moves(self.engine.resolver()) {
            self.reshuffle();
        }
    }

    /// Queues end-of-turn work if the move exhausted the budget.
    fn follow_up(&mut self) {
        if !self.end_turn_if_exhausted() && self.stage.is_none() {
            self.settle();
        }
    }

    fn tick_status_effects(&mut self, player: Player) {
        for index in 0..self.combatants.len() {
            if self.combatants[index].owner != player {
                continue;
            }
            let id = self.combatants[index].id;
            for effect in self.combatants[index].process_status_effects() {
                self.emit(GameEvent::StatusTicked {
                    combatant: id,
                    effect,
                });
                match effect.kind {
                    StatusKind::DamageOverTime { .. } => {
                        self.state.stats.damage_dealt[player.other()] += effect.value;
                        self.state.damage(player, effect.value);
                        self.emit_hp(player);
                        if self.check_defeat(player) {
                            return;
                        }
                    }
                    StatusKind::HealOverTime { .. } => {
                        self.state.heal(player, effect.value);
                        self.emit_hp(player);
                    }
                    StatusKind::ExtraMove { .. } => {
                        let moves = u8::try_from(effect.value).unwrap_or(u8::MAX);
                        let budget = &mut self.state.moves_remaining[player];
                        *budget = budget.saturating_add(moves);
                    }
                    StatusKind::Buff { .. } | StatusKind::Debuff { .. } => {}
                }
            }
        }
    }

    fn reshuffle(&mut self) {
        self.state.lock.insert(BoardLock::SHUFFLING);
        let outcome = self.grid.shuffle(
            &mut self.rng,
            self.engine.resolver(),
            self.config.max_fill_attempts,
        );
        if outcome.has_moves {
            debug!(attempts = outcome.attempts, "board reshuffled");
        } else {
            warn!(attempts = outcome.attempts, "reshuffle found no possible move");
        }
        self.emit(GameEvent::BoardShuffled {
            attempts: outcome.attempts,
            has_moves: outcome.has_moves,
        });
        self.state.lock.remove(BoardLock::SHUFFLING);
    }

    /// Ends the game when `player` is out of HP.
    pub(super) fn check_defeat(&mut self, player: Player) -> bool {
        if self.state.hp[player] > 0 {
            return false;
        }
        let winner = player.other();
        self.state.phase = BattlePhase::GameOver { winner };
        self.state.lock.insert(BoardLock::GAME_OVER);
        self.stage = None;
        info!(%winner, turn = self.state.turn, "game over");
        let summary = self.state.stats.clone();
        self.emit(GameEvent::GameEnded { winner, summary });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::test_support::{heal, monster};
    use crate::battle::PerPlayer;
    use crate::board::test_support::grid_from;
    use crate::combatant::AbilityEffect;
    use crate::event::{NullSink, RecordingSink};

    fn scenario_board() -> Grid {
        grid_from(&[
            "FFEWEZ", //
            "EZFBZP", //
            "ZPBEPB", //
            "PBEZBE", //
            "BEZPEZ", //
            "EZPBZP", //
        ])
    }

    fn refill() -> [Element; 7] {
        [
            Element::Water,
            Element::Water,
            Element::Water,
            Element::Psychic,
            Element::Earth,
            Element::Electric,
            Element::Berry,
        ]
    }

    fn setup(teams: PerPlayer<Vec<crate::combatant::MonsterTemplate>>) -> BattleSetup {
        BattleSetup::new(GameConfig::new().with_board_size(6), teams, Player::One, 7)
            .with_board(scenario_board())
            .with_refill_script(refill())
    }

    fn column() -> AbilityEffect {
        AbilityEffect::MatchColumn { columns: 1 }
    }

    fn drain() -> AbilityEffect {
        AbilityEffect::DrainMana { amount: 1 }
    }

    fn swap() -> Move {
        Move::swap(Position::new(0, 2), Position::new(1, 2))
    }

    #[test]
    fn two_round_cascade_rewards_each_element() {
        let teams = PerPlayer::new(
            vec![
                monster("Bonzumi", Element::Fire, 8, 10, column()),
                monster("Pelijet", Element::Water, 8, 10, column()),
            ],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let sink = RecordingSink::new();
        let mut battle = Battle::new(setup(teams), Box::new(sink.clone())).unwrap();

        let outcome = battle.apply_move(Player::One, swap()).unwrap();
        let MoveOutcome::Swapped { report } = outcome else {
            panic!("swap should be accepted");
        };
        assert_eq!(report.cascade_rounds, 2);
        assert!(report.granted_extra_move);

        let fire = battle.combatant(CombatantId(1)).unwrap();
        let water = battle.combatant(CombatantId(2)).unwrap();
        assert_eq!(fire.current_mana(), 3);
        assert_eq!(water.current_mana(), 4);

        let state = battle.state();
        assert_eq!(state.cascade_count, 2);
        assert_eq!(state.combo_count, 2);
        assert_eq!(state.moves_remaining[Player::One], 1);
        assert!(state.extra_move[Player::One]);
        assert_eq!(state.turn_owner, Player::One);
        assert!(battle.is_settled());
        assert!(sink.names().contains(&"extra_move_gained"));
    }

    #[test]
    fn step_reports_phases_in_order() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();
        battle.submit(Player::One, swap()).unwrap();
        assert!(battle.state().lock.contains(BoardLock::CASCADING));

        let mut phases = Vec::new();
        while let Some(report) = battle.step() {
            phases.push(report.phase);
        }
        assert_eq!(
            phases,
            vec![
                Phase::Swap,
                Phase::Resolve,
                Phase::Collapse,
                Phase::Refill,
                Phase::Resolve,
                Phase::Collapse,
                Phase::Refill,
            ]
        );
        assert!(battle.state().lock.is_empty());
    }

    #[test]
    fn input_is_ignored_while_a_move_is_in_flight() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();
        battle.submit(Player::One, swap()).unwrap();
        battle.step();

        let response = battle
            .request_swap(Player::One, Position::new(2, 0), Position::new(2, 1))
            .unwrap();
        assert!(response.is_ignored());
        assert!(matches!(
            battle.submit(Player::One, swap()),
            Err(MoveError::Illegal(IllegalMove::BoardLocked(_)))
        ));
    }

    #[test]
    fn rejected_swap_costs_nothing_and_restores_board() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();
        let before = battle.grid().elements();
        let outcome = battle
            .apply_move(
                Player::One,
                Move::swap(Position::new(5, 0), Position::new(5, 1)),
            )
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Rejected);
        assert_eq!(battle.grid().elements(), before);
        assert_eq!(battle.state().moves_remaining[Player::One], 2);
    }

    #[test]
    fn invalid_swap_is_reported_without_mutation() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let sink = RecordingSink::new();
        let mut battle = Battle::new(setup(teams), Box::new(sink.clone())).unwrap();
        sink.drain();
        let before = battle.grid().elements();

        let error = battle
            .request_swap(Player::One, Position::new(0, 0), Position::new(5, 5))
            .unwrap_err();
        assert!(matches!(error, SwapError::NotAdjacent { .. }));
        assert_eq!(battle.grid().elements(), before);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn wrong_seat_is_ignored() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();
        assert_eq!(
            battle.submit(Player::Two, swap()),
            Err(MoveError::Illegal(IllegalMove::NotYourTurn {
                owner: Player::One
            }))
        );
        assert!(battle.request_show_hint(Player::Two).is_none());
        assert!(battle.request_show_hint(Player::One).is_some());
    }

    #[test]
    fn exhausted_turn_fires_abilities_and_hands_over() {
        let mut config = GameConfig::new().with_board_size(6);
        config.moves_per_turn = 1;
        config.max_extra_moves_per_turn = 0;
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 3, 10, drain())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let setup = BattleSetup::new(config, teams, Player::One, 3)
            .with_board(scenario_board())
            .with_refill_script(refill());
        let sink = RecordingSink::new();
        let mut battle = Battle::new(setup, Box::new(sink.clone())).unwrap();

        battle.apply_move(Player::One, swap()).unwrap();

        let state = battle.state();
        assert_eq!(state.turn_owner, Player::Two);
        assert_eq!(state.turn, 2);
        assert_eq!(state.stats.abilities_cast, 1);
        // Fire vs earth is strong: 15, minus floor(6 / 3).
        assert_eq!(state.hp[Player::Two], 35 - 13);
        assert_eq!(battle.combatant(CombatantId(1)).unwrap().current_mana(), 0);

        let names = sink.names();
        let ended = names.iter().position(|n| *n == "turn_ended").unwrap();
        let activated = names.iter().position(|n| *n == "ability_activated").unwrap();
        let started = names.iter().rposition(|n| *n == "turn_started").unwrap();
        assert!(ended < activated && activated < started);
    }

    #[test]
    fn lethal_ability_ends_the_game_immediately() {
        let mut config = GameConfig::new().with_board_size(6);
        config.moves_per_turn = 1;
        config.max_extra_moves_per_turn = 0;
        config.starting_hp = 5;
        config.second_player_bonus_hp = 0;
        let teams = PerPlayer::new(
            vec![
                monster("Bonzumi", Element::Fire, 3, 20, drain()),
                monster("Bonzire", Element::Fire, 3, 20, drain()),
            ],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let setup = BattleSetup::new(config, teams, Player::One, 3)
            .with_board(scenario_board())
            .with_refill_script(refill());
        let sink = RecordingSink::new();
        let mut battle = Battle::new(setup, Box::new(sink.clone())).unwrap();

        battle.apply_move(Player::One, swap()).unwrap();

        assert_eq!(battle.winner(), Some(Player::One));
        assert_eq!(battle.state().hp[Player::Two], 0);
        assert!(battle.state().lock.contains(BoardLock::GAME_OVER));
        // The second full-mana ability never resolved.
        assert_eq!(battle.state().stats.abilities_cast, 1);
        let names = sink.names();
        assert_eq!(names.iter().filter(|n| **n == "turn_ended").count(), 1);
        assert_eq!(names.last(), Some(&"game_ended"));
        assert_eq!(names.iter().filter(|n| **n == "turn_started").count(), 1);

        assert_eq!(
            battle.apply_move(Player::Two, swap()),
            Err(MoveError::Illegal(IllegalMove::GameOver))
        );
        assert!(
            battle
                .request_swap(Player::One, Position::new(2, 0), Position::new(2, 1))
                .unwrap()
                .is_ignored()
        );
        assert!(battle.request_show_hint(Player::One).is_none());
    }

    #[test]
    fn deadlocked_board_is_shuffled_once_at_turn_start() {
        let board = grid_from(&["FWEZ", "EZFW", "FWEZ", "EZFW"]);
        assert!(!board.has_possible_moves(&MatchResolver::new(3)));
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let setup = BattleSetup::new(GameConfig::new().with_board_size(4), teams, Player::One, 11)
            .with_board(board);
        let sink = RecordingSink::new();
        let battle = Battle::new(setup, Box::new(sink.clone())).unwrap();

        let shuffles = sink
            .names()
            .into_iter()
            .filter(|name| *name == "board_shuffled")
            .count();
        assert_eq!(shuffles, 1);
        assert!(battle.grid().has_possible_moves(battle.resolver()));
        assert!(!battle.state().lock.contains(BoardLock::SHUFFLING));
    }

    #[test]
    fn evolve_spends_a_move_only_on_success() {
        let mut template = monster("Bonzumi", Element::Fire, 8, 10, column());
        template.evolution = Some(crate::combatant::EvolutionDescriptor {
            name: "Bonzire".into(),
            species_id: Some(2),
            stat_boosts: Default::default(),
            ability_boost: Default::default(),
        });
        let teams = PerPlayer::new(vec![template], vec![heal("Turtlelisk", Element::Earth, 6)]);
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();

        assert_eq!(
            battle.apply_move(Player::One, Move::Evolve(CombatantId(1))),
            Err(MoveError::Illegal(IllegalMove::EvolutionUnavailable(
                CombatantId(1)
            )))
        );
        assert_eq!(battle.state().moves_remaining[Player::One], 2);
        assert!(battle.request_evolve(Player::One, CombatantId(2)).is_ignored());
        assert!(battle.request_boost(Player::One, CombatantId(1)).is_ignored());
    }

    #[test]
    fn extra_move_cannot_evolve_or_boost() {
        let mut template = monster("Bonzumi", Element::Fire, 8, 10, column());
        template.evolution = Some(crate::combatant::EvolutionDescriptor {
            name: "Bonzire".into(),
            species_id: Some(2),
            stat_boosts: Default::default(),
            ability_boost: Default::default(),
        });
        let teams = PerPlayer::new(
            vec![template, monster("Pelijet", Element::Water, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();
        let cap = battle.config.berry_cap();
        for combatant in &mut battle.combatants {
            combatant.add_berries(cap, cap);
        }
        battle.state.moves_remaining[Player::One] = 0;
        battle.state.extra_move[Player::One] = true;

        assert_eq!(
            battle.apply_move(Player::One, Move::Evolve(CombatantId(1))),
            Err(MoveError::Illegal(IllegalMove::NoMovesRemaining))
        );
        assert!(battle.request_evolve(Player::One, CombatantId(1)).is_ignored());
        assert!(!battle.combatant(CombatantId(1)).unwrap().evolved);
        assert!(battle.state().extra_move[Player::One]);

        // With a regular move back, the evolution goes through and the boost
        // is refused once only the extra move is left.
        battle.state.moves_remaining[Player::One] = 1;
        assert_eq!(
            battle.apply_move(Player::One, Move::Evolve(CombatantId(1))),
            Ok(MoveOutcome::Evolved {
                combatant: CombatantId(1)
            })
        );
        battle.combatants[0].add_berries(cap, cap);
        assert_eq!(
            battle.apply_move(Player::One, Move::Boost(CombatantId(1))),
            Err(MoveError::Illegal(IllegalMove::NoMovesRemaining))
        );

        // The extra move still swaps.
        assert!(matches!(
            battle.apply_move(Player::One, swap()),
            Ok(MoveOutcome::Swapped { .. })
        ));
    }

    #[test]
    fn zero_mana_cost_is_rejected() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Freebie", Element::Earth, 0)],
        );
        let error = Battle::new(setup(teams), Box::new(NullSink)).unwrap_err();
        assert_eq!(
            error,
            SetupError::ZeroManaCost {
                player: Player::Two,
                name: "Freebie".into(),
            }
        );
    }

    #[test]
    fn paused_board_ignores_input() {
        let teams = PerPlayer::new(
            vec![monster("Bonzumi", Element::Fire, 8, 10, column())],
            vec![heal("Turtlelisk", Element::Earth, 6)],
        );
        let mut battle = Battle::new(setup(teams), Box::new(NullSink)).unwrap();
        assert!(battle.pause());
        assert!(!battle.pause());
        assert!(
            battle
                .request_swap(Player::One, Position::new(0, 2), Position::new(1, 2))
                .unwrap()
                .is_ignored()
        );
        assert!(battle.resume());
        assert!(matches!(
            battle.request_swap(Player::One, Position::new(0, 2), Position::new(1, 2)),
            Ok(MoveResponse::Applied(MoveOutcome::Swapped { .. }))
        ));
    }

    #[test]
    fn rejects_bad_team_sizes() {
        let teams = PerPlayer::new(Vec::new(), vec![heal("Turtlelisk", Element::Earth, 6)]);
        let error = Battle::new(setup(teams), Box::new(NullSink)).unwrap_err();
        assert!(matches!(error, SetupError::TeamSize { player: Player::One, .. }));
    }
}
