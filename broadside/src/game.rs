//! A single game: placement, turn alternation, shot resolution, the inline
//! AI turn, and terminal detection.
//!
//! [`Game`] owns its two boards, fleet trees, and shot history. All
//! mutation goes through the engine, which holds the game's mutex for the
//! whole operation; nothing here locks.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{Board, ShotResult};
use crate::catalog::{FleetId, TemplateId};
use crate::coord::{encode, span, Code, Coord, Orientation};
use crate::fleet::FleetTree;

use self::ai::{AiMode, AiState};
pub use self::errors::GameError;
pub use self::view::{
    GameSummary, GameView, Phase, SegmentView, ShipView, ShotView, Stats,
};
use self::view::ship_view;

mod ai;
mod errors;
mod view;

pub type GameId = Uuid;
pub type PlayerId = Uuid;

/// The two seats of a game. In single-player mode, `P2` is the AI.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    P1,
    P2,
}

impl Side {
    /// Get the opponent of this side.
    pub fn opponent(self) -> Self {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::P1 => 0,
            Side::P2 => 1,
        }
    }
}

/// Play mode chosen at creation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    SinglePlayer,
    Multiplayer,
}

/// Who shoots next after a resolved shot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TurnRule {
    /// The turn passes on every shot regardless of outcome.
    #[default]
    PassEveryShot,
    /// Classic rule: a hit grants another shot.
    ExtraTurnOnHit,
}

/// Canonical game status. Legacy status strings from older clients are
/// accepted as deserialization aliases only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    WaitingForPlayer2,
    /// Placement is open: the single player in single-player mode, or both
    /// players after a join.
    #[serde(alias = "setup", alias = "both_players_setup")]
    PlacingShips,
    /// Only player 1 still has ships to place.
    Player1Setup,
    /// Only player 2 still has ships to place.
    Player2Setup,
    Player1Turn,
    Player2Turn,
    Player1Won,
    Player2Won,
}

impl GameStatus {
    /// Whether ships may still be placed.
    pub fn is_placing(self) -> bool {
        matches!(
            self,
            GameStatus::PlacingShips | GameStatus::Player1Setup | GameStatus::Player2Setup
        )
    }

    /// Whether the game is in a turn-taking state.
    pub fn is_turn_phase(self) -> bool {
        matches!(self, GameStatus::Player1Turn | GameStatus::Player2Turn)
    }

    /// Whether the game has ended.
    pub fn is_finished(self) -> bool {
        matches!(self, GameStatus::Player1Won | GameStatus::Player2Won)
    }

    /// Coarse phase for clients that do not track individual statuses.
    pub fn phase(self) -> Phase {
        match self {
            GameStatus::WaitingForPlayer2 => Phase::Waiting,
            GameStatus::PlacingShips | GameStatus::Player1Setup | GameStatus::Player2Setup => {
                Phase::Placing
            }
            GameStatus::Player1Turn | GameStatus::Player2Turn => Phase::InProgress,
            GameStatus::Player1Won | GameStatus::Player2Won => Phase::Finished,
        }
    }
}

/// A ship still waiting to be placed, in required order. The placement
/// index distinguishes repeated templates in the same fleet.
#[derive(Debug, Clone, Serialize)]
pub struct PendingShip {
    pub template_id: TemplateId,
    pub name: String,
    pub size: u8,
    pub placement_index: usize,
}

/// How the client names the ship it wants to place. Ships are placed in
/// fleet order either way; a mismatched selector is rejected.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShipSelector {
    /// Place whatever ship is next in the required order.
    Next,
    /// The next ship, named by its template.
    Template(TemplateId),
    /// The next ship, named by its placement index.
    Index(usize),
}

/// One entry in the append-only shot history.
#[derive(Debug, Clone, Serialize)]
pub struct Shot {
    pub index: u32,
    pub shooter: Side,
    pub shooter_id: Option<PlayerId>,
    pub coordinate: Coord,
    pub code: Code,
    pub result: ShotResult,
    pub ship_hit: Option<String>,
    pub ship_sunk: bool,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementResult {
    pub ship: ShipView,
    pub ships_remaining_to_place: usize,
    pub status: GameStatus,
}

/// The AI's reply within a single-player shot response.
#[derive(Debug, Clone, Serialize)]
pub struct AiShotReport {
    pub coordinate: Coord,
    pub code: Code,
    pub result: ShotResult,
    pub ship_hit: Option<String>,
    pub ship_sunk: bool,
    pub game_finished: bool,
}

/// Result of a successful shot. In single-player mode the AI's reply is
/// included whenever the game did not end on the player's own shot.
#[derive(Debug, Clone, Serialize)]
pub struct ShotOutcome {
    pub coordinate: Coord,
    pub code: Code,
    pub result: ShotResult,
    pub ship_hit: Option<String>,
    pub ship_sunk: bool,
    /// Whether the game is over after this call, AI reply included.
    pub game_finished: bool,
    pub winner_id: Option<PlayerId>,
    pub ai_shot: Option<AiShotReport>,
}

/// What a resolved shot did, before the response is assembled.
struct ResolvedShot {
    coordinate: Coord,
    code: Code,
    result: ShotResult,
    ship_hit: Option<String>,
    ship_sunk: bool,
}

/// Everything one seat owns: identity, board, fleet, pending placements.
pub(crate) struct SideState {
    pub(crate) player_id: Option<PlayerId>,
    pub(crate) board: Board,
    pub(crate) fleet: FleetTree,
    pub(crate) to_place: VecDeque<PendingShip>,
}

impl SideState {
    fn new(player_id: Option<PlayerId>, board_size: u16, plan: Vec<PendingShip>) -> Self {
        Self {
            player_id,
            board: Board::new(board_size),
            fleet: FleetTree::new(player_id),
            to_place: VecDeque::from(plan),
        }
    }
}

/// One game and everything it owns.
pub struct Game {
    id: GameId,
    base_fleet_id: FleetId,
    board_size: u16,
    mode: Mode,
    turn_rule: TurnRule,
    status: GameStatus,
    plan: Vec<PendingShip>,
    sides: [SideState; 2],
    shots: Vec<Shot>,
    current_turn: Side,
    winner: Option<Side>,
    ai: Option<AiState>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Create a game from a validated fleet snapshot. Single-player games
    /// auto-place the AI's fleet immediately and open placement; multiplayer
    /// games wait for a second player.
    pub(crate) fn new<R: Rng>(
        rng: &mut R,
        id: GameId,
        creator: PlayerId,
        base_fleet_id: FleetId,
        board_size: u16,
        plan: Vec<PendingShip>,
        mode: Mode,
    ) -> Result<Self, GameError> {
        let p1 = SideState::new(Some(creator), board_size, plan.clone());
        let mut p2 = SideState::new(None, board_size, plan.clone());
        let (status, ai) = match mode {
            Mode::SinglePlayer => {
                ai::auto_place(rng, &mut p2, board_size)?;
                (GameStatus::PlacingShips, Some(AiState::default()))
            }
            Mode::Multiplayer => (GameStatus::WaitingForPlayer2, None),
        };
        Ok(Self {
            id,
            base_fleet_id,
            board_size,
            mode,
            turn_rule: TurnRule::default(),
            status,
            plan,
            sides: [p1, p2],
            shots: Vec::new(),
            current_turn: Side::P1,
            winner: None,
            ai,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn base_fleet_id(&self) -> FleetId {
        self.base_fleet_id
    }

    pub fn board_size(&self) -> u16 {
        self.board_size
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Override the turn rule. Only meaningful before the first shot.
    pub fn set_turn_rule(&mut self, rule: TurnRule) {
        self.turn_rule = rule;
    }

    /// The seat occupied by `player`, if they participate in this game.
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        if self.sides[0].player_id == Some(player) {
            Some(Side::P1)
        } else if self.sides[1].player_id == Some(player) {
            Some(Side::P2)
        } else {
            None
        }
    }

    fn winner_player_id(&self) -> Option<PlayerId> {
        self.winner.and_then(|w| self.sides[w.index()].player_id)
    }

    /// Seat a second player. Only valid while waiting for one.
    pub(crate) fn join(&mut self, joiner: PlayerId) -> Result<(), GameError> {
        if self.mode != Mode::Multiplayer {
            return Err(GameError::WrongPhase);
        }
        if self.sides[0].player_id == Some(joiner) {
            return Err(GameError::CannotJoinOwn);
        }
        match self.sides[1].player_id {
            Some(p2) if p2 == joiner => Err(GameError::AlreadyJoined),
            Some(_) => Err(GameError::GameFull),
            None if self.status != GameStatus::WaitingForPlayer2 => Err(GameError::WrongPhase),
            None => {
                self.sides[1] =
                    SideState::new(Some(joiner), self.board_size, self.plan.clone());
                self.status = GameStatus::PlacingShips;
                tracing::info!(game = %self.id, player = %joiner, "player 2 joined");
                Ok(())
            }
        }
    }

    /// Place the next required ship for `side`.
    pub(crate) fn place_ship(
        &mut self,
        side: Side,
        selector: ShipSelector,
        start: Coord,
        orientation: Orientation,
    ) -> Result<PlacementResult, GameError> {
        if !self.status.is_placing() {
            return Err(GameError::WrongPhase);
        }
        let state = &mut self.sides[side.index()];
        let (template_id, placement_index, size) = match state.to_place.front() {
            Some(p) => (p.template_id, p.placement_index, p.size),
            None => return Err(GameError::WrongPhase),
        };
        match selector {
            ShipSelector::Next => {}
            ShipSelector::Template(t) if t == template_id => {}
            ShipSelector::Index(i) if i == placement_index => {}
            _ => return Err(GameError::WrongShip),
        }
        let cells = span(start, orientation, size as u16, self.board_size)?;
        let ship_index = state.fleet.ship_count();
        state
            .board
            .place(ship_index, &cells)
            .map_err(|_| GameError::Overlap)?;
        let pending = state.to_place.pop_front().expect("front was checked");
        state.fleet.add_ship(
            pending.template_id,
            &pending.name,
            pending.size,
            pending.placement_index,
            &cells,
        );
        debug_assert_eq!(
            state.board.occupied_count(),
            state.fleet.ships().map(|s| s.size() as usize).sum::<usize>(),
        );
        let ship = ship_view(
            state
                .fleet
                .ship(ship_index)
                .expect("the ship was just appended"),
        );
        let remaining = state.to_place.len();
        self.refresh_placement_status();
        tracing::debug!(
            game = %self.id,
            ?side,
            ship = %ship.name,
            remaining,
            "ship placed"
        );
        Ok(PlacementResult {
            ship,
            ships_remaining_to_place: remaining,
            status: self.status,
        })
    }

    fn refresh_placement_status(&mut self) {
        let p1_done = self.sides[0].to_place.is_empty();
        let p2_done = self.sides[1].to_place.is_empty();
        match self.mode {
            Mode::SinglePlayer => {
                if p1_done {
                    self.begin_turn_phase();
                }
            }
            Mode::Multiplayer => match (p1_done, p2_done) {
                (true, true) => self.begin_turn_phase(),
                (true, false) => self.status = GameStatus::Player2Setup,
                (false, true) => self.status = GameStatus::Player1Setup,
                (false, false) => self.status = GameStatus::PlacingShips,
            },
        }
    }

    fn begin_turn_phase(&mut self) {
        self.status = GameStatus::Player1Turn;
        self.current_turn = Side::P1;
        self.started_at = Some(Utc::now());
        tracing::info!(game = %self.id, "all ships placed, player 1 to move");
    }

    /// Fire at the opponent of `shooter`. In single-player mode, the AI's
    /// reply is resolved inside the same call.
    pub(crate) fn shoot<R: Rng>(
        &mut self,
        rng: &mut R,
        shooter: Side,
        coord: Coord,
    ) -> Result<ShotOutcome, GameError> {
        if !self.status.is_turn_phase() {
            return Err(GameError::WrongPhase);
        }
        if shooter != self.current_turn {
            return Err(GameError::NotYourTurn);
        }
        let code = encode(coord, self.board_size)?;
        if self.sides[shooter.index()].board.has_shot(code) {
            return Err(GameError::AlreadyShot);
        }

        let record = self.resolve_shot(shooter, coord, code)?;
        let mut outcome = ShotOutcome {
            coordinate: record.coordinate,
            code: record.code,
            result: record.result,
            ship_hit: record.ship_hit,
            ship_sunk: record.ship_sunk,
            game_finished: self.status.is_finished(),
            winner_id: self.winner_player_id(),
            ai_shot: None,
        };
        if outcome.game_finished {
            return Ok(outcome);
        }
        self.advance_turn(outcome.result);

        if self.mode == Mode::SinglePlayer {
            while !self.status.is_finished() && self.current_turn == Side::P2 {
                let reply = self.ai_take_turn(rng)?;
                let finished = self.status.is_finished();
                let result = reply.result;
                outcome.ai_shot = Some(AiShotReport {
                    coordinate: reply.coordinate,
                    code: reply.code,
                    result: reply.result,
                    ship_hit: reply.ship_hit,
                    ship_sunk: reply.ship_sunk,
                    game_finished: finished,
                });
                if finished {
                    break;
                }
                self.advance_turn(result);
            }
            outcome.game_finished = self.status.is_finished();
            outcome.winner_id = self.winner_player_id();
        }
        Ok(outcome)
    }

    /// Apply one shot: occupancy lookup, fleet update, bookkeeping, and the
    /// terminal check. Turn advancement is the caller's job.
    fn resolve_shot(
        &mut self,
        shooter: Side,
        coord: Coord,
        code: Code,
    ) -> Result<ResolvedShot, GameError> {
        let target_idx = shooter.opponent().index();
        let (result, ship_hit, ship_sunk) = match self.sides[target_idx].board.ship_index_at(code)
        {
            None => (ShotResult::Water, None, false),
            Some(ship_index) => {
                let target = &mut self.sides[target_idx];
                let mark = target.fleet.mark_hit(code);
                if !mark.ship_found {
                    tracing::error!(
                        game = %self.id,
                        code,
                        "occupancy index and fleet tree disagree"
                    );
                    return Err(GameError::CorruptState("occupied cell has no fleet segment"));
                }
                let name = match target.fleet.ship(ship_index) {
                    Some(ship) => ship.name().to_owned(),
                    None => {
                        tracing::error!(game = %self.id, ship_index, "ship index out of range");
                        return Err(GameError::CorruptState("occupied cell names a missing ship"));
                    }
                };
                let result = if mark.ship_sunk {
                    ShotResult::Sunk
                } else {
                    ShotResult::Hit
                };
                (result, Some(name), mark.ship_sunk)
            }
        };
        self.sides[shooter.index()].board.record_shot(code, result);
        self.shots.push(Shot {
            index: self.shots.len() as u32,
            shooter,
            shooter_id: self.sides[shooter.index()].player_id,
            coordinate: coord,
            code,
            result,
            ship_hit: ship_hit.clone(),
            ship_sunk,
            timestamp: Utc::now(),
        });
        if result.is_hit() && self.sides[target_idx].fleet.all_sunk() {
            self.finish(shooter);
        }
        Ok(ResolvedShot {
            coordinate: coord,
            code,
            result,
            ship_hit,
            ship_sunk,
        })
    }

    fn advance_turn(&mut self, result: ShotResult) {
        let pass = match self.turn_rule {
            TurnRule::PassEveryShot => true,
            TurnRule::ExtraTurnOnHit => !result.is_hit(),
        };
        if pass {
            self.current_turn = self.current_turn.opponent();
            self.status = match self.current_turn {
                Side::P1 => GameStatus::Player1Turn,
                Side::P2 => GameStatus::Player2Turn,
            };
        }
    }

    fn ai_take_turn<R: Rng>(&mut self, rng: &mut R) -> Result<ResolvedShot, GameError> {
        let coord = {
            let state = self
                .ai
                .as_ref()
                .ok_or(GameError::CorruptState("single-player game lost its AI state"))?;
            ai::next_shot(rng, state, &self.sides[Side::P2.index()].board, self.board_size)?
        };
        let record = self.resolve_shot(Side::P2, coord, coord.code())?;
        let state = self.ai.as_mut().expect("AI state was checked above");
        match record.result {
            ShotResult::Hit => {
                state.last_hits.push(record.code);
                state.mode = AiMode::Target;
            }
            ShotResult::Sunk => {
                state.last_hits.clear();
                state.mode = AiMode::Hunt;
            }
            ShotResult::Water => {}
        }
        Ok(record)
    }

    fn finish(&mut self, winner: Side) {
        self.status = match winner {
            Side::P1 => GameStatus::Player1Won,
            Side::P2 => GameStatus::Player2Won,
        };
        self.winner = Some(winner);
        self.finished_at = Some(Utc::now());
        tracing::info!(game = %self.id, ?winner, shots = self.shots.len(), "game finished");
    }

    /// Redacted snapshot for one seat: own ships in full, opponent ships
    /// only once sunk, both shot streams.
    pub(crate) fn view(&self, observer: Side) -> GameView {
        let me = &self.sides[observer.index()];
        let opp = &self.sides[observer.opponent().index()];
        let opponent_seated = opp.player_id.is_some() || self.ai.is_some();
        GameView {
            game_id: self.id,
            board_size: self.board_size,
            mode: self.mode,
            status: self.status,
            phase: self.status.phase(),
            current_turn_player_id: if self.status.is_turn_phase() {
                self.sides[self.current_turn.index()].player_id
            } else {
                None
            },
            my_turn: self.status.is_turn_phase() && self.current_turn == observer,
            winner_id: self.winner_player_id(),
            ships: me.fleet.ships().map(ship_view).collect(),
            pending_ships: me.to_place.iter().cloned().collect(),
            ships_remaining_to_place: me.to_place.len(),
            opponent_ready: opponent_seated && opp.to_place.is_empty(),
            my_shots: self.shot_views(observer),
            opponent_shots: self.shot_views(observer.opponent()),
            sunk_opponent_ships: opp
                .fleet
                .ships()
                .filter(|s| s.sunk())
                .map(ship_view)
                .collect(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    fn shot_views(&self, shooter: Side) -> Vec<ShotView> {
        self.shots
            .iter()
            .filter(|s| s.shooter == shooter)
            .map(ShotView::from)
            .collect()
    }

    /// Derived statistics for one seat.
    pub(crate) fn stats(&self, observer: Side) -> Stats {
        let me = &self.sides[observer.index()];
        let opp = &self.sides[observer.opponent().index()];
        let total_shots = self.shots.iter().filter(|s| s.shooter == observer).count();
        let hits = self
            .shots
            .iter()
            .filter(|s| s.shooter == observer && s.result.is_hit())
            .count();
        let accuracy = if total_shots > 0 {
            hits as f64 / total_shots as f64
        } else {
            0.0
        };
        let duration_seconds = match (self.started_at, self.finished_at) {
            (None, _) => 0,
            (Some(start), Some(end)) => (end - start).num_seconds(),
            (Some(start), None) => (Utc::now() - start).num_seconds(),
        };
        Stats {
            total_shots,
            hits,
            misses: total_shots - hits,
            accuracy,
            enemy_ships_sunk: opp.fleet.sunk_ship_count(),
            own_ships_sunk: me.fleet.sunk_ship_count(),
            own_ships_remaining: me.fleet.alive_ship_count() + me.to_place.len(),
            duration_seconds,
        }
    }

    /// The full shot history in firing order. Shots are public information.
    pub(crate) fn history(&self) -> Vec<ShotView> {
        self.shots.iter().map(ShotView::from).collect()
    }

    /// Listing entry for the coordination surface.
    pub(crate) fn summary(&self) -> GameSummary {
        GameSummary {
            game_id: self.id,
            status: self.status,
            phase: self.status.phase(),
            mode: self.mode,
            board_size: self.board_size,
            player1_id: self.sides[0].player_id,
            player2_id: self.sides[1].player_id,
            created_at: self.created_at,
        }
    }
}
