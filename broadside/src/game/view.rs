//! Redacted snapshots returned by the engine's read operations.
//!
//! A view always describes the game from one participant's seat: their own
//! ships with hit state, both shot streams, and opponent ships only once
//! they are fully sunk.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GameId, GameStatus, Mode, PendingShip, PlayerId, Shot};
use crate::board::ShotResult;
use crate::coord::{Code, Coord};
use crate::fleet::ShipRef;

/// Coarse lifecycle phase derived from [`GameStatus`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Placing,
    InProgress,
    Finished,
}

/// One cell of a ship, with its hit state.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentView {
    pub coordinate: Coord,
    pub hit: bool,
}

/// One ship as seen by an observer entitled to it.
#[derive(Debug, Clone, Serialize)]
pub struct ShipView {
    pub name: String,
    pub size: u8,
    pub placement_index: usize,
    pub sunk: bool,
    pub segments: Vec<SegmentView>,
}

pub(crate) fn ship_view(ship: ShipRef<'_>) -> ShipView {
    ShipView {
        name: ship.name().to_owned(),
        size: ship.size(),
        placement_index: ship.placement_index(),
        sunk: ship.sunk(),
        segments: ship
            .segments()
            .map(|s| SegmentView {
                coordinate: s.coordinate,
                hit: s.hit,
            })
            .collect(),
    }
}

/// One entry of the shot history.
#[derive(Debug, Clone, Serialize)]
pub struct ShotView {
    pub index: u32,
    pub shooter_id: Option<PlayerId>,
    pub coordinate: Coord,
    pub code: Code,
    pub result: ShotResult,
    pub ship_hit: Option<String>,
    pub ship_sunk: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&Shot> for ShotView {
    fn from(shot: &Shot) -> Self {
        Self {
            index: shot.index,
            shooter_id: shot.shooter_id,
            coordinate: shot.coordinate,
            code: shot.code,
            result: shot.result,
            ship_hit: shot.ship_hit.clone(),
            ship_sunk: shot.ship_sunk,
            timestamp: shot.timestamp,
        }
    }
}

/// A consistent snapshot of the game from one participant's seat.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub game_id: GameId,
    pub board_size: u16,
    pub mode: Mode,
    pub status: GameStatus,
    pub phase: Phase,
    pub current_turn_player_id: Option<PlayerId>,
    pub my_turn: bool,
    pub winner_id: Option<PlayerId>,
    /// The observer's own ships, with per-segment hit state.
    pub ships: Vec<ShipView>,
    /// Ships the observer still has to place, in required order.
    pub pending_ships: Vec<PendingShip>,
    pub ships_remaining_to_place: usize,
    /// Whether the opponent seat is filled and done placing.
    pub opponent_ready: bool,
    /// Shots the observer fired at the opponent.
    pub my_shots: Vec<ShotView>,
    /// Shots the opponent fired at the observer.
    pub opponent_shots: Vec<ShotView>,
    /// Opponent ships revealed because they are fully sunk.
    pub sunk_opponent_ships: Vec<ShipView>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Derived statistics for one participant.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct Stats {
    pub total_shots: usize,
    pub hits: usize,
    pub misses: usize,
    /// `hits / total_shots`, 0 when no shots have been fired.
    pub accuracy: f64,
    pub enemy_ships_sunk: usize,
    pub own_ships_sunk: usize,
    pub own_ships_remaining: usize,
    pub duration_seconds: i64,
}

/// Listing entry for the coordination surface.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub status: GameStatus,
    pub phase: Phase,
    pub mode: Mode,
    pub board_size: u16,
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}
