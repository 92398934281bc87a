//! Errors surfaced by the game engine. Transport-independent: the HTTP
//! layer maps these onto status codes, the terminal client onto messages.

use thiserror::Error;

use crate::catalog::InvalidFleetReason;
use crate::coord::CoordError;

/// Reason an engine operation was rejected.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum GameError {
    /// The referenced game, template, or fleet does not exist.
    #[error("not found")]
    NotFound,

    /// The caller is not a participant in this game.
    #[error("caller is not a participant in this game")]
    Unauthorized,

    /// The operation is not valid in the game's current state.
    #[error("operation is not valid in the current game state")]
    WrongPhase,

    /// A shot was attempted by a player who is not on turn.
    #[error("it is not this player's turn")]
    NotYourTurn,

    /// The coordinate string does not parse.
    #[error("malformed coordinate")]
    MalformedCoordinate,

    /// The coordinate or placement leaves the board.
    #[error("coordinate is outside the board")]
    OutOfBounds,

    /// The shooter already fired at this cell.
    #[error("this cell was already shot")]
    AlreadyShot,

    /// The placement overlaps a ship that is already on the board.
    #[error("placement overlaps an existing ship")]
    Overlap,

    /// The selected ship is not the next required placement.
    #[error("ship is not the next required placement")]
    WrongShip,

    /// The game already has two players.
    #[error("the game already has two players")]
    GameFull,

    /// A player tried to join their own game.
    #[error("players cannot join their own game")]
    CannotJoinOwn,

    /// The joining player is already part of this game.
    #[error("this player already joined the game")]
    AlreadyJoined,

    /// The base fleet failed validation at game creation.
    #[error("invalid base fleet: {0}")]
    InvalidFleet(InvalidFleetReason),

    /// AI auto-placement exhausted its retry budget. Unreachable for fleets
    /// that pass the occupancy cap.
    #[error("could not place the fleet after {0} attempts per ship")]
    PlacementImpossible(u32),

    /// The occupancy index and the fleet tree disagree. Logged and surfaced,
    /// never silently repaired.
    #[error("engine state is corrupt: {0}")]
    CorruptState(&'static str),
}

impl From<CoordError> for GameError {
    fn from(err: CoordError) -> Self {
        match err {
            CoordError::Malformed => GameError::MalformedCoordinate,
            CoordError::OutOfBounds => GameError::OutOfBounds,
        }
    }
}

impl From<InvalidFleetReason> for GameError {
    fn from(reason: InvalidFleetReason) -> Self {
        GameError::InvalidFleet(reason)
    }
}
