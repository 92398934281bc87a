//! A stateful, multi-tenant Battleship engine.
//!
//! Clients create games, place ships on a square grid, then alternately
//! fire shots until one fleet is destroyed — against the built-in AI or
//! against a second player polling the same game. The transport is someone
//! else's problem: [`engine::Engine`] exposes plain operations that take an
//! already-authenticated player id and return serializable results.
//!
//! Internally, every board keeps two balanced binary search trees keyed by
//! an integer coordinate code ([`bst::CodeTree`]) — one indexing occupied
//! cells, one indexing fired shots — and every player's fleet is a
//! first-child/next-sibling tree ([`fleet::FleetTree`]) that records hits
//! at segment granularity and derives "sunk" from it. A per-game mutex
//! serializes mutations, including the AI's inline reply in single-player
//! games, while operations on distinct games run in parallel.

pub mod board;
pub mod bst;
pub mod catalog;
pub mod coord;
pub mod engine;
pub mod fleet;
pub mod game;

pub use crate::board::ShotResult;
pub use crate::catalog::{BaseFleet, Catalog, InMemoryCatalog, ShipTemplate};
pub use crate::coord::{Coord, Orientation};
pub use crate::engine::Engine;
pub use crate::game::{
    GameError, GameId, GameStatus, GameView, Mode, PlacementResult, PlayerId, ShipSelector,
    ShotOutcome, Stats,
};
