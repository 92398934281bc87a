//! The multi-tenant coordination layer.
//!
//! The engine maps game ids to games and serializes access: the map's own
//! lock covers only insert, delete, and lookup, while each game carries a
//! mutex held for the whole of every operation on it, the AI's inline reply
//! included. Distinct games never contend. The two locks are never held
//! together, so the map stays responsive while games resolve shots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use rand::Rng;
use uuid::Uuid;

use crate::catalog::{resolve_fleet, Catalog, FleetId};
use crate::game::{
    Game, GameError, GameId, GameStatus, GameSummary, GameView, Mode, PendingShip,
    PlacementResult, PlayerId, ShipSelector, ShotOutcome, ShotView, Side, Stats,
};
use crate::coord::{parse, Orientation};

/// Stateful engine front door. One instance serves every game in the
/// process; the HTTP layer (or the terminal client) calls straight into it
/// with an already-authenticated player id.
pub struct Engine<C> {
    catalog: C,
    games: RwLock<HashMap<GameId, Arc<Mutex<Game>>>>,
}

impl<C: Catalog> Engine<C> {
    /// Construct an engine over a read-only catalog.
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            games: RwLock::new(HashMap::new()),
        }
    }

    /// The catalog this engine consults at game creation.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Create a game from a base fleet, snapshotting ship names and sizes.
    /// Single-player games come back with the AI's board already placed.
    pub fn create_game<R: Rng>(
        &self,
        rng: &mut R,
        creator: PlayerId,
        fleet_id: FleetId,
        mode: Mode,
    ) -> Result<GameView, GameError> {
        let fleet = self
            .catalog
            .base_fleet(fleet_id)
            .ok_or(GameError::NotFound)?;
        let templates = resolve_fleet(&self.catalog, &fleet)?;
        let plan: Vec<PendingShip> = templates
            .into_iter()
            .enumerate()
            .map(|(i, t)| PendingShip {
                template_id: t.id,
                name: t.name,
                size: t.size,
                placement_index: i,
            })
            .collect();
        let id = Uuid::new_v4();
        let game = Game::new(rng, id, creator, fleet_id, fleet.board_size, plan, mode)?;
        let view = game.view(Side::P1);
        self.games
            .write()
            .expect("game map lock poisoned")
            .insert(id, Arc::new(Mutex::new(game)));
        tracing::info!(game = %id, player = %creator, ?mode, "game created");
        Ok(view)
    }

    /// Join a multiplayer game as the second player.
    pub fn join_game(&self, game_id: GameId, joiner: PlayerId) -> Result<GameView, GameError> {
        let game = self.fetch(game_id)?;
        let mut game = game.lock().expect("game lock poisoned");
        game.join(joiner)?;
        Ok(game.view(Side::P2))
    }

    /// Place the caller's next required ship.
    pub fn place_ship(
        &self,
        game_id: GameId,
        player: PlayerId,
        selector: ShipSelector,
        start: &str,
        orientation: Orientation,
    ) -> Result<PlacementResult, GameError> {
        let start = parse(start)?;
        let game = self.fetch(game_id)?;
        let mut game = game.lock().expect("game lock poisoned");
        let side = game.side_of(player).ok_or(GameError::Unauthorized)?;
        game.place_ship(side, selector, start, orientation)
    }

    /// Fire at the caller's opponent. In single-player mode the response
    /// carries the AI's reply, resolved under the same lock.
    pub fn shoot<R: Rng>(
        &self,
        rng: &mut R,
        game_id: GameId,
        player: PlayerId,
        coordinate: &str,
    ) -> Result<ShotOutcome, GameError> {
        let coord = parse(coordinate)?;
        let game = self.fetch(game_id)?;
        let mut game = game.lock().expect("game lock poisoned");
        let side = game.side_of(player).ok_or(GameError::Unauthorized)?;
        game.shoot(rng, side, coord)
    }

    /// Redacted snapshot of the game for one participant.
    pub fn view(&self, game_id: GameId, player: PlayerId) -> Result<GameView, GameError> {
        let game = self.fetch(game_id)?;
        let game = game.lock().expect("game lock poisoned");
        let side = game.side_of(player).ok_or(GameError::Unauthorized)?;
        Ok(game.view(side))
    }

    /// Derived statistics for one participant.
    pub fn stats(&self, game_id: GameId, player: PlayerId) -> Result<Stats, GameError> {
        let game = self.fetch(game_id)?;
        let game = game.lock().expect("game lock poisoned");
        let side = game.side_of(player).ok_or(GameError::Unauthorized)?;
        Ok(game.stats(side))
    }

    /// The full shot history in firing order.
    pub fn shots_history(
        &self,
        game_id: GameId,
        player: PlayerId,
    ) -> Result<Vec<ShotView>, GameError> {
        let game = self.fetch(game_id)?;
        let game = game.lock().expect("game lock poisoned");
        game.side_of(player).ok_or(GameError::Unauthorized)?;
        Ok(game.history())
    }

    /// Remove a game from the store. While a game is running only its
    /// creator may delete it; once finished, either participant may.
    pub fn delete_game(&self, game_id: GameId, player: PlayerId) -> Result<(), GameError> {
        {
            let game = self.fetch(game_id)?;
            let game = game.lock().expect("game lock poisoned");
            let side = game.side_of(player).ok_or(GameError::Unauthorized)?;
            if !game.status().is_finished() && side != Side::P1 {
                return Err(GameError::Unauthorized);
            }
            // The guard drops here; the map lock is never taken while a
            // game lock is held.
        }
        self.games
            .write()
            .expect("game map lock poisoned")
            .remove(&game_id)
            .ok_or(GameError::NotFound)?;
        tracing::info!(game = %game_id, player = %player, "game deleted");
        Ok(())
    }

    /// Multiplayer games still waiting for a second player.
    pub fn available_games(&self) -> Vec<GameSummary> {
        self.games
            .read()
            .expect("game map lock poisoned")
            .values()
            .filter_map(|game| {
                let game = game.lock().expect("game lock poisoned");
                (game.status() == GameStatus::WaitingForPlayer2).then(|| game.summary())
            })
            .collect()
    }

    /// Games in which `player` holds a seat.
    pub fn games_for(&self, player: PlayerId) -> Vec<GameSummary> {
        self.games
            .read()
            .expect("game map lock poisoned")
            .values()
            .filter_map(|game| {
                let game = game.lock().expect("game lock poisoned");
                game.side_of(player).map(|_| game.summary())
            })
            .collect()
    }

    /// Number of live games. Mostly useful to tests and diagnostics.
    pub fn game_count(&self) -> usize {
        self.games.read().expect("game map lock poisoned").len()
    }

    fn fetch(&self, game_id: GameId) -> Result<Arc<Mutex<Game>>, GameError> {
        self.games
            .read()
            .expect("game map lock poisoned")
            .get(&game_id)
            .cloned()
            .ok_or(GameError::NotFound)
    }
}
