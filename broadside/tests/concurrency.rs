use std::sync::Arc;
use std::thread;

use rand::{rngs::StdRng, SeedableRng};
use uuid::Uuid;

use broadside::{
    Coord, Engine, GameError, GameId, InMemoryCatalog, Mode, Orientation, PlayerId, ShipSelector,
};

// Concurrency properties: per-game operations are totally ordered by the
// game's lock, and distinct games never contend.

fn single_player_game(engine: &Engine<InMemoryCatalog>, fleet: broadside::catalog::FleetId, seed: u64)
    -> (GameId, PlayerId) {
    let mut rng = StdRng::seed_from_u64(seed);
    let player = Uuid::new_v4();
    let view = engine
        .create_game(&mut rng, player, fleet, Mode::SinglePlayer)
        .unwrap();
    engine
        .place_ship(view.game_id, player, ShipSelector::Next, "A1", Orientation::Horizontal)
        .unwrap();
    engine
        .place_ship(view.game_id, player, ShipSelector::Next, "C1", Orientation::Horizontal)
        .unwrap();
    (view.game_id, player)
}

fn patrol_engine() -> (Engine<InMemoryCatalog>, broadside::catalog::FleetId) {
    let mut catalog = InMemoryCatalog::new();
    let patrol = catalog.add_template("Patrol", 2);
    let fleet = catalog.add_fleet("Patrols", 10, vec![patrol, patrol]);
    (Engine::new(catalog), fleet)
}

#[test]
fn concurrent_shots_on_one_game_stay_ordered() {
    let (engine, fleet) = patrol_engine();
    let engine = Arc::new(engine);
    let (game, player) = single_player_game(&engine, fleet, 100);

    // Eight threads race distinct coordinates at the same game. Every shot
    // that lands must appear in the history as a player/AI pair.
    let mut handles = Vec::new();
    for t in 0..8u16 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(200 + t as u64);
            let coordinate = Coord::new(5 + t / 4, 1 + t % 4).to_string();
            match engine.shoot(&mut rng, game, player, &coordinate) {
                Ok(_) => {}
                // The game may have ended on another thread's shot.
                Err(GameError::WrongPhase) => {}
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let history = engine.shots_history(game, player).unwrap();
    assert!(!history.is_empty());
    // Indices are contiguous and strictly increasing.
    for (i, shot) in history.iter().enumerate() {
        assert_eq!(shot.index as usize, i);
    }
    // No AI shot interleaves between a player shot and its paired reply:
    // shots alternate player, AI, player, AI, ... to the end of history.
    for pair in history.chunks(2) {
        assert_eq!(pair[0].shooter_id, Some(player), "index {}", pair[0].index);
        if let [_, reply] = pair {
            assert_eq!(reply.shooter_id, None, "index {}", reply.index);
        }
    }
}

#[test]
fn distinct_games_progress_independently() {
    let (engine, fleet) = patrol_engine();
    let engine = Arc::new(engine);
    let (game_a, player_a) = single_player_game(&engine, fleet, 300);
    let (game_b, player_b) = single_player_game(&engine, fleet, 301);

    let spawn = |game: GameId, player: PlayerId, seed: u64| {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut fired = 0;
            'scan: for row in 1..=10u16 {
                for col in 1..=10u16 {
                    let coordinate = Coord::new(row, col).to_string();
                    match engine.shoot(&mut rng, game, player, &coordinate) {
                        Ok(outcome) => {
                            fired += 1;
                            if outcome.game_finished {
                                break 'scan;
                            }
                        }
                        Err(GameError::AlreadyShot) => continue,
                        Err(other) => panic!("unexpected error {other:?}"),
                    }
                }
            }
            fired
        })
    };

    let a = spawn(game_a, player_a, 310);
    let b = spawn(game_b, player_b, 311);
    let fired_a = a.join().unwrap();
    let fired_b = b.join().unwrap();

    // Both games made progress and both ran to completion.
    assert!(fired_a > 0 && fired_b > 0);
    assert!(engine.view(game_a, player_a).unwrap().status.is_finished());
    assert!(engine.view(game_b, player_b).unwrap().status.is_finished());
}
