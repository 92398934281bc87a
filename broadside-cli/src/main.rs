use std::{
    collections::HashMap,
    io::{self, BufRead, Write},
    process,
};

use clap::{App, Arg, ArgMatches};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};
use regex::Regex;

use broadside::{
    Coord, Engine, GameError, GameView, InMemoryCatalog, Mode, Orientation, PlayerId,
    ShipSelector, ShotResult,
};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let matches = App::new("Broadside")
        .version("0.1.0")
        .about("Single-player Battleship against the engine's AI.")
        .arg(
            Arg::with_name("board")
                .short("b")
                .long("board")
                .value_name("SIZE")
                .help("board edge length, 5..=20")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("seed the AI's random number generator")
                .takes_value(true),
        )
        .get_matches();

    let board_size = parse_board_size(&matches);
    let mut rng = match matches.value_of("seed") {
        Some(seed) => match seed.parse() {
            Ok(seed) => StdRng::seed_from_u64(seed),
            Err(_) => {
                eprintln!("invalid seed: {}", seed);
                process::exit(2);
            }
        },
        None => StdRng::from_entropy(),
    };

    let mut catalog = InMemoryCatalog::new();
    let fleet_id = catalog.standard_fleet(board_size);
    let engine = Engine::new(catalog);
    let player: PlayerId = PlayerId::new_v4();

    let view = engine
        .create_game(&mut rng, player, fleet_id, Mode::SinglePlayer)
        .expect("the standard fleet is valid");
    let game_id = view.game_id;

    let stdin = io::stdin();
    let mut input = InputReader::new(stdin.lock());

    println!("=== Broadside ===");
    println!("Board {0}x{0}. Place your ships, then sink the enemy fleet.", board_size);

    place_ships(&engine, &mut rng, game_id, player, board_size, &mut input)?;
    battle(&engine, &mut rng, game_id, player, &mut input)?;

    Ok(())
}

fn parse_board_size(matches: &ArgMatches) -> u16 {
    match matches.value_of("board") {
        None => 10,
        Some(raw) => match raw.parse::<u16>() {
            Ok(size) if (5..=20).contains(&size) => size,
            _ => {
                eprintln!("board size must be in 5..=20, got {}", raw);
                process::exit(2);
            }
        },
    }
}

/// Placement phase: prompt until every ship in the fleet is on the board.
fn place_ships<R: Rng>(
    engine: &Engine<InMemoryCatalog>,
    rng: &mut R,
    game_id: broadside::GameId,
    player: PlayerId,
    board_size: u16,
    input: &mut InputReader<impl BufRead>,
) -> io::Result<()> {
    enum Command {
        Place(String, Orientation),
        Randomize,
        Show,
        Help,
    }

    static PLACE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?:place|put)\s+([a-z]+[0-9]+)\s+(h|v|horizontal|vertical)$")
            .expect("placement regex is valid")
    });

    loop {
        let view = engine.view(game_id, player).expect("own game is readable");
        let Some(next) = view.pending_ships.first() else {
            println!("All ships placed. To battle!");
            return Ok(());
        };
        println!();
        println!(
            "Next to place: {} (size {}). {} remaining.",
            next.name, next.size, view.ships_remaining_to_place
        );
        show_own_board(&view, board_size);

        let cmd = input.read_input_lower("> ", |line| match line {
            "?" | "help" | "h" => Some(Command::Help),
            "random" | "randomize" | "rand" => Some(Command::Randomize),
            "show" => Some(Command::Show),
            other => match PLACE.captures(other) {
                Some(caps) => {
                    let orientation = match &caps[2] {
                        "h" | "horizontal" => Orientation::Horizontal,
                        _ => Orientation::Vertical,
                    };
                    Some(Command::Place(caps[1].to_owned(), orientation))
                }
                None => {
                    println!("Unrecognized command {:?}. Use '?' for help.", other);
                    None
                }
            },
        })?;

        match cmd {
            Command::Place(coord, orientation) => {
                match engine.place_ship(game_id, player, ShipSelector::Next, &coord, orientation)
                {
                    Ok(placed) => println!("Placed {}.", placed.ship.name),
                    Err(err) => println!("Cannot place there: {}.", describe(err)),
                }
            }
            Command::Randomize => randomize_placements(engine, rng, game_id, player, board_size),
            Command::Show => {}
            Command::Help => {
                println!(
                    "Commands:
    place <coord> <h|v>   place the next ship at <coord>, e.g. \"place b3 h\"
    random                place all remaining ships at random
    show                  redraw the board
    ?                     this help"
                );
            }
        }
    }
}

/// Place every remaining ship by rejection sampling against the engine.
fn randomize_placements<R: Rng>(
    engine: &Engine<InMemoryCatalog>,
    rng: &mut R,
    game_id: broadside::GameId,
    player: PlayerId,
    board_size: u16,
) {
    let mut attempts = 0;
    loop {
        let view = engine.view(game_id, player).expect("own game is readable");
        if view.ships_remaining_to_place == 0 {
            return;
        }
        attempts += 1;
        if attempts > 5000 {
            println!("Could not find room for the rest; place them manually.");
            return;
        }
        let coord = Coord::new(
            rng.gen_range(1..=board_size),
            rng.gen_range(1..=board_size),
        );
        let orientation = if rng.gen_bool(0.5) {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        // Overlaps and out-of-bounds spans simply retry.
        let _ = engine.place_ship(
            game_id,
            player,
            ShipSelector::Next,
            &coord.to_string(),
            orientation,
        );
    }
}

/// Shooting phase: alternate with the AI until one fleet is gone.
fn battle<R: Rng>(
    engine: &Engine<InMemoryCatalog>,
    rng: &mut R,
    game_id: broadside::GameId,
    player: PlayerId,
    input: &mut InputReader<impl BufRead>,
) -> io::Result<()> {
    static SHOT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(?:fire\s+|shoot\s+)?([a-z]+[0-9]+)$").expect("shot regex"));

    loop {
        let view = engine.view(game_id, player).expect("own game is readable");
        println!();
        show_boards(&view);
        if view.phase == broadside::game::Phase::Finished {
            break;
        }

        let coord = input.read_input_lower("fire at> ", |line| match SHOT.captures(line) {
            Some(caps) => Some(caps[1].to_owned()),
            None => {
                println!("Enter a coordinate like b3, or \"fire b3\".");
                None
            }
        })?;

        match engine.shoot(rng, game_id, player, &coord) {
            Ok(outcome) => {
                print!("{}: {}", coord.to_uppercase(), describe_result(outcome.result));
                if let Some(name) = &outcome.ship_hit {
                    print!(" ({})", name);
                }
                println!();
                if let Some(reply) = &outcome.ai_shot {
                    print!(
                        "AI fired at {}: {}",
                        reply.coordinate,
                        describe_result(reply.result)
                    );
                    if let Some(name) = &reply.ship_hit {
                        print!(" ({})", name);
                    }
                    println!();
                }
                if outcome.game_finished {
                    let won = outcome.winner_id == Some(player);
                    println!();
                    println!(
                        "{}",
                        if won {
                            "Enemy fleet destroyed. You win!"
                        } else {
                            "Your fleet is gone. The AI wins."
                        }
                    );
                }
            }
            Err(err) => println!("Shot refused: {}.", describe(err)),
        }
    }

    let stats = engine.stats(game_id, player).expect("own game is readable");
    println!();
    println!(
        "Shots: {} ({} hits, {} misses, {:.0}% accuracy) in {}s.",
        stats.total_shots,
        stats.hits,
        stats.misses,
        stats.accuracy * 100.0,
        stats.duration_seconds
    );
    Ok(())
}

fn describe(err: GameError) -> String {
    err.to_string()
}

fn describe_result(result: ShotResult) -> &'static str {
    match result {
        ShotResult::Water => "water",
        ShotResult::Hit => "hit!",
        ShotResult::Sunk => "sunk!",
    }
}

/// Render the player's own board during placement.
fn show_own_board(view: &GameView, board_size: u16) {
    let mut cells = HashMap::new();
    for ship in &view.ships {
        for segment in &ship.segments {
            cells.insert(
                (segment.coordinate.row, segment.coordinate.col),
                if segment.hit { 'X' } else { '#' },
            );
        }
    }
    draw_grid(board_size, &cells);
}

/// Render both boards during battle: the enemy grid as known from our
/// shots, and our own grid with the AI's shots overlaid.
fn show_boards(view: &GameView) {
    let size = view.board_size;

    let mut enemy = HashMap::new();
    for shot in &view.my_shots {
        let mark = match shot.result {
            ShotResult::Water => 'o',
            ShotResult::Hit => 'x',
            ShotResult::Sunk => 'X',
        };
        enemy.insert((shot.coordinate.row, shot.coordinate.col), mark);
    }
    for ship in &view.sunk_opponent_ships {
        for segment in &ship.segments {
            enemy.insert((segment.coordinate.row, segment.coordinate.col), 'X');
        }
    }

    let mut own = HashMap::new();
    for ship in &view.ships {
        for segment in &ship.segments {
            own.insert(
                (segment.coordinate.row, segment.coordinate.col),
                if segment.hit { 'X' } else { '#' },
            );
        }
    }
    for shot in &view.opponent_shots {
        if shot.result == ShotResult::Water {
            own.insert((shot.coordinate.row, shot.coordinate.col), 'o');
        }
    }

    println!("Enemy waters:");
    draw_grid(size, &enemy);
    println!("Your fleet:");
    draw_grid(size, &own);
}

fn draw_grid(size: u16, cells: &HashMap<(u16, u16), char>) {
    print!("   ");
    for col in 1..=size {
        print!("{:^3}", col);
    }
    println!();
    for row in 1..=size {
        // "A1" minus its column digit is the row label.
        let label = Coord::new(row, 1).to_string();
        print!("{:>2} ", &label[..label.len() - 1]);
        for col in 1..=size {
            let mark = cells.get(&(row, col)).copied().unwrap_or('~');
            print!("{:^3}", mark);
        }
        println!();
    }
}

/// Helper to read input from the player.
struct InputReader<B> {
    read: B,
    buf: String,
}

impl<B> InputReader<B> {
    fn new(read: B) -> Self {
        Self {
            read,
            buf: String::new(),
        }
    }
}

impl<B: BufRead> InputReader<B> {
    /// Repeatedly tries to read input until the checker returns `Some`.
    /// Converts to ascii lowercase before running the checker.
    fn read_input_lower<F, T>(&mut self, prompt: &str, mut checker: F) -> io::Result<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        loop {
            print!("{}", prompt);
            io::stdout().flush()?;
            self.buf.clear();
            if self.read.read_line(&mut self.buf)? == 0 {
                println!();
                process::exit(0);
            }
            self.buf.make_ascii_lowercase();
            if let Some(val) = checker(self.buf.trim()) {
                return Ok(val);
            }
        }
    }
}
