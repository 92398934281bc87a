//! The server-resident AI opponent for single-player games.
//!
//! Placement is rejection sampling: pick a random start and orientation
//! bounded so the ship fits, retry on overlap, give up after a fixed budget.
//! Shot selection runs a two-mode heuristic: hunt fires uniformly at random
//! among unshot cells; target works outward from standing hits, restricted
//! to the shared line once two hits align.

use rand::Rng;

use super::{GameError, SideState};
use crate::board::Board;
use crate::coord::{decode, span, Code, Coord, Orientation};

/// Attempts per ship before auto-placement gives up. Fleet validation caps
/// occupancy at 80%, so this budget is never exhausted for a valid fleet.
pub(super) const MAX_PLACEMENT_ATTEMPTS: u32 = 1000;

/// Search mode of the AI.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub(crate) enum AiMode {
    #[default]
    Hunt,
    Target,
}

/// Mutable AI state carried inside a single-player game.
#[derive(Debug, Clone, Default)]
pub(crate) struct AiState {
    pub(crate) mode: AiMode,
    /// Codes of hits on ships that are not yet sunk, oldest first.
    pub(crate) last_hits: Vec<Code>,
}

/// Place every pending ship of `side` at uniformly random positions.
pub(super) fn auto_place<R: Rng>(
    rng: &mut R,
    side: &mut SideState,
    board_size: u16,
) -> Result<(), GameError> {
    loop {
        let size = match side.to_place.front() {
            Some(pending) => pending.size as u16,
            None => return Ok(()),
        };
        let mut placed = false;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let orientation = if rng.gen_bool(0.5) {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            // Bound the start so the span always fits; only overlaps retry.
            let (max_row, max_col) = match orientation {
                Orientation::Horizontal => (board_size, board_size - size + 1),
                Orientation::Vertical => (board_size - size + 1, board_size),
            };
            let start = Coord::new(rng.gen_range(1..=max_row), rng.gen_range(1..=max_col));
            let cells = span(start, orientation, size, board_size)
                .expect("start is bounded so the span fits");
            let ship_index = side.fleet.ship_count();
            if side.board.place(ship_index, &cells).is_ok() {
                let pending = side.to_place.pop_front().expect("front was checked");
                side.fleet.add_ship(
                    pending.template_id,
                    &pending.name,
                    pending.size,
                    pending.placement_index,
                    &cells,
                );
                placed = true;
                break;
            }
        }
        if !placed {
            return Err(GameError::PlacementImpossible(MAX_PLACEMENT_ATTEMPTS));
        }
    }
}

/// Choose the AI's next shot. `board` is the AI's own board, whose shot
/// index records everything the AI has fired at the human.
pub(super) fn next_shot<R: Rng>(
    rng: &mut R,
    state: &AiState,
    board: &Board,
    board_size: u16,
) -> Result<Coord, GameError> {
    if state.mode == AiMode::Target {
        if let Some(coord) = target_candidate(rng, state, board, board_size) {
            return Ok(coord);
        }
    }
    hunt(rng, board, board_size)
}

/// Uniformly random unshot cell.
fn hunt<R: Rng>(rng: &mut R, board: &Board, board_size: u16) -> Result<Coord, GameError> {
    let mut open = Vec::new();
    for row in 1..=board_size {
        for col in 1..=board_size {
            let coord = Coord::new(row, col);
            if !board.has_shot(coord.code()) {
                open.push(coord);
            }
        }
    }
    if open.is_empty() {
        tracing::error!("AI asked to shoot with no open cells left");
        return Err(GameError::CorruptState("no cells left to shoot"));
    }
    Ok(open[rng.gen_range(0..open.len())])
}

/// Candidate cells around the standing hits. When two or more hits share a
/// row or column, only the two line extensions qualify; otherwise any
/// unshot 4-neighbor of a hit does. Returns `None` when every candidate is
/// exhausted, which sends the AI back to hunt mode.
fn target_candidate<R: Rng>(
    rng: &mut R,
    state: &AiState,
    board: &Board,
    board_size: u16,
) -> Option<Coord> {
    let hits: Vec<Coord> = state.last_hits.iter().map(|&c| decode(c)).collect();
    if hits.is_empty() {
        return None;
    }
    let mut candidates: Vec<Coord> = Vec::new();
    let same_row = hits.len() >= 2 && hits.iter().all(|c| c.row == hits[0].row);
    let same_col = hits.len() >= 2 && hits.iter().all(|c| c.col == hits[0].col);
    if same_row {
        let row = hits[0].row;
        let min = hits.iter().map(|c| c.col).min().expect("hits is non-empty");
        let max = hits.iter().map(|c| c.col).max().expect("hits is non-empty");
        if min > 1 {
            candidates.push(Coord::new(row, min - 1));
        }
        if max < board_size {
            candidates.push(Coord::new(row, max + 1));
        }
    } else if same_col {
        let col = hits[0].col;
        let min = hits.iter().map(|c| c.row).min().expect("hits is non-empty");
        let max = hits.iter().map(|c| c.row).max().expect("hits is non-empty");
        if min > 1 {
            candidates.push(Coord::new(min - 1, col));
        }
        if max < board_size {
            candidates.push(Coord::new(max + 1, col));
        }
    } else {
        for &hit in &hits {
            candidates.extend(hit.neighbors(board_size));
        }
        candidates.sort_unstable();
        candidates.dedup();
    }
    candidates.retain(|c| !board.has_shot(c.code()));
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    use super::*;
    use crate::game::PendingShip;

    fn side_with(sizes: &[u8], board_size: u16) -> SideState {
        let to_place: VecDeque<PendingShip> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| PendingShip {
                template_id: Uuid::new_v4(),
                name: format!("Ship{i}"),
                size,
                placement_index: i,
            })
            .collect();
        SideState {
            player_id: None,
            board: Board::new(board_size),
            fleet: crate::fleet::FleetTree::new(None),
            to_place,
        }
    }

    #[test]
    fn auto_place_fills_the_fleet() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut side = side_with(&[5, 4, 3, 3, 2], 10);
            auto_place(&mut rng, &mut side, 10).unwrap();
            assert!(side.to_place.is_empty());
            assert_eq!(side.fleet.ship_count(), 5);
            assert_eq!(side.board.occupied_count(), 17);
        }
    }

    #[test]
    fn auto_place_gives_up_on_impossible_fleets() {
        // 40 cells cannot fit on a 5x5 board.
        let mut rng = StdRng::seed_from_u64(7);
        let mut side = side_with(&[5; 8], 5);
        assert_eq!(
            auto_place(&mut rng, &mut side, 5),
            Err(GameError::PlacementImpossible(MAX_PLACEMENT_ATTEMPTS))
        );
    }

    #[test]
    fn hunt_only_picks_open_cells() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut board = Board::new(5);
        for row in 1..=5 {
            for col in 1..=5 {
                if (row, col) != (3, 4) {
                    board.record_shot(Coord::new(row, col).code(), crate::board::ShotResult::Water);
                }
            }
        }
        let state = AiState::default();
        assert_eq!(next_shot(&mut rng, &state, &board, 5).unwrap(), Coord::new(3, 4));
    }

    #[test]
    fn target_mode_fires_next_to_a_single_hit() {
        let mut rng = StdRng::seed_from_u64(2);
        let board = Board::new(10);
        let state = AiState {
            mode: AiMode::Target,
            last_hits: vec![Coord::new(5, 5).code()],
        };
        for _ in 0..20 {
            let coord = next_shot(&mut rng, &state, &board, 10).unwrap();
            let neighbors: Vec<Coord> = Coord::new(5, 5).neighbors(10).collect();
            assert!(neighbors.contains(&coord), "{coord} is not adjacent to E5");
        }
    }

    #[test]
    fn aligned_hits_restrict_candidates_to_the_line() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::new(10);
        let state = AiState {
            mode: AiMode::Target,
            last_hits: vec![Coord::new(5, 5).code(), Coord::new(5, 6).code()],
        };
        for _ in 0..20 {
            let coord = next_shot(&mut rng, &state, &board, 10).unwrap();
            assert!(
                coord == Coord::new(5, 4) || coord == Coord::new(5, 7),
                "{coord} is not a row extension"
            );
        }
    }

    #[test]
    fn exhausted_targets_fall_back_to_hunt() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut board = Board::new(10);
        let hit = Coord::new(1, 1);
        for neighbor in hit.neighbors(10) {
            board.record_shot(neighbor.code(), crate::board::ShotResult::Water);
        }
        let state = AiState {
            mode: AiMode::Target,
            last_hits: vec![hit.code()],
        };
        // Every neighbor of A1 is spent, so the AI hunts instead.
        let coord = next_shot(&mut rng, &state, &board, 10).unwrap();
        assert!(!board.has_shot(coord.code()));
    }
}
