//! Per-player board state: the occupancy index and the shot index.
//!
//! Both indexes are [`CodeTree`]s. Occupancy maps each occupied cell's code
//! to the index of the ship in the owner's fleet tree (indices rather than
//! references, so the board and the fleet never form an ownership cycle).
//! The shot index records every coordinate this player has fired at the
//! opponent, with its result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bst::CodeTree;
use crate::coord::{Code, Coord};

/// Result of a resolved shot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotResult {
    Water,
    Hit,
    Sunk,
}

impl ShotResult {
    /// Whether the shot struck a ship.
    pub fn is_hit(self) -> bool {
        matches!(self, ShotResult::Hit | ShotResult::Sunk)
    }
}

/// Error from placing a ship over an already-occupied cell.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("cell {0} is already occupied")]
pub struct Occupied(pub Coord);

/// One player's board.
pub struct Board {
    size: u16,
    occupied: CodeTree<usize>,
    shots_fired: CodeTree<ShotResult>,
}

impl Board {
    /// Construct an empty board of the given edge length.
    pub fn new(size: u16) -> Self {
        Self {
            size,
            occupied: CodeTree::new(),
            shots_fired: CodeTree::new(),
        }
    }

    /// Edge length of the board.
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Number of occupied cells. Equals the sum of placed ship sizes.
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// Index of the ship occupying `code`, if any.
    pub fn ship_index_at(&self, code: Code) -> Option<usize> {
        self.occupied.get(code).copied()
    }

    /// Whether any placed ship occupies `code`.
    pub fn is_occupied(&self, code: Code) -> bool {
        self.occupied.contains(code)
    }

    /// Record the cells of a newly placed ship under `ship_index`.
    ///
    /// All cells are checked before any is inserted, so a rejected placement
    /// leaves the board untouched. The segment codes are bulk-loaded in
    /// recursive-middle order.
    pub fn place(&mut self, ship_index: usize, segments: &[Coord]) -> Result<(), Occupied> {
        for &coord in segments {
            if self.occupied.contains(coord.code()) {
                return Err(Occupied(coord));
            }
        }
        let mut codes: Vec<(Code, usize)> =
            segments.iter().map(|c| (c.code(), ship_index)).collect();
        codes.sort_unstable_by_key(|&(code, _)| code);
        self.occupied
            .insert_many(codes)
            .expect("placement cells were checked disjoint");
        Ok(())
    }

    /// Whether this player has already fired at `code`.
    pub fn has_shot(&self, code: Code) -> bool {
        self.shots_fired.contains(code)
    }

    /// Record a shot this player fired at the opponent. The caller checks
    /// [`Board::has_shot`] first; a duplicate here is a bug.
    pub fn record_shot(&mut self, code: Code, result: ShotResult) {
        self.shots_fired
            .insert(code, result)
            .expect("duplicate shots are rejected before resolution");
    }

    /// Number of shots this player has fired.
    pub fn shots_fired(&self) -> usize {
        self.shots_fired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{span, Orientation};

    #[test]
    fn place_indexes_every_segment() {
        let mut board = Board::new(10);
        let cells = span(Coord::new(1, 1), Orientation::Horizontal, 3, 10).unwrap();
        board.place(0, &cells).unwrap();
        assert_eq!(board.occupied_count(), 3);
        assert_eq!(board.ship_index_at(102), Some(0));
        assert!(!board.is_occupied(104));
    }

    #[test]
    fn overlapping_placement_is_rejected_atomically() {
        let mut board = Board::new(10);
        let first = span(Coord::new(1, 1), Orientation::Horizontal, 2, 10).unwrap();
        board.place(0, &first).unwrap();
        // A2 is taken, so the whole second placement is refused.
        let second = span(Coord::new(1, 2), Orientation::Horizontal, 2, 10).unwrap();
        assert_eq!(board.place(1, &second), Err(Occupied(Coord::new(1, 2))));
        assert_eq!(board.occupied_count(), 2);
        assert!(!board.is_occupied(103));
    }

    #[test]
    fn shots_are_tracked_per_code() {
        let mut board = Board::new(10);
        let code = Coord::new(3, 3).code();
        assert!(!board.has_shot(code));
        board.record_shot(code, ShotResult::Water);
        assert!(board.has_shot(code));
        assert_eq!(board.shots_fired(), 1);
    }
}
