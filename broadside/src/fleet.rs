//! Fleet tree: a first-child/next-sibling tree rooted at the player,
//! branching into ships and then into segments.
//!
//! Segment hit flags are the authoritative record; a ship is "sunk" exactly
//! when every one of its segments is hit, and that state is always derived,
//! never stored.

use serde::Serialize;
use uuid::Uuid;

use crate::catalog::TemplateId;
use crate::coord::{Code, Coord};

/// One cell of a placed ship.
struct SegmentNode {
    coord: Coord,
    code: Code,
    hit: bool,
    next: Option<Box<SegmentNode>>,
}

/// A placed ship: payload plus the segment chain.
struct ShipNode {
    template_id: TemplateId,
    name: String,
    size: u8,
    placement_index: usize,
    first_segment: Option<Box<SegmentNode>>,
    next: Option<Box<ShipNode>>,
}

impl ShipNode {
    fn segments(&self) -> Segments<'_> {
        Segments(self.first_segment.as_deref())
    }

    fn sunk(&self) -> bool {
        let mut any = false;
        for seg in self.segments() {
            if !seg.hit {
                return false;
            }
            any = true;
        }
        any
    }
}

/// Result of [`FleetTree::mark_hit`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HitMark {
    /// A ship contained the code and its segment is now marked hit.
    pub ship_found: bool,
    /// Every segment of that ship is now hit.
    pub ship_sunk: bool,
}

impl HitMark {
    const MISS: HitMark = HitMark {
        ship_found: false,
        ship_sunk: false,
    };
}

/// The fleet of one player: root (player) → ships → segments.
pub struct FleetTree {
    owner: Option<Uuid>,
    first_ship: Option<Box<ShipNode>>,
    ship_count: usize,
}

impl FleetTree {
    /// Construct an empty fleet. `owner` is `None` for the AI side.
    pub fn new(owner: Option<Uuid>) -> Self {
        Self {
            owner,
            first_ship: None,
            ship_count: 0,
        }
    }

    /// The player that owns this fleet, if it is a human side.
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    /// Append a ship at the end of the sibling chain, creating its segment
    /// children in coordinate order. Returns the ship's index, which is what
    /// the board's occupancy tree stores.
    pub fn add_ship(
        &mut self,
        template_id: TemplateId,
        name: &str,
        size: u8,
        placement_index: usize,
        segments: &[Coord],
    ) -> usize {
        let mut first_segment = None;
        for &coord in segments.iter().rev() {
            first_segment = Some(Box::new(SegmentNode {
                coord,
                code: coord.code(),
                hit: false,
                next: first_segment,
            }));
        }
        let node = Box::new(ShipNode {
            template_id,
            name: name.to_owned(),
            size,
            placement_index,
            first_segment,
            next: None,
        });

        let mut slot = &mut self.first_ship;
        while let Some(ship) = slot {
            slot = &mut ship.next;
        }
        *slot = Some(node);
        self.ship_count += 1;
        self.ship_count - 1
    }

    /// Mark the segment carrying `code` as hit. Idempotent: re-marking an
    /// already-hit segment changes nothing and reports the same sunk state.
    /// Returns `ship_found = false` if no ship contains the code.
    pub fn mark_hit(&mut self, code: Code) -> HitMark {
        let mut ship = self.first_ship.as_deref_mut();
        while let Some(s) = ship {
            let mut found = false;
            let mut seg = s.first_segment.as_deref_mut();
            while let Some(g) = seg {
                if g.code == code {
                    g.hit = true;
                    found = true;
                    break;
                }
                seg = g.next.as_deref_mut();
            }
            if found {
                return HitMark {
                    ship_found: true,
                    ship_sunk: s.sunk(),
                };
            }
            ship = s.next.as_deref_mut();
        }
        HitMark::MISS
    }

    /// Handle to the ship at `index` in placement order.
    pub fn ship(&self, index: usize) -> Option<ShipRef<'_>> {
        self.ships().nth(index)
    }

    /// Iterate ships in placement order.
    pub fn ships(&self) -> Ships<'_> {
        Ships(self.first_ship.as_deref())
    }

    /// Total number of ships in the fleet.
    pub fn ship_count(&self) -> usize {
        self.ship_count
    }

    /// Number of ships with every segment hit.
    pub fn sunk_ship_count(&self) -> usize {
        self.ships().filter(|s| s.sunk()).count()
    }

    /// Number of ships with at least one intact segment.
    pub fn alive_ship_count(&self) -> usize {
        self.ship_count - self.sunk_ship_count()
    }

    /// Whether the whole fleet is sunk. An empty fleet is not sunk.
    pub fn all_sunk(&self) -> bool {
        self.ship_count > 0 && self.ships().all(|s| s.sunk())
    }
}

/// Read handle to one ship in the fleet.
#[derive(Copy, Clone)]
pub struct ShipRef<'a>(&'a ShipNode);

impl<'a> ShipRef<'a> {
    pub fn template_id(&self) -> TemplateId {
        self.0.template_id
    }

    pub fn name(&self) -> &'a str {
        &self.0.name
    }

    pub fn size(&self) -> u8 {
        self.0.size
    }

    pub fn placement_index(&self) -> usize {
        self.0.placement_index
    }

    /// Whether every segment of this ship has been hit.
    pub fn sunk(&self) -> bool {
        self.0.sunk()
    }

    /// Iterate this ship's segments in coordinate order.
    pub fn segments(&self) -> Segments<'a> {
        self.0.segments()
    }
}

/// Iterator over the ships of a fleet.
pub struct Ships<'a>(Option<&'a ShipNode>);

impl<'a> Iterator for Ships<'a> {
    type Item = ShipRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.0?;
        self.0 = node.next.as_deref();
        Some(ShipRef(node))
    }
}

/// Snapshot of one segment, exposed through [`Segments`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct Segment {
    pub coordinate: Coord,
    pub code: Code,
    pub hit: bool,
}

/// Iterator over the segments of a ship.
pub struct Segments<'a>(Option<&'a SegmentNode>);

impl<'a> Iterator for Segments<'a> {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.0?;
        self.0 = node.next.as_deref();
        Some(Segment {
            coordinate: node.coord,
            code: node.code,
            hit: node.hit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{span, Orientation};

    fn patrol_fleet() -> FleetTree {
        let mut fleet = FleetTree::new(Some(Uuid::new_v4()));
        let cells = span(Coord::new(1, 1), Orientation::Horizontal, 2, 10).unwrap();
        fleet.add_ship(Uuid::new_v4(), "Patrol", 2, 0, &cells);
        let cells = span(Coord::new(3, 3), Orientation::Vertical, 3, 10).unwrap();
        fleet.add_ship(Uuid::new_v4(), "Cruiser", 3, 1, &cells);
        fleet
    }

    #[test]
    fn ships_keep_placement_order() {
        let fleet = patrol_fleet();
        let names: Vec<_> = fleet.ships().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, vec!["Patrol", "Cruiser"]);
        assert_eq!(fleet.ship(1).unwrap().name(), "Cruiser");
        assert_eq!(fleet.ship_count(), 2);
    }

    #[test]
    fn segments_are_created_in_coordinate_order() {
        let fleet = patrol_fleet();
        let codes: Vec<_> = fleet.ship(0).unwrap().segments().map(|s| s.code).collect();
        assert_eq!(codes, vec![101, 102]);
    }

    #[test]
    fn sunk_iff_every_segment_hit() {
        let mut fleet = patrol_fleet();
        assert_eq!(
            fleet.mark_hit(101),
            HitMark {
                ship_found: true,
                ship_sunk: false
            }
        );
        assert!(!fleet.ship(0).unwrap().sunk());
        assert_eq!(
            fleet.mark_hit(102),
            HitMark {
                ship_found: true,
                ship_sunk: true
            }
        );
        assert!(fleet.ship(0).unwrap().sunk());
        assert_eq!(fleet.sunk_ship_count(), 1);
        assert_eq!(fleet.alive_ship_count(), 1);
    }

    #[test]
    fn mark_hit_is_idempotent() {
        let mut fleet = patrol_fleet();
        fleet.mark_hit(101);
        let first = fleet.mark_hit(102);
        let second = fleet.mark_hit(102);
        assert_eq!(first, second);
        assert_eq!(fleet.sunk_ship_count(), 1);
    }

    #[test]
    fn mark_hit_misses_unknown_codes() {
        let mut fleet = patrol_fleet();
        assert_eq!(fleet.mark_hit(909), HitMark::MISS);
    }

    #[test]
    fn all_sunk_requires_every_segment_of_every_ship() {
        let mut fleet = patrol_fleet();
        for code in [101, 102, 303, 403] {
            fleet.mark_hit(code);
        }
        assert!(!fleet.all_sunk());
        fleet.mark_hit(503);
        assert!(fleet.all_sunk());
    }

    #[test]
    fn empty_fleet_is_not_sunk() {
        let fleet = FleetTree::new(None);
        assert!(!fleet.all_sunk());
        assert_eq!(fleet.alive_ship_count(), 0);
    }
}
