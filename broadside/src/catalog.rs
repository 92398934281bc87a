//! Ship templates and base fleets.
//!
//! These records belong to an administrative collaborator; the engine only
//! needs a read-only lookup. Game creation snapshots names and sizes out of
//! the catalog, so deleting a template later never affects a live game.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::coord::{MAX_BOARD, MIN_BOARD};

pub type TemplateId = Uuid;
pub type FleetId = Uuid;

/// Largest ship edge a template may declare.
pub const MAX_SHIP_SIZE: u8 = 10;

/// Fraction of the board a fleet may occupy. Kept well under 1.0 so random
/// auto-placement reliably succeeds.
pub const MAX_OCCUPANCY: f64 = 0.8;

/// A ship kind: name plus segment count.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShipTemplate {
    pub id: TemplateId,
    pub name: String,
    pub size: u8,
}

/// A named fleet composition for a given board size. The same template may
/// appear more than once.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BaseFleet {
    pub id: FleetId,
    pub name: String,
    pub board_size: u16,
    pub ship_template_ids: Vec<TemplateId>,
}

/// Reason a base fleet was rejected at game creation.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum InvalidFleetReason {
    #[error("board size {0} is outside {MIN_BOARD}..={MAX_BOARD}")]
    BoardSize(u16),
    #[error("fleet references unknown ship template {0}")]
    UnknownTemplate(TemplateId),
    #[error("ship size {0} is outside 1..={MAX_SHIP_SIZE}")]
    ShipSize(u8),
    #[error("ship of size {size} does not fit a board of {board}")]
    ShipDoesNotFit { size: u8, board: u16 },
    #[error("fleet has no ships")]
    Empty,
    #[error("fleet occupies {cells} cells, over the cap of {max}")]
    TooDense { cells: usize, max: usize },
}

/// Read-only lookup interface provided by the admin collaborator.
pub trait Catalog {
    fn ship_template(&self, id: TemplateId) -> Option<ShipTemplate>;
    fn base_fleet(&self, id: FleetId) -> Option<BaseFleet>;
}

/// Resolve a fleet's templates in order and enforce fleet validity: known
/// templates, supported board size, legal ship sizes, and total occupancy of
/// at most `floor(board_size² × MAX_OCCUPANCY)` cells.
pub fn resolve_fleet<C: Catalog>(
    catalog: &C,
    fleet: &BaseFleet,
) -> Result<Vec<ShipTemplate>, InvalidFleetReason> {
    if !(MIN_BOARD..=MAX_BOARD).contains(&fleet.board_size) {
        return Err(InvalidFleetReason::BoardSize(fleet.board_size));
    }
    if fleet.ship_template_ids.is_empty() {
        return Err(InvalidFleetReason::Empty);
    }
    let mut templates = Vec::with_capacity(fleet.ship_template_ids.len());
    for &id in &fleet.ship_template_ids {
        let template = catalog
            .ship_template(id)
            .ok_or(InvalidFleetReason::UnknownTemplate(id))?;
        if template.size == 0 || template.size > MAX_SHIP_SIZE {
            return Err(InvalidFleetReason::ShipSize(template.size));
        }
        if template.size as u16 > fleet.board_size {
            return Err(InvalidFleetReason::ShipDoesNotFit {
                size: template.size,
                board: fleet.board_size,
            });
        }
        templates.push(template);
    }
    let cells: usize = templates.iter().map(|t| t.size as usize).sum();
    let max = (fleet.board_size as usize * fleet.board_size as usize) as f64 * MAX_OCCUPANCY;
    let max = max.floor() as usize;
    if cells > max {
        return Err(InvalidFleetReason::TooDense { cells, max });
    }
    Ok(templates)
}

/// In-memory [`Catalog`] used by tests and the terminal client.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    templates: HashMap<TemplateId, ShipTemplate>,
    fleets: HashMap<FleetId, BaseFleet>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ship template and return its id.
    pub fn add_template(&mut self, name: &str, size: u8) -> TemplateId {
        let id = Uuid::new_v4();
        self.templates.insert(
            id,
            ShipTemplate {
                id,
                name: name.to_owned(),
                size,
            },
        );
        id
    }

    /// Register a base fleet and return its id.
    pub fn add_fleet(
        &mut self,
        name: &str,
        board_size: u16,
        ship_template_ids: Vec<TemplateId>,
    ) -> FleetId {
        let id = Uuid::new_v4();
        self.fleets.insert(
            id,
            BaseFleet {
                id,
                name: name.to_owned(),
                board_size,
                ship_template_ids,
            },
        );
        id
    }

    /// The classic five-ship fleet on a board of the given size.
    pub fn standard_fleet(&mut self, board_size: u16) -> FleetId {
        let ships = [
            ("Carrier", 5u8),
            ("Battleship", 4),
            ("Cruiser", 3),
            ("Submarine", 3),
            ("Destroyer", 2),
        ];
        let ids = ships
            .iter()
            .map(|&(name, size)| self.add_template(name, size))
            .collect();
        self.add_fleet("Standard", board_size, ids)
    }
}

impl Catalog for InMemoryCatalog {
    fn ship_template(&self, id: TemplateId) -> Option<ShipTemplate> {
        self.templates.get(&id).cloned()
    }

    fn base_fleet(&self, id: FleetId) -> Option<BaseFleet> {
        self.fleets.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_fleet_resolves() {
        let mut catalog = InMemoryCatalog::new();
        let fleet_id = catalog.standard_fleet(10);
        let fleet = catalog.base_fleet(fleet_id).unwrap();
        let templates = resolve_fleet(&catalog, &fleet).unwrap();
        assert_eq!(templates.len(), 5);
        assert_eq!(templates[0].name, "Carrier");
        assert_eq!(templates[4].size, 2);
    }

    #[test]
    fn dense_fleet_is_rejected() {
        let mut catalog = InMemoryCatalog::new();
        // 21 cells on a 5x5 board: the cap is floor(25 * 0.8) = 20.
        let big = catalog.add_template("Hulk", 7);
        let fleet_id = catalog.add_fleet("Dense", 5, vec![big, big, big]);
        let fleet = catalog.base_fleet(fleet_id).unwrap();
        assert_eq!(
            resolve_fleet(&catalog, &fleet),
            Err(InvalidFleetReason::TooDense { cells: 21, max: 20 })
        );
    }

    #[test]
    fn unknown_template_is_rejected() {
        let mut catalog = InMemoryCatalog::new();
        let missing = Uuid::new_v4();
        let fleet_id = catalog.add_fleet("Ghost", 10, vec![missing]);
        let fleet = catalog.base_fleet(fleet_id).unwrap();
        assert_eq!(
            resolve_fleet(&catalog, &fleet),
            Err(InvalidFleetReason::UnknownTemplate(missing))
        );
    }

    #[test]
    fn out_of_range_board_is_rejected() {
        let mut catalog = InMemoryCatalog::new();
        let t = catalog.add_template("Patrol", 2);
        for size in [4, 21] {
            let fleet_id = catalog.add_fleet("Odd", size, vec![t]);
            let fleet = catalog.base_fleet(fleet_id).unwrap();
            assert_eq!(
                resolve_fleet(&catalog, &fleet),
                Err(InvalidFleetReason::BoardSize(size))
            );
        }
    }
}
