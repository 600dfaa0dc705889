//! Turn sequencing and start-of-turn upkeep.
//!
//! Order of operations on each turn change:
//! 1. Recount troops and properties, credit income
//! 2. Advance to the next faction (day ticks when the order wraps)
//! 3. Reset per-turn flags for every unit
//! 4. Upkeep for the new faction: fuel, repair, adjacent resupply
//! 5. Restore capture points on empty properties

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::board::{Board, Faction, Position};
use super::catalog::{SupplyRole, UnitCatalog};
use super::config::GameConfig;

/// What happened during one turn change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub ended: Faction,
    pub current: Faction,
    pub day: u32,
    /// Units that ran out of fuel and were removed.
    pub lost_to_fuel: Vec<Uuid>,
}

/// Faction following `current` in the turn order, and whether the order wrapped.
pub fn next_faction(order: &[Faction], current: Faction) -> (Faction, bool) {
    let index = order.iter().position(|f| *f == current).unwrap_or(0);
    let next = (index + 1) % order.len().max(1);
    (order.get(next).copied().unwrap_or(current), next == 0)
}

/// Credit income to every property-holding faction other than the one ending its turn.
pub fn credit_income(board: &mut Board, ending: Faction, income_per_property: u32) {
    let credits: Vec<(Faction, u32)> = board
        .armies()
        .iter()
        .filter(|ledger| ledger.faction != ending && ledger.properties > 0)
        .map(|ledger| (ledger.faction, ledger.properties as u32 * income_per_property))
        .collect();

    for (faction, amount) in credits {
        if let Some(ledger) = board.ledger_mut(faction) {
            ledger.funds = ledger.funds.saturating_add(amount);
            debug!(%faction, amount, funds = ledger.funds, "income credited");
        }
    }
}

/// Pass the turn and run upkeep for the faction that takes over.
#[instrument(skip_all, name = "end_turn")]
pub fn end_turn(board: &mut Board, catalog: &UnitCatalog, config: &GameConfig) -> TurnReport {
    let ended = board.current_turn();
    board.clear_selection();

    board.recount();
    credit_income(board, ended, config.income_per_property);

    let (current, wrapped) = next_faction(board.turn_order(), ended);
    board.set_current_turn(current);
    if wrapped {
        board.day += 1;
    }

    board.for_each_unit_mut(|unit| unit.set_ready(unit.faction == current));

    let lost_to_fuel = upkeep(board, catalog, config, current);
    reset_capture_points(board);
    board.recount();

    info!(%ended, %current, day = board.day, "turn passed");

    TurnReport {
        ended,
        current,
        day: board.day,
        lost_to_fuel,
    }
}

/// Fuel drain, repair and resupply for units standing on the board.
fn upkeep(board: &mut Board, catalog: &UnitCatalog, config: &GameConfig, faction: Faction) -> Vec<Uuid> {
    let positions: Vec<Position> = board
        .tiles()
        .iter()
        .filter(|t| t.unit.as_ref().is_some_and(|u| u.faction == faction))
        .map(|t| t.pos)
        .collect();

    let mut lost = Vec::new();
    let mut suppliers = Vec::new();

    for pos in positions {
        let tile = board.tile(pos);
        let (terrain, owner) = (tile.terrain, tile.owner);
        let Some(unit) = board.unit_at_mut(pos) else {
            continue;
        };
        let def = catalog.get(unit.unit_type);

        unit.status.fuel = unit.status.fuel.saturating_sub(def.daily_fuel);
        if def.depletes_fuel() && unit.status.fuel == 0 {
            let id = unit.id;
            board.take_unit(pos);
            debug!(%id, %pos, "unit ran out of fuel");
            lost.push(id);
            continue;
        }

        if owner == Some(faction) && terrain.repairs(def.movement) {
            unit.status.hp = (unit.status.hp + config.repair_hp).min(def.max_hp);
            unit.resupply(def);
            debug!(id = %unit.id, %pos, hp = unit.status.hp, "unit repaired");
        }

        if def.supply == SupplyRole::Adjacent {
            suppliers.push(pos);
        }
    }

    for pos in suppliers {
        let neighbors: Vec<Position> = board.neighbors(pos).collect();
        for next in neighbors {
            if let Some(unit) = board.unit_at_mut(next) {
                if unit.faction == faction {
                    unit.resupply(catalog.get(unit.unit_type));
                    debug!(id = %unit.id, from = %pos, "unit resupplied");
                }
            }
        }
    }

    lost
}

fn reset_capture_points(board: &mut Board) {
    let max = board.capture_max();
    for tile in board.tiles_mut() {
        if tile.unit.is_none() && tile.terrain.is_capturable() {
            tile.capture_points = max;
        }
    }
}
