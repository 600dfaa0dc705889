//! Game manager: the single entry point for player actions.
//!
//! Every action validates fully before it touches the board, so a returned
//! error always leaves the game exactly as it was. Accepted actions clear
//! the acting unit's per-turn flags.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::board::{Board, Faction, Position, Tile, Unit};
use super::catalog::{SupplyRole, UnitCatalog, UnitType};
use super::combat::{self, Combatant, Exchange, JitterSource};
use super::config::GameConfig;
use super::error::{GameError, Result};
use super::pathfinding::{cost_within, distance_field};
use super::terrain::TerrainType;
use super::turn::{self, TurnReport};

/// Tiles hit by a missile, relative to the target.
pub const MISSILE_BLAST: [(i32, i32); 13] = [
    (0, 0),
    (1, 0),
    (2, 0),
    (-1, 0),
    (-2, 0),
    (0, 1),
    (0, 2),
    (0, -1),
    (0, -2),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// A player action as received from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Select { x: i32, y: i32 },
    Deselect,
    Move { x: i32, y: i32, x2: i32, y2: i32 },
    MoveById { id: Uuid, x: i32, y: i32 },
    Attack { x: i32, y: i32, x2: i32, y2: i32 },
    DamageEstimate { x: i32, y: i32, x2: i32, y2: i32 },
    Capture { x: i32, y: i32 },
    Create { army: String, unit_type: String, x: i32, y: i32 },
    Delete { x: i32, y: i32 },
    Resupply { x: i32, y: i32, x2: i32, y2: i32 },
    Join { x: i32, y: i32, x2: i32, y2: i32 },
    Load { x: i32, y: i32, x2: i32, y2: i32 },
    Unload { x: i32, y: i32, x2: i32, y2: i32, index: usize },
    LaunchMissile { x: i32, y: i32, x2: i32, y2: i32 },
    Wait { x: i32, y: i32 },
    EndTurn,
    CheckTurn,
    Tile { x: i32, y: i32 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Deselect => "deselect",
            Self::Move { .. } => "move",
            Self::MoveById { .. } => "move_by_id",
            Self::Attack { .. } => "attack",
            Self::DamageEstimate { .. } => "damage_estimate",
            Self::Capture { .. } => "capture",
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::Resupply { .. } => "resupply",
            Self::Join { .. } => "join",
            Self::Load { .. } => "load",
            Self::Unload { .. } => "unload",
            Self::LaunchMissile { .. } => "launch_missile",
            Self::Wait { .. } => "wait",
            Self::EndTurn => "end_turn",
            Self::CheckTurn => "check_turn",
            Self::Tile { .. } => "tile",
        }
    }
}

/// Result of an attack. A destroyed side is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub exchange: Exchange,
    pub attacker: Option<Unit>,
    pub defender: Option<Unit>,
}

impl AttackOutcome {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "damage_dealt": self.exchange.damage_dealt,
            "damage_taken": self.exchange.damage_taken,
            "attacker": self.attacker.as_ref().map(|u| u.to_json()),
            "defender": self.defender.as_ref().map(|u| u.to_json())
        })
    }
}

/// Owns one board and applies actions to it.
#[derive(Debug, Clone)]
pub struct GameManager<J = ChaCha8Rng> {
    board: Board,
    catalog: UnitCatalog,
    config: GameConfig,
    jitter: J,
}

impl GameManager<ChaCha8Rng> {
    /// Manager with an entropy-seeded damage roll.
    pub fn new(board: Board, catalog: UnitCatalog, config: GameConfig) -> Self {
        Self::with_jitter(board, catalog, config, ChaCha8Rng::from_entropy())
    }

    /// Manager with a reproducible damage roll.
    pub fn seeded(board: Board, catalog: UnitCatalog, config: GameConfig, seed: u64) -> Self {
        Self::with_jitter(board, catalog, config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<J: JitterSource> GameManager<J> {
    pub fn with_jitter(board: Board, catalog: UnitCatalog, config: GameConfig, jitter: J) -> Self {
        Self {
            board,
            catalog,
            config,
            jitter,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Faction whose turn it is.
    pub fn check_turn(&self) -> Faction {
        self.board.current_turn()
    }

    /// Faction that captured an HQ, once the game is over.
    pub fn winner(&self) -> Option<Faction> {
        self.board.winner
    }

    pub fn tile(&self, x: i32, y: i32) -> Result<&Tile> {
        self.board.tile_at(x, y)
    }

    /// Unit roster for clients.
    pub fn troop_info(&self) -> serde_json::Value {
        self.catalog.to_json()
    }

    // --- Validation helpers ---

    fn ensure_active(&self) -> Result<()> {
        if self.board.game_active {
            Ok(())
        } else {
            Err(GameError::GameOver)
        }
    }

    fn ensure_turn(&self, faction: Faction) -> Result<()> {
        let current = self.board.current_turn();
        if faction == current {
            Ok(())
        } else {
            Err(GameError::IllegalTurn { faction, current })
        }
    }

    fn unit_at(&self, pos: Position, what: &'static str) -> Result<&Unit> {
        self.board.unit_at(pos).ok_or(GameError::NotFound {
            what,
            x: pos.x,
            y: pos.y,
        })
    }

    /// The unit at `pos`, which must belong to the faction on turn.
    fn own_unit(&self, pos: Position) -> Result<&Unit> {
        let unit = self.unit_at(pos, "unit")?;
        self.ensure_turn(unit.faction)?;
        Ok(unit)
    }

    fn unit_at_mut(&mut self, pos: Position) -> Result<&mut Unit> {
        self.board.unit_at_mut(pos).ok_or(GameError::NotFound {
            what: "unit",
            x: pos.x,
            y: pos.y,
        })
    }

    /// Movement cost from `from` to `to` if the unit can afford it this turn.
    fn reach(&self, unit: &Unit, from: Position, to: Position) -> Result<u32> {
        let def = self.catalog.get(unit.unit_type);
        let budget = def.move_range.min(unit.status.fuel);
        cost_within(&self.board, from, to, def.movement, unit.faction, budget)
            .ok_or(GameError::UnreachableTarget { x: to.x, y: to.y })
    }

    /// Everything but the per-turn flag needed for `attacker` to strike `target`.
    fn check_strike(&self, attacker: &Unit, from: Position, target: &Unit, to: Position) -> Result<()> {
        if target.faction == attacker.faction {
            return Err(GameError::InvalidCombat("cannot attack an allied unit"));
        }
        if !self.catalog.can_engage(attacker.unit_type, target.unit_type) {
            return Err(GameError::InvalidCombat("unit cannot engage this target"));
        }
        if !self.catalog.get(attacker.unit_type).in_attack_range(from.distance(&to)) {
            return Err(GameError::InvalidCombat("target is out of range"));
        }
        if attacker.status.ammo == 0 {
            return Err(GameError::InvalidCombat("unit is out of ammo"));
        }
        Ok(())
    }

    // --- Selection ---

    /// Select the unit at (x, y) and highlight its options. Selecting the
    /// selected tile again deselects it.
    pub fn select(&mut self, x: i32, y: i32) -> Result<Unit> {
        let pos = self.board.position(x, y)?;
        let unit = self.unit_at(pos, "unit")?.clone();

        if self.board.selected == Some(pos) {
            self.board.clear_selection();
            return Ok(unit);
        }

        self.ensure_turn(unit.faction)?;
        self.highlight(pos, &unit);
        Ok(unit)
    }

    pub fn deselect(&mut self) {
        self.board.clear_selection();
    }

    fn highlight(&mut self, pos: Position, unit: &Unit) {
        let def = self.catalog.get(unit.unit_type);
        let budget = def.move_range.min(unit.status.fuel);
        let field = unit
            .can_move
            .then(|| distance_field(&self.board, pos, def.movement, unit.faction));

        let flags: Vec<(bool, bool)> = self
            .board
            .tiles()
            .iter()
            .enumerate()
            .map(|(i, tile)| {
                let movable = tile.pos != pos
                    && tile.unit.is_none()
                    && field.as_ref().is_some_and(|f| f[i] <= budget);
                let attackable = unit.can_attack
                    && tile
                        .unit
                        .as_ref()
                        .is_some_and(|target| self.check_strike(unit, pos, target, tile.pos).is_ok());
                (movable, attackable)
            })
            .collect();

        self.board.clear_selection();
        self.board.selected = Some(pos);
        for (tile, (movable, attackable)) in self.board.tiles_mut().iter_mut().zip(flags) {
            tile.can_be_moved_to = movable;
            tile.can_be_attacked = attackable;
        }
    }

    // --- Movement ---

    /// Move the unit at (x, y) to (x2, y2).
    pub fn move_unit(&mut self, x: i32, y: i32, x2: i32, y2: i32) -> Result<Unit> {
        self.ensure_active()?;
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;

        let unit = self.own_unit(from)?;
        if !unit.can_move {
            return Err(GameError::ActionExhausted("move"));
        }
        if from == to || self.board.tile(to).is_occupied() {
            return Err(GameError::UnreachableTarget { x: to.x, y: to.y });
        }
        let cost = self.reach(unit, from, to)?;

        let is_indirect = self.catalog.get(unit.unit_type).is_indirect();
        let Some(mut unit) = self.board.take_unit(from) else {
            return Err(GameError::NotFound {
                what: "unit",
                x: from.x,
                y: from.y,
            });
        };
        unit.status.fuel = unit.status.fuel.saturating_sub(from.distance(&to));
        unit.can_move = false;
        if is_indirect {
            unit.can_attack = false;
        }
        debug!(id = %unit.id, %from, %to, cost, "unit moved");
        self.board.place_unit(to, unit.clone())?;
        self.highlight(to, &unit);
        Ok(unit)
    }

    /// Move a unit standing on the board, found by id.
    pub fn move_by_id(&mut self, id: Uuid, x: i32, y: i32) -> Result<Unit> {
        self.ensure_active()?;
        let from = self.board.find_unit(id).ok_or(GameError::UnitNotFound(id))?;
        self.move_unit(from.x as i32, from.y as i32, x, y)
    }

    /// End the unit's actions without doing anything.
    pub fn wait(&mut self, x: i32, y: i32) -> Result<Unit> {
        self.ensure_active()?;
        let pos = self.board.position(x, y)?;
        self.own_unit(pos)?;

        let unit = self.unit_at_mut(pos)?;
        unit.set_ready(false);
        let unit = unit.clone();
        self.board.clear_selection();
        Ok(unit)
    }

    // --- Combat ---

    /// Attack from (x, y) into (x2, y2).
    pub fn attack(&mut self, x: i32, y: i32, x2: i32, y2: i32) -> Result<AttackOutcome> {
        self.ensure_active()?;
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;

        let attacker = self.own_unit(from)?.clone();
        if !attacker.can_attack {
            return Err(GameError::ActionExhausted("attack"));
        }
        let defender = self.unit_at(to, "target unit")?.clone();
        self.check_strike(&attacker, from, &defender, to)?;

        let exchange = combat::resolve(
            &self.catalog,
            Combatant {
                unit: &attacker,
                terrain: self.board.tile(from).terrain,
            },
            Combatant {
                unit: &defender,
                terrain: self.board.tile(to).terrain,
            },
            &mut self.jitter,
            self.config.jitter_span,
        );

        if let Some(defender) = self.board.unit_at_mut(to) {
            defender.status.hp = exchange.defender_hp;
            if exchange.retaliated {
                defender.status.ammo = defender.status.ammo.saturating_sub(1);
            }
        }
        if let Some(attacker) = self.board.unit_at_mut(from) {
            attacker.status.hp = exchange.attacker_hp;
            attacker.status.ammo = attacker.status.ammo.saturating_sub(1);
            attacker.set_ready(false);
        }

        let defender = self.remove_if_destroyed(to);
        let attacker = self.remove_if_destroyed(from);
        self.board.clear_selection();

        debug!(
            %from,
            %to,
            dealt = exchange.damage_dealt,
            taken = exchange.damage_taken,
            "attack resolved"
        );

        Ok(AttackOutcome {
            exchange,
            attacker,
            defender,
        })
    }

    /// Remove the unit at `pos` if its HP hit zero; return it if it survived.
    fn remove_if_destroyed(&mut self, pos: Position) -> Option<Unit> {
        let hp = self.board.unit_at(pos)?.status.hp;
        if hp == 0 {
            if let Some(unit) = self.board.take_unit(pos) {
                info!(id = %unit.id, faction = %unit.faction, %pos, "unit destroyed");
            }
            None
        } else {
            self.board.unit_at(pos).cloned()
        }
    }

    /// Minimum damage both sides would take if (x, y) attacked (x2, y2).
    /// Nothing is changed.
    pub fn damage_estimate(&self, x: i32, y: i32, x2: i32, y2: i32) -> Result<Exchange> {
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;
        let attacker = self.unit_at(from, "unit")?;
        let defender = self.unit_at(to, "target unit")?;

        Ok(combat::estimate(
            &self.catalog,
            Combatant {
                unit: attacker,
                terrain: self.board.tile(from).terrain,
            },
            Combatant {
                unit: defender,
                terrain: self.board.tile(to).terrain,
            },
        ))
    }

    // --- Property ---

    /// Work toward capturing the property under the unit at (x, y).
    pub fn capture(&mut self, x: i32, y: i32) -> Result<Tile> {
        self.ensure_active()?;
        let pos = self.board.position(x, y)?;
        let unit = self.own_unit(pos)?;
        if !unit.can_attack {
            return Err(GameError::ActionExhausted("capture"));
        }

        let tile = self.board.tile(pos);
        if !tile.terrain.is_capturable() {
            return Err(GameError::invalid(format!(
                "{} cannot be captured",
                tile.terrain.as_str()
            )));
        }
        if !self.catalog.get(unit.unit_type).captures {
            return Err(GameError::invalid(format!("{} cannot capture", unit.unit_type)));
        }
        if tile.owner == Some(unit.faction) {
            return Err(GameError::invalid("property already belongs to this faction"));
        }

        let faction = unit.faction;
        let strength = unit.display_hp() as i32;
        let reset = self.board.capture_max();

        let tile = self.board.tile_mut(pos);
        tile.capture_points -= strength;
        let mut captured_hq = false;
        if tile.capture_points <= 0 {
            tile.owner = Some(faction);
            tile.capture_points = reset;
            captured_hq = tile.terrain == TerrainType::Headquarters;
            info!(%faction, %pos, terrain = tile.terrain.as_str(), "property captured");
        } else {
            debug!(%faction, %pos, remaining = tile.capture_points, "capture in progress");
        }

        if captured_hq {
            self.board.game_active = false;
            self.board.winner = Some(faction);
            info!(%faction, "headquarters captured, game over");
        }

        self.unit_at_mut(pos)?.set_ready(false);
        self.board.clear_selection();
        Ok(self.board.tile(pos).clone())
    }

    /// Fire the silo at (x, y) at (x2, y2).
    pub fn launch_missile(&mut self, x: i32, y: i32, x2: i32, y2: i32) -> Result<Tile> {
        self.ensure_active()?;
        let silo = self.board.position(x, y)?;
        let target = self.board.position(x2, y2)?;

        let terrain = self.board.tile(silo).terrain;
        if terrain != TerrainType::MissileSilo {
            return Err(GameError::invalid(format!(
                "cannot launch from {}",
                terrain.as_str()
            )));
        }
        let unit = self.own_unit(silo)?;
        if !unit.can_attack {
            return Err(GameError::ActionExhausted("launch"));
        }

        self.board.tile_mut(silo).terrain = TerrainType::EmptySilo;
        self.unit_at_mut(silo)?.set_ready(false);
        self.board.clear_selection();

        let (damage, floor) = (self.config.missile_damage, self.config.missile_floor);
        for (dx, dy) in MISSILE_BLAST {
            let Some(pos) = self.board.offset(target, dx, dy) else {
                continue;
            };
            if let Some(unit) = self.board.unit_at_mut(pos) {
                let hp = unit.status.hp;
                unit.status.hp = hp.saturating_sub(damage).max(hp.min(floor));
                debug!(id = %unit.id, %pos, hp = unit.status.hp, "missile hit");
            }
        }

        info!(%silo, %target, "missile launched");
        Ok(self.board.tile(silo).clone())
    }

    // --- Production ---

    /// Build a unit for `army` at (x, y), paid from its treasury.
    pub fn create_unit(&mut self, army: &str, unit_type: &str, x: i32, y: i32) -> Result<Unit> {
        self.ensure_active()?;
        let faction: Faction = army.parse().map_err(GameError::InvalidAction)?;
        let unit_type: UnitType = unit_type.parse().map_err(GameError::InvalidAction)?;
        self.ensure_turn(faction)?;

        let pos = self.board.position(x, y)?;
        let tile = self.board.tile(pos);
        if tile.is_occupied() {
            return Err(GameError::invalid(format!("tile {} is occupied", pos)));
        }
        let def = self.catalog.get(unit_type);
        if !tile.terrain.is_passable_for(def.movement) {
            return Err(GameError::invalid(format!(
                "{} cannot stand on {}",
                unit_type,
                tile.terrain.as_str()
            )));
        }

        let funds = self.board.funds(faction);
        if def.cost > funds {
            return Err(GameError::InsufficientFunds {
                cost: def.cost,
                funds,
            });
        }

        let mut unit = Unit::new(faction, unit_type, def);
        unit.set_ready(true);
        if let Some(ledger) = self.board.ledger_mut(faction) {
            ledger.funds -= def.cost;
        }
        self.board.place_unit(pos, unit.clone())?;

        debug!(id = %unit.id, %faction, %unit_type, %pos, "unit created");
        Ok(unit)
    }

    /// Remove the unit at (x, y) from play.
    pub fn delete_unit(&mut self, x: i32, y: i32) -> Result<Unit> {
        self.ensure_active()?;
        let pos = self.board.position(x, y)?;
        self.own_unit(pos)?;

        let unit = self.board.take_unit(pos).ok_or(GameError::NotFound {
            what: "unit",
            x: pos.x,
            y: pos.y,
        })?;
        self.board.clear_selection();
        debug!(id = %unit.id, %pos, "unit deleted");
        Ok(unit)
    }

    // --- Logistics ---

    /// Refill the unit at (x2, y2) from the supply unit at (x, y).
    pub fn resupply(&mut self, x: i32, y: i32, x2: i32, y2: i32) -> Result<Unit> {
        self.ensure_active()?;
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;

        let supplier = self.own_unit(from)?;
        if self.catalog.get(supplier.unit_type).supply != SupplyRole::Adjacent {
            return Err(GameError::invalid(format!(
                "{} cannot resupply",
                supplier.unit_type
            )));
        }
        if !supplier.can_attack {
            return Err(GameError::ActionExhausted("resupply"));
        }
        let faction = supplier.faction;
        let target = self.unit_at(to, "target unit")?;
        if !from.is_adjacent_to(&to) {
            return Err(GameError::UnreachableTarget { x: to.x, y: to.y });
        }
        if target.faction != faction {
            return Err(GameError::invalid("can only resupply allied units"));
        }

        let def = self.catalog.get(target.unit_type);
        if let Some(target) = self.board.unit_at_mut(to) {
            target.resupply(def);
        }
        let target = self.unit_at(to, "target unit")?.clone();
        self.unit_at_mut(from)?.set_ready(false);
        self.board.clear_selection();

        debug!(id = %target.id, %from, %to, "unit resupplied");
        Ok(target)
    }

    /// Merge the unit at (x, y) into the damaged unit at (x2, y2).
    pub fn join(&mut self, x: i32, y: i32, x2: i32, y2: i32) -> Result<Unit> {
        self.ensure_active()?;
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;

        let unit = self.own_unit(from)?;
        if from == to {
            return Err(GameError::invalid("a unit cannot join itself"));
        }
        let target = self.unit_at(to, "target unit")?;
        if target.faction != unit.faction {
            return Err(GameError::IncompatibleCargo("can only join allied units"));
        }
        if target.unit_type != unit.unit_type {
            return Err(GameError::IncompatibleCargo("can only join units of the same type"));
        }
        let max_hp = self.catalog.get(target.unit_type).max_hp;
        if target.status.hp >= max_hp {
            return Err(GameError::CapacityExceeded);
        }
        if !unit.status.cargo.is_empty() {
            return Err(GameError::IncompatibleCargo("cannot join while carrying units"));
        }
        if !unit.can_move {
            return Err(GameError::ActionExhausted("move"));
        }
        self.reach(unit, from, to)?;

        let Some(joining) = self.board.take_unit(from) else {
            return Err(GameError::NotFound {
                what: "unit",
                x: from.x,
                y: from.y,
            });
        };
        let target = self.unit_at_mut(to)?;
        target.status.hp = (target.status.hp + joining.status.hp).min(max_hp);
        target.set_ready(false);
        let target = target.clone();
        self.board.clear_selection();

        debug!(joined = %joining.id, into = %target.id, hp = target.status.hp, "units joined");
        Ok(target)
    }

    /// Board the unit at (x, y) onto the transport at (x2, y2).
    pub fn load(&mut self, x: i32, y: i32, x2: i32, y2: i32) -> Result<Unit> {
        self.ensure_active()?;
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;

        let unit = self.own_unit(from)?;
        if from == to {
            return Err(GameError::invalid("a unit cannot load into itself"));
        }
        let transport = self.unit_at(to, "transport")?;
        if transport.faction != unit.faction {
            return Err(GameError::IncompatibleCargo("transport belongs to another faction"));
        }
        let transport_def = self.catalog.get(transport.unit_type);
        if !transport_def.can_carry(unit.unit_type) {
            return Err(GameError::IncompatibleCargo("transport cannot carry this unit type"));
        }
        if transport.status.cargo.len() >= transport_def.capacity {
            return Err(GameError::CapacityExceeded);
        }
        if !unit.can_move {
            return Err(GameError::ActionExhausted("move"));
        }
        self.reach(unit, from, to)?;

        let resupplies = transport_def.supply == SupplyRole::Cargo;
        let Some(mut cargo) = self.board.take_unit(from) else {
            return Err(GameError::NotFound {
                what: "unit",
                x: from.x,
                y: from.y,
            });
        };
        cargo.status.fuel = cargo.status.fuel.saturating_sub(from.distance(&to));
        if resupplies {
            cargo.resupply(self.catalog.get(cargo.unit_type));
        }
        cargo.set_ready(false);
        debug!(id = %cargo.id, %from, %to, "unit loaded");

        let transport = self.unit_at_mut(to)?;
        transport.status.cargo.push(cargo);
        let transport = transport.clone();
        self.board.clear_selection();
        Ok(transport)
    }

    /// Drop cargo slot `index` of the transport at (x, y) onto (x2, y2).
    pub fn unload(&mut self, x: i32, y: i32, x2: i32, y2: i32, index: usize) -> Result<Unit> {
        self.ensure_active()?;
        let from = self.board.position(x, y)?;
        let to = self.board.position(x2, y2)?;

        let transport = self.own_unit(from)?;
        if !transport.can_attack {
            return Err(GameError::ActionExhausted("unload"));
        }
        if !from.is_adjacent_to(&to) || self.board.tile(to).is_occupied() {
            return Err(GameError::UnreachableTarget { x: to.x, y: to.y });
        }
        let cargo = transport.status.cargo.get(index).ok_or(GameError::NotFound {
            what: "cargo",
            x: from.x,
            y: from.y,
        })?;
        let movement = self.catalog.get(cargo.unit_type).movement;
        if !self.board.tile(to).terrain.is_passable_for(movement) {
            return Err(GameError::IncompatibleCargo("unit cannot stand on that terrain"));
        }

        let transport = self.unit_at_mut(from)?;
        let mut unit = transport.status.cargo.remove(index);
        transport.set_ready(false);
        unit.set_ready(false);
        self.board.place_unit(to, unit.clone())?;
        self.board.clear_selection();

        debug!(id = %unit.id, %from, %to, "unit unloaded");
        Ok(unit)
    }

    // --- Turns ---

    /// Pass the turn to the next faction.
    pub fn end_turn(&mut self) -> Result<TurnReport> {
        self.ensure_active()?;
        Ok(turn::end_turn(&mut self.board, &self.catalog, &self.config))
    }

    // --- Dispatch ---

    /// Apply one action and return its client-facing result.
    pub fn apply(&mut self, action: Action) -> Result<serde_json::Value> {
        let name = action.name();
        let result = self.dispatch(action);
        match &result {
            Ok(_) => debug!(action = name, "action accepted"),
            Err(err) => debug!(action = name, %err, "action rejected"),
        }
        result
    }

    fn dispatch(&mut self, action: Action) -> Result<serde_json::Value> {
        let value = match action {
            Action::Select { x, y } => self.select(x, y)?.to_json(),
            Action::Deselect => {
                self.deselect();
                serde_json::Value::Null
            }
            Action::Move { x, y, x2, y2 } => self.move_unit(x, y, x2, y2)?.to_json(),
            Action::MoveById { id, x, y } => self.move_by_id(id, x, y)?.to_json(),
            Action::Attack { x, y, x2, y2 } => self.attack(x, y, x2, y2)?.to_json(),
            Action::DamageEstimate { x, y, x2, y2 } => {
                let estimate = self.damage_estimate(x, y, x2, y2)?;
                serde_json::json!({
                    "attacker_hp": estimate.attacker_hp,
                    "defender_hp": estimate.defender_hp
                })
            }
            Action::Capture { x, y } => self.capture(x, y)?.to_json(),
            Action::Create {
                army,
                unit_type,
                x,
                y,
            } => self.create_unit(&army, &unit_type, x, y)?.to_json(),
            Action::Delete { x, y } => self.delete_unit(x, y)?.to_json(),
            Action::Resupply { x, y, x2, y2 } => self.resupply(x, y, x2, y2)?.to_json(),
            Action::Join { x, y, x2, y2 } => self.join(x, y, x2, y2)?.to_json(),
            Action::Load { x, y, x2, y2 } => self.load(x, y, x2, y2)?.to_json(),
            Action::Unload {
                x,
                y,
                x2,
                y2,
                index,
            } => self.unload(x, y, x2, y2, index)?.to_json(),
            Action::LaunchMissile { x, y, x2, y2 } => self.launch_missile(x, y, x2, y2)?.to_json(),
            Action::Wait { x, y } => self.wait(x, y)?.to_json(),
            Action::EndTurn => {
                let report = self.end_turn()?;
                serde_json::json!({
                    "current_turn": report.current.as_str(),
                    "days": report.day
                })
            }
            Action::CheckTurn => serde_json::json!(self.check_turn().as_str()),
            Action::Tile { x, y } => self.tile(x, y)?.to_json(),
        };
        Ok(value)
    }
}
