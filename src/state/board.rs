//! Board state: factions, units, tiles and the board aggregate.
//!
//! The board owns every unit. A unit lives either on exactly one tile or in
//! exactly one transport's cargo list, so moving a unit always means taking
//! it out of one slot and putting it into another.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{UnitType, UnitTypeDefinition};
use super::config::GameConfig;
use super::error::{GameError, Result};
use super::terrain::TerrainType;

/// The four cardinal neighbours.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// A competing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Faction {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Faction {
    pub const ALL: [Faction; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Faction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unknown faction '{}'", s))
    }
}

/// Grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance.
    pub fn distance(&self, other: &Position) -> u32 {
        (self.x.abs_diff(other.x) + self.y.abs_diff(other.y)) as u32
    }

    /// Check if two positions share an edge.
    pub fn is_adjacent_to(&self, other: &Position) -> bool {
        self.distance(other) == 1
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"x": self.x, "y": self.y})
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mutable per-unit status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub hp: u32,
    pub fuel: u32,
    pub ammo: u32,
    pub cargo: Vec<Unit>,
}

/// A unit on the board or inside a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub faction: Faction,
    pub unit_type: UnitType,
    pub status: UnitStatus,
    pub can_move: bool,
    pub can_attack: bool,
}

impl Unit {
    /// A fresh unit with full HP, fuel and ammo and no actions available.
    pub fn new(faction: Faction, unit_type: UnitType, def: &UnitTypeDefinition) -> Self {
        Self {
            id: Uuid::new_v4(),
            faction,
            unit_type,
            status: UnitStatus {
                hp: def.max_hp,
                fuel: def.max_fuel,
                ammo: def.max_ammo,
                cargo: Vec::new(),
            },
            can_move: false,
            can_attack: false,
        }
    }

    /// HP as shown to players, 1 through 10.
    pub fn display_hp(&self) -> u32 {
        self.status.hp.div_ceil(10)
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.can_move = ready;
        self.can_attack = ready;
    }

    /// Refill fuel and ammo to the type's maximum.
    pub fn resupply(&mut self, def: &UnitTypeDefinition) {
        self.status.fuel = def.max_fuel;
        self.status.ammo = def.max_ammo;
    }

    /// This unit followed by everything it carries, depth first.
    pub fn with_cargo(&self) -> Vec<&Unit> {
        let mut out = vec![self];
        for carried in &self.status.cargo {
            out.extend(carried.with_cargo());
        }
        out
    }

    /// Apply `f` to this unit and everything it carries.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Unit)) {
        f(self);
        for carried in &mut self.status.cargo {
            carried.for_each_mut(f);
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let cargo: Vec<serde_json::Value> = self.status.cargo.iter().map(|u| u.to_json()).collect();
        serde_json::json!({
            "id": self.id.to_string(),
            "army": self.faction.as_str(),
            "type": self.unit_type.as_str(),
            "status": {
                "hp": self.status.hp,
                "fuel": self.status.fuel,
                "ammo": self.status.ammo,
                "cargo": cargo
            },
            "can_move": self.can_move,
            "can_attack": self.can_attack
        })
    }
}

/// One map cell as handed over by the map loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTile {
    pub terrain: TerrainType,
    pub owner: Option<Faction>,
}

impl MapTile {
    pub fn new(terrain: TerrainType) -> Self {
        Self {
            terrain,
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: Faction) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// A parsed map: dimensions, row-major cells and turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<MapTile>,
    pub turn_order: Vec<Faction>,
}

impl Map {
    /// A map covered in one terrain type.
    pub fn filled(width: usize, height: usize, terrain: TerrainType, turn_order: Vec<Faction>) -> Self {
        Self {
            width,
            height,
            tiles: vec![MapTile::new(terrain); width * height],
            turn_order,
        }
    }

    /// Replace the cell at (x, y). Out-of-range cells are ignored.
    pub fn with_tile(mut self, x: usize, y: usize, tile: MapTile) -> Self {
        if x < self.width && y < self.height {
            self.tiles[x + y * self.width] = tile;
        }
        self
    }
}

/// A board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: Position,
    pub terrain: TerrainType,
    pub owner: Option<Faction>,
    /// Remaining capture points; only meaningful on capturable terrain.
    pub capture_points: i32,
    pub unit: Option<Unit>,
    /// Highlight for the selected unit (derived view).
    #[serde(default)]
    pub can_be_moved_to: bool,
    /// Highlight for the selected unit (derived view).
    #[serde(default)]
    pub can_be_attacked: bool,
}

impl Tile {
    pub fn is_occupied(&self) -> bool {
        self.unit.is_some()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "x": self.pos.x,
            "y": self.pos.y,
            "terrain": self.terrain.as_str(),
            "army": self.owner.map(|f| f.as_str()),
            "capture_hp": self.capture_points,
            "unit": self.unit.as_ref().map(|u| u.to_json()),
            "can_be_moved_to": self.can_be_moved_to,
            "can_be_attacked": self.can_be_attacked
        })
    }
}

/// Per-faction counters, recomputed each turn change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyLedger {
    pub faction: Faction,
    pub troops: usize,
    pub properties: usize,
    pub funds: u32,
}

impl ArmyLedger {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            troops: 0,
            properties: 0,
            funds: 0,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "army": self.faction.as_str(),
            "troops": self.troops,
            "properties": self.properties,
            "funds": self.funds
        })
    }
}

/// The aggregate root for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    tiles: Vec<Tile>,
    pub selected: Option<Position>,
    turn_order: Vec<Faction>,
    current_turn: Faction,
    pub game_active: bool,
    pub winner: Option<Faction>,
    armies: Vec<ArmyLedger>,
    pub day: u32,
    capture_points: i32,
}

impl Board {
    /// Build a board from a parsed map, crediting the first faction's
    /// starting income.
    pub fn create(map: &Map, config: &GameConfig) -> Result<Self> {
        let current_turn = *map
            .turn_order
            .first()
            .ok_or_else(|| GameError::invalid("map has no turn order"))?;
        if map.tiles.len() != map.width * map.height || map.tiles.is_empty() {
            return Err(GameError::invalid("map tiles do not match its dimensions"));
        }
        let mut turn_order: Vec<Faction> = Vec::with_capacity(map.turn_order.len());
        for faction in &map.turn_order {
            if turn_order.contains(faction) {
                return Err(GameError::invalid("faction listed twice in turn order"));
            }
            turn_order.push(*faction);
        }

        let tiles = map
            .tiles
            .iter()
            .enumerate()
            .map(|(i, cell)| Tile {
                pos: Position::new(i % map.width, i / map.width),
                terrain: cell.terrain,
                owner: cell.owner,
                capture_points: config.capture_points,
                unit: None,
                can_be_moved_to: false,
                can_be_attacked: false,
            })
            .collect();

        let armies = turn_order.iter().map(|f| ArmyLedger::new(*f)).collect();

        let mut board = Self {
            width: map.width,
            height: map.height,
            tiles,
            selected: None,
            turn_order,
            current_turn,
            game_active: true,
            winner: None,
            armies,
            day: 1,
            capture_points: config.capture_points,
        };

        board.recount();
        let starting = board.properties_of(current_turn) as u32 * config.income_per_property;
        if let Some(ledger) = board.ledger_mut(current_turn) {
            ledger.funds += starting;
        }

        Ok(board)
    }

    /// Resolve raw coordinates to a position on this board.
    pub fn position(&self, x: i32, y: i32) -> Result<Position> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Err(GameError::OutOfRange { x, y });
        }
        Ok(Position::new(x as usize, y as usize))
    }

    /// Step from `pos` by an offset, staying on the board.
    pub fn offset(&self, pos: Position, dx: i32, dy: i32) -> Option<Position> {
        self.position(pos.x as i32 + dx, pos.y as i32 + dy).ok()
    }

    /// On-board cardinal neighbours of `pos`.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.offset(pos, dx, dy))
    }

    pub fn index_of(&self, pos: Position) -> usize {
        pos.x + pos.y * self.width
    }

    pub fn tile(&self, pos: Position) -> &Tile {
        &self.tiles[self.index_of(pos)]
    }

    pub fn tile_mut(&mut self, pos: Position) -> &mut Tile {
        let index = self.index_of(pos);
        &mut self.tiles[index]
    }

    /// Tile lookup from raw coordinates.
    pub fn tile_at(&self, x: i32, y: i32) -> Result<&Tile> {
        let pos = self.position(x, y)?;
        Ok(self.tile(pos))
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.tile(pos).unit.as_ref()
    }

    pub fn unit_at_mut(&mut self, pos: Position) -> Option<&mut Unit> {
        self.tile_mut(pos).unit.as_mut()
    }

    /// Position of the tile holding the unit with `id`. Embarked units have none.
    pub fn find_unit(&self, id: Uuid) -> Option<Position> {
        self.tiles
            .iter()
            .find(|t| t.unit.as_ref().is_some_and(|u| u.id == id))
            .map(|t| t.pos)
    }

    /// Put a unit on an empty tile. An occupied tile is left as it was.
    pub fn place_unit(&mut self, pos: Position, unit: Unit) -> Result<()> {
        let tile = self.tile_mut(pos);
        if tile.unit.is_some() {
            return Err(GameError::invalid(format!("tile {} is occupied", pos)));
        }
        tile.unit = Some(unit);
        Ok(())
    }

    /// Lift the unit off a tile; an emptied property regains its capture points.
    pub fn take_unit(&mut self, pos: Position) -> Option<Unit> {
        let capture_points = self.capture_points;
        let tile = self.tile_mut(pos);
        let unit = tile.unit.take();
        if tile.terrain.is_capturable() {
            tile.capture_points = capture_points;
        }
        unit
    }

    /// Capture points a property resets to.
    pub fn capture_max(&self) -> i32 {
        self.capture_points
    }

    /// Every unit on the board, including embarked cargo.
    pub fn all_units(&self) -> Vec<&Unit> {
        self.tiles
            .iter()
            .filter_map(|t| t.unit.as_ref())
            .flat_map(|u| u.with_cargo())
            .collect()
    }

    pub fn for_each_unit_mut(&mut self, mut f: impl FnMut(&mut Unit)) {
        for tile in &mut self.tiles {
            if let Some(unit) = tile.unit.as_mut() {
                unit.for_each_mut(&mut f);
            }
        }
    }

    pub fn contains_unit(&self, id: Uuid) -> bool {
        self.all_units().iter().any(|u| u.id == id)
    }

    pub fn turn_order(&self) -> &[Faction] {
        &self.turn_order
    }

    pub fn current_turn(&self) -> Faction {
        self.current_turn
    }

    pub(crate) fn set_current_turn(&mut self, faction: Faction) {
        debug_assert!(self.turn_order.contains(&faction));
        self.current_turn = faction;
    }

    pub fn armies(&self) -> &[ArmyLedger] {
        &self.armies
    }

    pub fn ledger(&self, faction: Faction) -> Option<&ArmyLedger> {
        self.armies.iter().find(|l| l.faction == faction)
    }

    pub fn ledger_mut(&mut self, faction: Faction) -> Option<&mut ArmyLedger> {
        self.armies.iter_mut().find(|l| l.faction == faction)
    }

    pub fn funds(&self, faction: Faction) -> u32 {
        self.ledger(faction).map_or(0, |l| l.funds)
    }

    /// Number of tiles owned by `faction`.
    pub fn properties_of(&self, faction: Faction) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.owner == Some(faction))
            .count()
    }

    /// Recompute troop and property counts for every faction.
    pub fn recount(&mut self) {
        let mut counts: Vec<(Faction, usize, usize)> = self
            .turn_order
            .iter()
            .map(|f| (*f, 0, 0))
            .collect();
        for unit in self.all_units() {
            if let Some(entry) = counts.iter_mut().find(|(f, _, _)| *f == unit.faction) {
                entry.1 += 1;
            }
        }
        for tile in &self.tiles {
            if let Some(owner) = tile.owner {
                if let Some(entry) = counts.iter_mut().find(|(f, _, _)| *f == owner) {
                    entry.2 += 1;
                }
            }
        }
        for (faction, troops, properties) in counts {
            if let Some(ledger) = self.ledger_mut(faction) {
                ledger.troops = troops;
                ledger.properties = properties;
            }
        }
    }

    /// Drop the selection and every highlight.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        for tile in &mut self.tiles {
            tile.can_be_moved_to = false;
            tile.can_be_attacked = false;
        }
    }

    /// Serialize for storage.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Restore from storage.
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Client-facing snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        let tiles: Vec<serde_json::Value> = self.tiles.iter().map(|t| t.to_json()).collect();
        let armies: Vec<serde_json::Value> = self.armies.iter().map(|a| a.to_json()).collect();
        let turn_order: Vec<&str> = self.turn_order.iter().map(|f| f.as_str()).collect();

        serde_json::json!({
            "width": self.width,
            "height": self.height,
            "grid": tiles,
            "selected": self.selected.map(|p| p.to_json()),
            "turn_order": turn_order,
            "current_turn": self.current_turn.as_str(),
            "game_active": self.game_active,
            "winner": self.winner.map(|f| f.as_str()),
            "armies": armies,
            "days": self.day
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::UnitCatalog;
    use pretty_assertions::assert_eq;

    fn make_map() -> Map {
        Map::filled(5, 4, TerrainType::Plain, vec![Faction::Red, Faction::Blue])
            .with_tile(0, 0, MapTile::new(TerrainType::Headquarters).owned_by(Faction::Red))
            .with_tile(1, 0, MapTile::new(TerrainType::City).owned_by(Faction::Red))
            .with_tile(4, 3, MapTile::new(TerrainType::Headquarters).owned_by(Faction::Blue))
    }

    fn make_unit(faction: Faction, ty: UnitType) -> Unit {
        let catalog = UnitCatalog::standard();
        Unit::new(faction, ty, catalog.get(ty))
    }

    #[test]
    fn test_faction_parse() {
        assert_eq!("red".parse::<Faction>(), Ok(Faction::Red));
        assert_eq!(" Blue ".parse::<Faction>(), Ok(Faction::Blue));
        assert!("PURPLE".parse::<Faction>().is_err());
    }

    #[test]
    fn test_position_distance() {
        let p = Position::new(2, 2);
        assert_eq!(p.distance(&Position::new(0, 0)), 4);
        assert!(p.is_adjacent_to(&Position::new(2, 3)));
        assert!(!p.is_adjacent_to(&Position::new(3, 3)));
        assert!(!p.is_adjacent_to(&p));
    }

    #[test]
    fn test_create_board() {
        let board = Board::create(&make_map(), &GameConfig::default()).unwrap();

        assert_eq!(board.tiles().len(), 20);
        assert_eq!(board.tile(Position::new(3, 2)).pos, Position::new(3, 2));
        assert_eq!(board.current_turn(), Faction::Red);
        assert_eq!(board.day, 1);
        assert!(board.game_active);
        assert_eq!(board.funds(Faction::Red), 2000);
        assert_eq!(board.funds(Faction::Blue), 0);
        assert_eq!(board.ledger(Faction::Blue).unwrap().properties, 1);
    }

    #[test]
    fn test_create_rejects_bad_maps() {
        let config = GameConfig::default();
        let no_turns = Map::filled(3, 3, TerrainType::Plain, vec![]);
        assert!(Board::create(&no_turns, &config).is_err());

        let mut short = Map::filled(3, 3, TerrainType::Plain, vec![Faction::Red]);
        short.tiles.pop();
        assert!(Board::create(&short, &config).is_err());

        let twice = Map::filled(3, 3, TerrainType::Plain, vec![Faction::Red, Faction::Red]);
        assert!(Board::create(&twice, &config).is_err());
    }

    #[test]
    fn test_position_bounds() {
        let board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        assert!(board.position(4, 3).is_ok());
        assert_eq!(board.position(5, 0), Err(GameError::OutOfRange { x: 5, y: 0 }));
        assert_eq!(board.position(0, 4), Err(GameError::OutOfRange { x: 0, y: 4 }));
        assert!(board.position(-1, 0).is_err());
    }

    #[test]
    fn test_neighbors_at_corner() {
        let board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        let around: Vec<Position> = board.neighbors(Position::new(0, 0)).collect();
        assert_eq!(around.len(), 2);
        assert_eq!(board.neighbors(Position::new(2, 2)).count(), 4);
    }

    #[test]
    fn test_take_unit_resets_capture_points() {
        let mut board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        let city = Position::new(1, 0);
        board.place_unit(city, make_unit(Faction::Blue, UnitType::Infantry)).unwrap();
        board.tile_mut(city).capture_points = 7;

        assert!(board.take_unit(city).is_some());
        assert_eq!(board.tile(city).capture_points, 20);
        assert!(!board.tile(city).is_occupied());
    }

    #[test]
    fn test_place_unit_refuses_occupied_tile() {
        let mut board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        let pos = Position::new(2, 2);
        let tank = make_unit(Faction::Red, UnitType::Tank);
        let tank_id = tank.id;
        board.place_unit(pos, tank).unwrap();

        let intruder = make_unit(Faction::Blue, UnitType::Infantry);
        let intruder_id = intruder.id;
        assert!(matches!(
            board.place_unit(pos, intruder),
            Err(GameError::InvalidAction(_))
        ));
        assert_eq!(board.unit_at(pos).map(|u| u.id), Some(tank_id));
        assert!(!board.contains_unit(intruder_id));
    }

    #[test]
    fn test_all_units_includes_cargo() {
        let mut board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        let mut apc = make_unit(Faction::Red, UnitType::Apc);
        let rider = make_unit(Faction::Red, UnitType::Infantry);
        let rider_id = rider.id;
        apc.status.cargo.push(rider);
        board.place_unit(Position::new(2, 2), apc).unwrap();

        assert_eq!(board.all_units().len(), 2);
        assert!(board.contains_unit(rider_id));
        assert_eq!(board.find_unit(rider_id), None);

        board.recount();
        assert_eq!(board.ledger(Faction::Red).unwrap().troops, 2);
    }

    #[test]
    fn test_json_round_trip() {
        let mut board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        board.place_unit(Position::new(2, 1), make_unit(Faction::Red, UnitType::Tank)).unwrap();

        let text = board.to_json_string().unwrap();
        let restored = Board::from_json_str(&text).unwrap();
        assert_eq!(restored, board);
    }

    #[test]
    fn test_snapshot_json() {
        let board = Board::create(&make_map(), &GameConfig::default()).unwrap();
        let json = board.to_json();
        assert_eq!(json["current_turn"], "RED");
        assert_eq!(json["grid"][0]["terrain"], "headquarters");
        assert_eq!(json["grid"][0]["army"], "RED");
        assert_eq!(json["armies"][0]["funds"], 2000);
    }
}
