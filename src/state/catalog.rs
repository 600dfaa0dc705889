//! Unit catalog.
//!
//! Static per-type definitions and the base damage table. Everything a rule
//! check needs to know about a unit type (how it moves, whether it fights
//! directly, what it carries, what it supplies) is resolved here once, so the
//! rest of the engine asks the catalog instead of testing type membership.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Every unit type in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitType {
    AntiAir,
    Apc,
    Artillery,
    BCopter,
    Battleship,
    BlackBoat,
    BlackBomb,
    Bomber,
    Carrier,
    Cruiser,
    Fighter,
    Infantry,
    Lander,
    MediumTank,
    Mech,
    MegaTank,
    Missile,
    NeoTank,
    PipeRunner,
    Recon,
    Rocket,
    Stealth,
    Sub,
    TCopter,
    Tank,
}

impl UnitType {
    pub const COUNT: usize = 25;

    pub const ALL: [UnitType; Self::COUNT] = [
        Self::AntiAir,
        Self::Apc,
        Self::Artillery,
        Self::BCopter,
        Self::Battleship,
        Self::BlackBoat,
        Self::BlackBomb,
        Self::Bomber,
        Self::Carrier,
        Self::Cruiser,
        Self::Fighter,
        Self::Infantry,
        Self::Lander,
        Self::MediumTank,
        Self::Mech,
        Self::MegaTank,
        Self::Missile,
        Self::NeoTank,
        Self::PipeRunner,
        Self::Recon,
        Self::Rocket,
        Self::Stealth,
        Self::Sub,
        Self::TCopter,
        Self::Tank,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AntiAir => "ANTIAIR",
            Self::Apc => "APC",
            Self::Artillery => "ARTILLERY",
            Self::BCopter => "BCOPTER",
            Self::Battleship => "BATTLESHIP",
            Self::BlackBoat => "BLACKBOAT",
            Self::BlackBomb => "BLACKBOMB",
            Self::Bomber => "BOMBER",
            Self::Carrier => "CARRIER",
            Self::Cruiser => "CRUISER",
            Self::Fighter => "FIGHTER",
            Self::Infantry => "INFANTRY",
            Self::Lander => "LANDER",
            Self::MediumTank => "MEDIUMTANK",
            Self::Mech => "MECH",
            Self::MegaTank => "MEGATANK",
            Self::Missile => "MISSILE",
            Self::NeoTank => "NEOTANK",
            Self::PipeRunner => "PIPERUNNER",
            Self::Recon => "RECON",
            Self::Rocket => "ROCKET",
            Self::Stealth => "STEALTH",
            Self::Sub => "SUB",
            Self::TCopter => "TCOPTER",
            Self::Tank => "TANK",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == wanted)
            .ok_or_else(|| format!("unknown unit type '{}'", s))
    }
}

/// How a unit crosses terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementClass {
    Foot,
    Boots,
    Treads,
    Tires,
    Air,
    Sea,
    Lander,
    Pipe,
}

impl MovementClass {
    pub const COUNT: usize = 8;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// How a unit engages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatClass {
    /// Adjacent attacks; trades blows with other direct units.
    Direct,
    /// Ranged attacks; never retaliates and is never retaliated against.
    Indirect,
    /// Cannot attack at all.
    None,
}

/// What a unit resupplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SupplyRole {
    #[default]
    None,
    /// Refills allied units on the four neighbouring tiles.
    Adjacent,
    /// Refills units as they embark.
    Cargo,
}

/// Immutable definition of one unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTypeDefinition {
    #[serde(rename = "class")]
    pub movement: MovementClass,
    pub cost: u32,
    #[serde(rename = "move")]
    pub move_range: u32,
    /// Inclusive Manhattan range as (min, max).
    #[serde(rename = "range", default)]
    pub attack_range: (u32, u32),
    #[serde(rename = "fuel")]
    pub max_fuel: u32,
    pub vision: u32,
    #[serde(rename = "hp", default = "default_max_hp")]
    pub max_hp: u32,
    #[serde(rename = "ammo", default)]
    pub max_ammo: u32,
    #[serde(default)]
    pub capacity: usize,
    #[serde(default)]
    pub carries: Vec<UnitType>,
    pub combat: CombatClass,
    /// Fuel burned every turn the unit starts; non-zero means it can run dry.
    #[serde(default)]
    pub daily_fuel: u32,
    #[serde(default)]
    pub captures: bool,
    #[serde(default)]
    pub supply: SupplyRole,
}

/// Upper bound on any unit's hit points.
pub const MAX_HP: u32 = 100;

fn default_max_hp() -> u32 {
    MAX_HP
}

impl UnitTypeDefinition {
    /// Bare definition; chain `stats` and `armed` to fill it in.
    pub fn new(movement: MovementClass, combat: CombatClass, cost: u32) -> Self {
        Self {
            movement,
            cost,
            move_range: 0,
            attack_range: (0, 0),
            max_fuel: 0,
            vision: 0,
            max_hp: default_max_hp(),
            max_ammo: 0,
            capacity: 0,
            carries: Vec::new(),
            combat,
            daily_fuel: 0,
            captures: false,
            supply: SupplyRole::None,
        }
    }

    pub fn stats(mut self, move_range: u32, max_fuel: u32, vision: u32) -> Self {
        self.move_range = move_range;
        self.max_fuel = max_fuel;
        self.vision = vision;
        self
    }

    pub fn armed(mut self, attack_range: (u32, u32), max_ammo: u32) -> Self {
        self.attack_range = attack_range;
        self.max_ammo = max_ammo;
        self
    }

    pub fn carrying(mut self, capacity: usize, carries: &[UnitType]) -> Self {
        self.capacity = capacity;
        self.carries = carries.to_vec();
        self
    }

    pub fn with_daily_fuel(mut self, fuel: u32) -> Self {
        self.daily_fuel = fuel;
        self
    }

    pub fn capturing(mut self) -> Self {
        self.captures = true;
        self
    }

    pub fn supplying(mut self, role: SupplyRole) -> Self {
        self.supply = role;
        self
    }

    pub fn can_carry(&self, cargo: UnitType) -> bool {
        self.capacity > 0 && self.carries.contains(&cargo)
    }

    pub fn is_direct(&self) -> bool {
        self.combat == CombatClass::Direct
    }

    pub fn is_indirect(&self) -> bool {
        self.combat == CombatClass::Indirect
    }

    pub fn depletes_fuel(&self) -> bool {
        self.daily_fuel > 0
    }

    pub fn in_attack_range(&self, distance: u32) -> bool {
        let (min, max) = self.attack_range;
        self.combat != CombatClass::None && min <= distance && distance <= max
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

type DamageTable = [[u32; UnitType::COUNT]; UnitType::COUNT];

// Rows are attackers, columns defenders, both in `UnitType::ALL` order.
const STANDARD_DAMAGE: DamageTable = [
    [45, 50, 50, 120, 0, 0, 120, 75, 0, 0, 65, 105, 0, 10, 105, 1, 55, 5, 25, 60, 55, 75, 0, 120, 25],
    [0; UnitType::COUNT],
    [75, 70, 75, 0, 40, 55, 0, 0, 45, 65, 0, 90, 55, 45, 85, 15, 80, 40, 70, 80, 80, 0, 60, 0, 70],
    [25, 60, 65, 65, 25, 25, 0, 0, 25, 55, 0, 75, 25, 25, 75, 10, 65, 20, 55, 55, 65, 0, 25, 95, 55],
    [85, 80, 80, 0, 50, 95, 0, 0, 60, 95, 0, 95, 95, 55, 90, 25, 90, 50, 80, 90, 85, 0, 95, 0, 80],
    [0; UnitType::COUNT],
    [0; UnitType::COUNT],
    [95, 105, 105, 0, 75, 95, 0, 0, 75, 85, 0, 110, 95, 95, 110, 35, 105, 90, 105, 105, 105, 0, 95, 0, 105],
    [0, 0, 0, 115, 0, 0, 120, 100, 0, 0, 100, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 100, 0, 115, 0],
    [0, 0, 0, 115, 0, 25, 120, 65, 5, 0, 55, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 100, 90, 115, 0],
    [0, 0, 0, 100, 0, 0, 120, 100, 0, 0, 55, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 85, 0, 100, 0],
    [5, 14, 15, 7, 0, 0, 0, 0, 0, 0, 0, 55, 0, 1, 45, 1, 26, 1, 5, 12, 25, 0, 0, 30, 5],
    [0; UnitType::COUNT],
    [105, 105, 105, 12, 10, 35, 0, 0, 10, 45, 0, 105, 35, 55, 95, 25, 105, 45, 85, 105, 105, 0, 10, 45, 85],
    [65, 75, 70, 9, 0, 0, 0, 0, 0, 0, 0, 65, 0, 15, 55, 5, 85, 15, 55, 85, 85, 0, 0, 35, 55],
    [195, 195, 195, 22, 45, 105, 0, 0, 45, 65, 0, 135, 75, 125, 125, 65, 195, 115, 180, 195, 195, 0, 45, 55, 180],
    [0, 0, 0, 120, 0, 0, 120, 100, 0, 0, 100, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 100, 0, 120, 0],
    [115, 125, 115, 22, 15, 40, 0, 0, 15, 50, 0, 125, 50, 75, 115, 35, 125, 55, 105, 125, 125, 0, 15, 55, 105],
    [85, 80, 80, 105, 55, 60, 120, 75, 60, 85, 65, 95, 60, 55, 90, 25, 90, 50, 80, 90, 85, 75, 85, 105, 80],
    [4, 45, 45, 12, 0, 0, 0, 0, 0, 0, 0, 70, 0, 1, 65, 1, 28, 1, 6, 35, 55, 0, 0, 35, 6],
    [85, 80, 80, 0, 55, 60, 0, 0, 60, 85, 0, 95, 60, 55, 90, 25, 90, 50, 80, 90, 85, 0, 85, 0, 80],
    [50, 85, 75, 85, 45, 65, 120, 70, 45, 35, 45, 90, 65, 70, 90, 15, 85, 60, 80, 85, 85, 55, 55, 95, 75],
    [0, 0, 0, 0, 55, 95, 0, 0, 75, 25, 0, 0, 95, 0, 0, 0, 0, 0, 0, 0, 0, 0, 55, 0, 0],
    [0; UnitType::COUNT],
    [65, 75, 70, 10, 1, 10, 0, 0, 1, 5, 0, 75, 10, 15, 70, 10, 85, 15, 55, 85, 85, 0, 1, 40, 55],
];

/// Catalog file layout: `[units.<TYPE>]` tables plus `[damage.<ATTACKER>]`
/// tables mapping defender type to base power. Omitted damage pairs are zero.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    units: BTreeMap<String, UnitTypeDefinition>,
    #[serde(default)]
    damage: BTreeMap<String, BTreeMap<String, u32>>,
}

fn parse_type_key(key: &str) -> Result<UnitType, ConfigError> {
    key.parse().map_err(|reason| ConfigError::InvalidUnit {
        unit: key.to_string(),
        reason,
    })
}

/// All unit definitions plus the base damage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCatalog {
    units: Vec<UnitTypeDefinition>,
    damage: DamageTable,
}

impl UnitCatalog {
    /// The built-in unit roster.
    pub fn standard() -> Self {
        use CombatClass::{Direct, Indirect};
        use MovementClass::*;
        use UnitType as T;

        let none = CombatClass::None;
        let foot_soldiers = [T::Infantry, T::Mech];
        let units = vec![
            // AntiAir
            UnitTypeDefinition::new(Treads, Direct, 8000)
                .stats(6, 60, 2)
                .armed((1, 1), 9),
            // Apc
            UnitTypeDefinition::new(Treads, none, 5000)
                .stats(6, 70, 1)
                .carrying(1, &foot_soldiers)
                .supplying(SupplyRole::Adjacent),
            // Artillery
            UnitTypeDefinition::new(Treads, Indirect, 6000)
                .stats(5, 50, 1)
                .armed((2, 3), 9),
            // BCopter
            UnitTypeDefinition::new(Air, Direct, 9000)
                .stats(6, 99, 3)
                .armed((1, 1), 6)
                .with_daily_fuel(2),
            // Battleship
            UnitTypeDefinition::new(Sea, Indirect, 28000)
                .stats(5, 99, 2)
                .armed((2, 6), 9)
                .with_daily_fuel(1),
            // BlackBoat
            UnitTypeDefinition::new(Lander, none, 7500)
                .stats(7, 60, 1)
                .carrying(2, &foot_soldiers)
                .supplying(SupplyRole::Adjacent)
                .with_daily_fuel(1),
            // BlackBomb
            UnitTypeDefinition::new(Air, none, 25000)
                .stats(9, 45, 1)
                .with_daily_fuel(5),
            // Bomber
            UnitTypeDefinition::new(Air, Direct, 22000)
                .stats(7, 99, 2)
                .armed((1, 1), 9)
                .with_daily_fuel(5),
            // Carrier
            UnitTypeDefinition::new(Sea, Indirect, 30000)
                .stats(5, 99, 4)
                .armed((3, 8), 9)
                .carrying(2, &[T::Fighter, T::Bomber, T::BlackBomb, T::BCopter, T::TCopter])
                .supplying(SupplyRole::Cargo)
                .with_daily_fuel(1),
            // Cruiser
            UnitTypeDefinition::new(Sea, Direct, 18000)
                .stats(6, 99, 3)
                .armed((1, 1), 9)
                .carrying(2, &[T::BCopter, T::TCopter])
                .supplying(SupplyRole::Cargo)
                .with_daily_fuel(1),
            // Fighter
            UnitTypeDefinition::new(Air, Direct, 20000)
                .stats(9, 99, 2)
                .armed((1, 1), 9)
                .with_daily_fuel(5),
            // Infantry
            UnitTypeDefinition::new(Foot, Direct, 1000)
                .stats(3, 99, 2)
                .armed((1, 1), 9)
                .capturing(),
            // Lander
            UnitTypeDefinition::new(Lander, none, 12000)
                .stats(6, 99, 1)
                .carrying(
                    2,
                    &[
                        T::Infantry,
                        T::Mech,
                        T::Apc,
                        T::Tank,
                        T::MediumTank,
                        T::NeoTank,
                        T::AntiAir,
                        T::Recon,
                        T::Artillery,
                        T::Missile,
                        T::Rocket,
                    ],
                )
                .with_daily_fuel(1),
            // MediumTank
            UnitTypeDefinition::new(Treads, Direct, 16000)
                .stats(5, 50, 1)
                .armed((1, 1), 8),
            // Mech
            UnitTypeDefinition::new(Boots, Direct, 3000)
                .stats(2, 70, 2)
                .armed((1, 1), 3)
                .capturing(),
            // MegaTank
            UnitTypeDefinition::new(Treads, Direct, 28000)
                .stats(4, 50, 1)
                .armed((1, 1), 3),
            // Missile
            UnitTypeDefinition::new(Tires, Indirect, 12000)
                .stats(4, 50, 5)
                .armed((3, 5), 6),
            // NeoTank
            UnitTypeDefinition::new(Treads, Direct, 22000)
                .stats(6, 99, 1)
                .armed((1, 1), 9),
            // PipeRunner
            UnitTypeDefinition::new(Pipe, Indirect, 20000)
                .stats(9, 99, 4)
                .armed((2, 5), 9),
            // Recon
            UnitTypeDefinition::new(Tires, Direct, 4000)
                .stats(8, 80, 5)
                .armed((1, 1), 9),
            // Rocket
            UnitTypeDefinition::new(Tires, Indirect, 15000)
                .stats(5, 50, 1)
                .armed((3, 5), 6),
            // Stealth
            UnitTypeDefinition::new(Air, Direct, 24000)
                .stats(6, 60, 4)
                .armed((1, 1), 6)
                .with_daily_fuel(8),
            // Sub
            UnitTypeDefinition::new(Sea, Direct, 20000)
                .stats(5, 60, 5)
                .armed((1, 1), 6)
                .with_daily_fuel(1),
            // TCopter
            UnitTypeDefinition::new(Air, none, 5000)
                .stats(6, 99, 2)
                .carrying(1, &foot_soldiers)
                .with_daily_fuel(2),
            // Tank
            UnitTypeDefinition::new(Treads, Direct, 7000)
                .stats(6, 70, 3)
                .armed((1, 1), 9),
        ];

        Self {
            units,
            damage: STANDARD_DAMAGE,
        }
    }

    /// Parse an injected catalog document. Every unit type must be defined.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(content)?;

        let mut defined = BTreeMap::new();
        for (key, def) in file.units {
            defined.insert(parse_type_key(&key)?, def);
        }

        let mut units = Vec::with_capacity(UnitType::COUNT);
        for ty in UnitType::ALL {
            let def = defined
                .remove(&ty)
                .ok_or_else(|| ConfigError::MissingUnit(ty.to_string()))?;
            if def.attack_range.0 > def.attack_range.1 {
                return Err(ConfigError::InvalidUnit {
                    unit: ty.to_string(),
                    reason: "range minimum exceeds maximum".to_string(),
                });
            }
            if def.max_hp == 0 || def.max_hp > MAX_HP {
                return Err(ConfigError::InvalidUnit {
                    unit: ty.to_string(),
                    reason: format!("hp must be between 1 and {}", MAX_HP),
                });
            }
            if !def.carries.is_empty() && def.capacity == 0 {
                return Err(ConfigError::InvalidUnit {
                    unit: ty.to_string(),
                    reason: "carries units but has no capacity".to_string(),
                });
            }
            units.push(def);
        }

        let mut damage = [[0; UnitType::COUNT]; UnitType::COUNT];
        for (attacker, row) in &file.damage {
            let attacker = parse_type_key(attacker)?;
            for (defender, power) in row {
                let defender = parse_type_key(defender)?;
                damage[attacker.index()][defender.index()] = *power;
            }
        }

        Ok(Self { units, damage })
    }

    pub fn get(&self, ty: UnitType) -> &UnitTypeDefinition {
        &self.units[ty.index()]
    }

    /// Base power of `attacker` against `defender`; zero means no engagement.
    pub fn base_power(&self, attacker: UnitType, defender: UnitType) -> u32 {
        self.damage[attacker.index()][defender.index()]
    }

    pub fn can_engage(&self, attacker: UnitType, defender: UnitType) -> bool {
        self.get(attacker).combat != CombatClass::None && self.base_power(attacker, defender) > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitType, &UnitTypeDefinition)> {
        UnitType::ALL.iter().copied().zip(self.units.iter())
    }

    /// Unit roster keyed by type name, for clients.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(ty, def)| (ty.to_string(), def.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
