//! Terrain types and their static rule tables.
//!
//! Movement cost, defense stars and repair eligibility are fixed lookups
//! keyed by terrain (and movement class where it matters).

use serde::{Deserialize, Serialize};

use super::catalog::MovementClass;

/// Reserved movement cost meaning "impassable for this class".
pub const INF: u32 = u32::MAX;

const X: u32 = INF;

/// Terrain a tile can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    #[default]
    Plain,
    Wood,
    Mountain,
    River,
    Road,
    Bridge,
    Sea,
    Shoal,
    Reef,
    Pipe,
    City,
    Factory,
    Airport,
    Port,
    Headquarters,
    MissileSilo,
    EmptySilo,
}

// Columns: foot, boots, treads, tires, air, sea, lander, pipe.
const MOVEMENT_COST: [[u32; MovementClass::COUNT]; TerrainType::COUNT] = [
    [1, 1, 1, 2, 1, X, X, X], // plain
    [1, 1, 2, 3, 1, X, X, X], // wood
    [2, 1, X, X, 1, X, X, X], // mountain
    [2, 1, X, X, 1, X, X, X], // river
    [1, 1, 1, 1, 1, X, X, X], // road
    [1, 1, 1, 1, 1, X, X, X], // bridge
    [X, X, X, X, 1, 1, 1, X], // sea
    [1, 1, 1, 1, 1, X, 1, X], // shoal
    [X, X, X, X, 1, 2, 2, X], // reef
    [X, X, X, X, X, X, X, 1], // pipe
    [1, 1, 1, 1, 1, X, X, X], // city
    [1, 1, 1, 1, 1, X, X, 1], // factory
    [1, 1, 1, 1, 1, X, X, X], // airport
    [1, 1, 1, 1, 1, 1, 1, X], // port
    [1, 1, 1, 1, 1, X, X, X], // headquarters
    [1, 1, 1, 1, 1, X, X, X], // missile silo
    [1, 1, 1, 1, 1, X, X, X], // empty silo
];

const GROUND: &[MovementClass] = &[
    MovementClass::Foot,
    MovementClass::Boots,
    MovementClass::Treads,
    MovementClass::Tires,
];

impl TerrainType {
    pub const COUNT: usize = 17;

    pub const ALL: [TerrainType; Self::COUNT] = [
        Self::Plain,
        Self::Wood,
        Self::Mountain,
        Self::River,
        Self::Road,
        Self::Bridge,
        Self::Sea,
        Self::Shoal,
        Self::Reef,
        Self::Pipe,
        Self::City,
        Self::Factory,
        Self::Airport,
        Self::Port,
        Self::Headquarters,
        Self::MissileSilo,
        Self::EmptySilo,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Wood => "wood",
            Self::Mountain => "mountain",
            Self::River => "river",
            Self::Road => "road",
            Self::Bridge => "bridge",
            Self::Sea => "sea",
            Self::Shoal => "shoal",
            Self::Reef => "reef",
            Self::Pipe => "pipe",
            Self::City => "city",
            Self::Factory => "factory",
            Self::Airport => "airport",
            Self::Port => "port",
            Self::Headquarters => "headquarters",
            Self::MissileSilo => "missile_silo",
            Self::EmptySilo => "empty_silo",
        }
    }

    /// Cost for a unit of `class` to enter this terrain, or [`INF`].
    pub fn movement_cost(self, class: MovementClass) -> u32 {
        MOVEMENT_COST[self.index()][class.index()]
    }

    pub fn is_passable_for(self, class: MovementClass) -> bool {
        self.movement_cost(class) != INF
    }

    /// Defense stars applied to a defender standing here.
    pub fn defense_stars(self) -> u32 {
        match self {
            Self::Plain | Self::Reef => 1,
            Self::Wood => 2,
            Self::City
            | Self::Factory
            | Self::Airport
            | Self::Port
            | Self::MissileSilo
            | Self::EmptySilo => 3,
            Self::Mountain | Self::Headquarters => 4,
            Self::River | Self::Road | Self::Bridge | Self::Sea | Self::Shoal | Self::Pipe => 0,
        }
    }

    /// Properties that change hands through the capture action.
    pub fn is_capturable(self) -> bool {
        matches!(
            self,
            Self::City | Self::Factory | Self::Airport | Self::Port | Self::Headquarters
        )
    }

    /// Movement classes this terrain repairs and resupplies for its owner.
    pub fn repair_classes(self) -> &'static [MovementClass] {
        match self {
            Self::City | Self::Factory | Self::Headquarters => GROUND,
            Self::Airport => &[MovementClass::Air],
            Self::Port => &[MovementClass::Sea, MovementClass::Lander],
            _ => &[],
        }
    }

    pub fn repairs(self, class: MovementClass) -> bool {
        self.repair_classes().contains(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, terrain) in TerrainType::ALL.iter().enumerate() {
            assert_eq!(terrain.index(), i);
        }
    }

    #[test]
    fn test_movement_costs() {
        assert_eq!(TerrainType::Plain.movement_cost(MovementClass::Foot), 1);
        assert_eq!(TerrainType::Plain.movement_cost(MovementClass::Tires), 2);
        assert_eq!(TerrainType::Mountain.movement_cost(MovementClass::Foot), 2);
        assert_eq!(TerrainType::Mountain.movement_cost(MovementClass::Boots), 1);
        assert!(!TerrainType::Mountain.is_passable_for(MovementClass::Treads));
        assert!(!TerrainType::Sea.is_passable_for(MovementClass::Foot));
        assert!(TerrainType::Sea.is_passable_for(MovementClass::Air));
        assert!(TerrainType::Pipe.is_passable_for(MovementClass::Pipe));
        assert!(!TerrainType::Road.is_passable_for(MovementClass::Pipe));
    }

    #[test]
    fn test_capturable() {
        assert!(TerrainType::City.is_capturable());
        assert!(TerrainType::Headquarters.is_capturable());
        assert!(!TerrainType::Plain.is_capturable());
        assert!(!TerrainType::MissileSilo.is_capturable());
    }

    #[test]
    fn test_repair_classes() {
        assert!(TerrainType::City.repairs(MovementClass::Foot));
        assert!(!TerrainType::City.repairs(MovementClass::Air));
        assert!(TerrainType::Airport.repairs(MovementClass::Air));
        assert!(TerrainType::Port.repairs(MovementClass::Lander));
        assert!(!TerrainType::Plain.repairs(MovementClass::Foot));
    }

    #[test]
    fn test_defense_stars() {
        assert_eq!(TerrainType::Plain.defense_stars(), 1);
        assert_eq!(TerrainType::Mountain.defense_stars(), 4);
        assert_eq!(TerrainType::Road.defense_stars(), 0);
    }
}
