//! Rule constants.
//!
//! The engine never reads files; the outer layer hands over TOML text and the
//! parsed `GameConfig` is injected into the board and game manager.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Funds credited per owned property at each qualifying turn change.
pub const DEFAULT_INCOME_PER_PROPERTY: u32 = 1000;

/// Capture points a property starts with.
pub const DEFAULT_CAPTURE_POINTS: i32 = 20;

/// HP restored per turn on a friendly repair tile.
pub const DEFAULT_REPAIR_HP: u32 = 20;

/// Missile hit and the HP it never pushes a unit below.
pub const DEFAULT_MISSILE_DAMAGE: u32 = 30;
pub const DEFAULT_MISSILE_FLOOR: u32 = 10;

/// Width of the random damage jitter, drawn from `0..span`.
pub const DEFAULT_JITTER_SPAN: u32 = 10;

/// Tunable rule constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub income_per_property: u32,
    pub capture_points: i32,
    pub repair_hp: u32,
    pub missile_damage: u32,
    pub missile_floor: u32,
    pub jitter_span: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            income_per_property: DEFAULT_INCOME_PER_PROPERTY,
            capture_points: DEFAULT_CAPTURE_POINTS,
            repair_hp: DEFAULT_REPAIR_HP,
            missile_damage: DEFAULT_MISSILE_DAMAGE,
            missile_floor: DEFAULT_MISSILE_FLOOR,
            jitter_span: DEFAULT_JITTER_SPAN,
        }
    }
}

impl GameConfig {
    /// Parse a flat TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        if config.capture_points <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "capture_points",
                reason: "must be positive",
            });
        }
        Ok(config)
    }
}
