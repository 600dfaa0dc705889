//! GridWar State Library
//!
//! This crate provides the rules engine for a turn-based grid war game.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Unit Catalog** - Static unit definitions and the base damage table,
//!   built in or parsed from injected TOML.
//!
//! - **Board** - Terrain grid, units, property ownership, treasuries and the
//!   turn order.
//!
//! - **Pathfinding** - Movement-cost search used for move, join and load checks
//!   and for selection highlights.
//!
//! - **Combat** - Integer damage model with an injectable jitter source.
//!
//! - **Game Manager** - One call per player action, each validated before it
//!   mutates anything.
//!
//! - **Session Registry** - Which client sessions watch which game.
//!
//! # Design Principles
//!
//! 1. **Actions are atomic** - A rejected action returns a `GameError` and leaves
//!    the board untouched.
//!
//! 2. **Capabilities are data** - Unit behavior comes from catalog tables, not from
//!    scattered type checks.
//!
//! 3. **No I/O** - Config, catalog and map data arrive already loaded.
//!
//! 4. **Serialization-ready** - The board round-trips through JSON for storage and
//!    every type renders a client view.
//!
//! # Example
//!
//! ```rust
//! use gridwar_state::state::{
//!     Board, Faction, FixedJitter, GameConfig, GameManager, Map, MapTile, TerrainType,
//!     UnitCatalog,
//! };
//!
//! let map = Map::filled(20, 15, TerrainType::Plain, vec![Faction::Red, Faction::Blue])
//!     .with_tile(0, 0, MapTile::new(TerrainType::Headquarters).owned_by(Faction::Red))
//!     .with_tile(19, 14, MapTile::new(TerrainType::Headquarters).owned_by(Faction::Blue));
//! let config = GameConfig::default();
//! let board = Board::create(&map, &config).unwrap();
//! let mut game = GameManager::with_jitter(board, UnitCatalog::standard(), config, FixedJitter(0));
//!
//! let infantry = game.create_unit("RED", "INFANTRY", 9, 12).unwrap();
//! assert!(infantry.can_move);
//!
//! game.move_unit(9, 12, 9, 10).unwrap();
//! let report = game.end_turn().unwrap();
//! assert_eq!(report.current, Faction::Blue);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
