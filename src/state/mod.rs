//! Game state and rules for a grid war game.
//!
//! This module provides the core types and managers:
//!
//! - `catalog` - Unit definitions and the base damage table
//! - `terrain` - Terrain movement costs, defense and repair tables
//! - `board` - Factions, units, tiles and the board aggregate
//! - `pathfinding` - Movement-cost search for move and load checks
//! - `combat` - Damage model and jitter sources
//! - `turn` - Turn order and start-of-turn upkeep
//! - `manager` - Validates and applies player actions
//! - `session` - Which client sessions watch which game
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                            AppState                               │
//! │                                                                   │
//! │  ┌─────────────────────┐            ┌─────────────────────┐       │
//! │  │  SessionRegistry    │            │  games              │       │
//! │  │                     │            │                     │       │
//! │  │  session → game     │            │  token →            │       │
//! │  │  game → sessions    │            │    GameManager      │       │
//! │  └─────────────────────┘            └──────────┬──────────┘       │
//! │                                                │                  │
//! │  ┌─────────────────────────────────────────────▼───────────────┐  │
//! │  │  GameManager (one per game)                                 │  │
//! │  │                                                             │  │
//! │  │  Action ──▶ validate ──▶ pathfinding / combat ──▶ Board     │  │
//! │  │                                                             │  │
//! │  │  end_turn ──▶ turn upkeep ──▶ Board                         │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use gridwar_state::state::{Board, GameConfig, GameManager, Map, UnitCatalog};
//!
//! let config = GameConfig::default();
//! let board = Board::create(&map, &config)?;
//! let mut game = GameManager::new(board, UnitCatalog::standard(), config);
//!
//! game.create_unit("RED", "INFANTRY", 9, 12)?;
//! game.move_unit(9, 12, 9, 10)?;
//! game.end_turn()?;
//! ```

pub mod board;
pub mod catalog;
pub mod combat;
pub mod config;
pub mod error;
pub mod manager;
pub mod pathfinding;
pub mod session;
pub mod terrain;
pub mod turn;

use std::collections::HashMap;

// Re-export commonly used types
pub use board::{ArmyLedger, Board, Faction, Map, MapTile, Position, Tile, Unit, UnitStatus};
pub use catalog::{CombatClass, MovementClass, SupplyRole, UnitCatalog, UnitType, UnitTypeDefinition, MAX_HP};
pub use combat::{Exchange, FixedJitter, JitterSource, SequenceJitter};
pub use config::GameConfig;
pub use error::{ConfigError, GameError, Result};
pub use manager::{Action, AttackOutcome, GameManager, MISSILE_BLAST};
pub use session::{SessionRegistry, Subscription};
pub use terrain::{TerrainType, INF};
pub use turn::TurnReport;

/// Combined application state.
///
/// An optional convenience struct for a service hosting several games.
/// The managers can also be used directly.
#[derive(Debug, Default)]
pub struct AppState {
    pub sessions: SessionRegistry,
    games: HashMap<String, GameManager>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start hosting a game under `token`, replacing any game already there.
    pub fn open_game(
        &mut self,
        token: &str,
        map: &Map,
        catalog: UnitCatalog,
        config: GameConfig,
    ) -> Result<&mut GameManager> {
        let board = Board::create(map, &config)?;
        let game = GameManager::new(board, catalog, config);
        self.games.insert(token.to_string(), game);
        self.games
            .get_mut(token)
            .ok_or_else(|| GameError::invalid("game vanished after insert"))
    }

    pub fn game(&self, token: &str) -> Option<&GameManager> {
        self.games.get(token)
    }

    pub fn game_mut(&mut self, token: &str) -> Option<&mut GameManager> {
        self.games.get_mut(token)
    }

    /// Apply an action to a hosted game.
    pub fn apply(&mut self, token: &str, action: Action) -> Result<serde_json::Value> {
        let game = self
            .games
            .get_mut(token)
            .ok_or_else(|| GameError::invalid(format!("no game with token '{}'", token)))?;
        game.apply(action)
    }

    /// Stop hosting a game and drop its subscribers.
    pub fn close_game(&mut self, token: &str) -> Option<(Board, Vec<String>)> {
        let game = self.games.remove(token)?;
        let sessions = self.sessions.close_game(token);
        Some((game.into_board(), sessions))
    }

    /// Tokens of finished games.
    pub fn finished_games(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .games
            .iter()
            .filter(|(_, g)| !g.board().game_active)
            .map(|(token, _)| token.clone())
            .collect();
        tokens.sort();
        tokens
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> Map {
        Map::filled(6, 6, TerrainType::Plain, vec![Faction::Red, Faction::Blue])
            .with_tile(0, 0, MapTile::new(TerrainType::Factory).owned_by(Faction::Red))
    }

    #[test]
    fn test_app_state_basic() {
        let mut state = AppState::new();
        state
            .open_game("g1", &small_map(), UnitCatalog::standard(), GameConfig::default())
            .unwrap();
        state.sessions.join("s1", "g1", Some(Faction::Red));

        let created = state
            .apply(
                "g1",
                Action::Create {
                    army: "RED".into(),
                    unit_type: "INFANTRY".into(),
                    x: 1,
                    y: 1,
                },
            )
            .unwrap();
        assert_eq!(created["army"], "RED");
        assert_eq!(state.game("g1").unwrap().board().funds(Faction::Red), 0);

        assert!(state.apply("nope", Action::EndTurn).is_err());
        assert!(state.finished_games().is_empty());

        let (board, sessions) = state.close_game("g1").unwrap();
        assert_eq!(board.all_units().len(), 1);
        assert_eq!(sessions, vec!["s1".to_string()]);
        assert_eq!(state.game_count(), 0);
    }
}
