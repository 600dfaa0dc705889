//! Error types for rule checks and configuration parsing.
//!
//! Every rejected action maps to exactly one `GameError` variant so the
//! calling layer can surface a precise message. A returned error always
//! means the board was left untouched.

use thiserror::Error;
use uuid::Uuid;

use super::board::Faction;

/// Rejection reasons for player actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Coordinate ({x}, {y}) is outside the board")]
    OutOfRange { x: i32, y: i32 },

    #[error("No {what} at ({x}, {y})")]
    NotFound {
        what: &'static str,
        x: usize,
        y: usize,
    },

    #[error("No unit with id {0}")]
    UnitNotFound(Uuid),

    #[error("It is {current}'s turn, not {faction}'s")]
    IllegalTurn { faction: Faction, current: Faction },

    #[error("Unit has already used its {0} this turn")]
    ActionExhausted(&'static str),

    #[error("Target ({x}, {y}) cannot be reached")]
    UnreachableTarget { x: usize, y: usize },

    #[error("Invalid attack: {0}")]
    InvalidCombat(&'static str),

    #[error("Not enough funds: unit costs {cost}, treasury holds {funds}")]
    InsufficientFunds { cost: u32, funds: u32 },

    #[error("Transport is full")]
    CapacityExceeded,

    #[error("Incompatible cargo: {0}")]
    IncompatibleCargo(&'static str),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Game is over")]
    GameOver,
}

impl GameError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidAction(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised while parsing injected configuration or catalog text.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Catalog is missing a definition for {0}")]
    MissingUnit(String),

    #[error("Invalid catalog entry for {unit}: {reason}")]
    InvalidUnit { unit: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: &'static str },
}
