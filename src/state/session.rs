//! Session registry.
//!
//! Tracks which client sessions are watching which game so the transport
//! layer knows where to broadcast board updates. Game rules never read it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::board::Faction;

/// One session's membership in a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Transport session ID
    pub session_id: String,

    /// Token of the game being watched
    pub game_token: String,

    /// Faction the session plays, or `None` for a spectator
    pub faction: Option<Faction>,

    /// When the session joined
    pub joined_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(session_id: String, game_token: String, faction: Option<Faction>) -> Self {
        Self {
            session_id,
            game_token,
            faction,
            joined_at: Utc::now(),
        }
    }

    pub fn is_spectator(&self) -> bool {
        self.faction.is_none()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "session_id": self.session_id,
            "game_token": self.game_token,
            "army": self.faction.map(|f| f.as_str()),
            "joined_at": self.joined_at.to_rfc3339()
        })
    }
}

/// Session membership across all games.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Subscriptions by session ID
    sessions: HashMap<String, Subscription>,

    /// Game token to subscribed session IDs
    games: HashMap<String, HashSet<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a session to a game. A session watches one game at a time,
    /// so any previous subscription is replaced and returned.
    pub fn join(
        &mut self,
        session_id: &str,
        game_token: &str,
        faction: Option<Faction>,
    ) -> Option<Subscription> {
        let previous = self.leave(session_id);

        self.games
            .entry(game_token.to_string())
            .or_default()
            .insert(session_id.to_string());
        self.sessions.insert(
            session_id.to_string(),
            Subscription::new(session_id.to_string(), game_token.to_string(), faction),
        );

        previous
    }

    /// Drop a session's subscription.
    pub fn leave(&mut self, session_id: &str) -> Option<Subscription> {
        let sub = self.sessions.remove(session_id)?;
        if let Some(members) = self.games.get_mut(&sub.game_token) {
            members.remove(session_id);
            if members.is_empty() {
                self.games.remove(&sub.game_token);
            }
        }
        Some(sub)
    }

    /// Remove every session watching a game. Returns their IDs.
    pub fn close_game(&mut self, game_token: &str) -> Vec<String> {
        let Some(members) = self.games.remove(game_token) else {
            return Vec::new();
        };
        let mut removed: Vec<String> = members.into_iter().collect();
        removed.sort();
        for sid in &removed {
            self.sessions.remove(sid);
        }
        removed
    }

    pub fn get(&self, session_id: &str) -> Option<&Subscription> {
        self.sessions.get(session_id)
    }

    /// Game the session is watching.
    pub fn game_of(&self, session_id: &str) -> Option<&str> {
        self.sessions.get(session_id).map(|s| s.game_token.as_str())
    }

    /// Sessions subscribed to a game, sorted for stable broadcast order.
    pub fn subscribers(&self, game_token: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .games
            .get(game_token)
            .map(|members| members.iter().map(String::as_str).collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Sessions playing `faction` in a game.
    pub fn players_of(&self, game_token: &str, faction: Faction) -> Vec<&str> {
        self.subscribers(game_token)
            .into_iter()
            .filter(|sid| self.sessions.get(*sid).is_some_and(|s| s.faction == Some(faction)))
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}
