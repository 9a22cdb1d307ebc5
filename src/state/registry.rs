use indexmap::IndexMap;
use thiserror::Error;

use crate::{dao::models::PlayerEntity, state::policy::Role};

/// A registered user and their running score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Unique login name.
    pub username: String,
    /// Plain credential compared on login.
    pub password: String,
    /// Role controlling access to privileged actions.
    pub role: Role,
    /// Signed running score.
    pub score: i64,
}

/// Partial update applied to an existing player.
#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    /// Replacement credential.
    pub password: Option<String>,
    /// Replacement role.
    pub role: Option<Role>,
}

/// Failures raised by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A user with this name is already registered.
    #[error("user `{0}` already exists")]
    AlreadyExists(String),
    /// No user with this name is registered.
    #[error("user `{0}` not found")]
    NotFound(String),
    /// The delta would take the score outside the representable range.
    #[error("score of `{0}` would overflow")]
    ScoreOverflow(String),
}

/// Username-keyed registry preserving registration order.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: IndexMap<String, Player>,
}

impl PlayerRegistry {
    /// Check credentials by plain equality.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Player> {
        self.players
            .get(username)
            .filter(|player| player.password == password)
    }

    /// Look up a player by name.
    pub fn get(&self, username: &str) -> Option<&Player> {
        self.players.get(username)
    }

    /// Whether a player with this name exists.
    pub fn contains(&self, username: &str) -> bool {
        self.players.contains_key(username)
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no user is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterate over players in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Register a new player, refusing duplicates without touching the registry.
    pub fn add(&mut self, player: Player) -> Result<&Player, RegistryError> {
        if self.players.contains_key(&player.username) {
            return Err(RegistryError::AlreadyExists(player.username));
        }
        let username = player.username.clone();
        self.players.insert(username.clone(), player);
        Ok(&self.players[&username])
    }

    /// Apply a partial update to an existing player.
    pub fn update(&mut self, username: &str, update: PlayerUpdate) -> Result<&Player, RegistryError> {
        let player = self
            .players
            .get_mut(username)
            .ok_or_else(|| RegistryError::NotFound(username.to_string()))?;
        if let Some(password) = update.password {
            player.password = password;
        }
        if let Some(role) = update.role {
            player.role = role;
        }
        Ok(player)
    }

    /// Remove a player, keeping the order of the remaining ones.
    pub fn remove(&mut self, username: &str) -> Result<Player, RegistryError> {
        self.players
            .shift_remove(username)
            .ok_or_else(|| RegistryError::NotFound(username.to_string()))
    }

    /// Score the player would have after `delta`, without applying it.
    pub fn score_after(&self, username: &str, delta: i64) -> Result<i64, RegistryError> {
        let player = self
            .players
            .get(username)
            .ok_or_else(|| RegistryError::NotFound(username.to_string()))?;
        player
            .score
            .checked_add(delta)
            .ok_or_else(|| RegistryError::ScoreOverflow(username.to_string()))
    }

    /// Add `delta` to the player's score and return the new total. The
    /// registry is left unchanged when the player is unknown or the sum overflows.
    pub fn apply_delta(&mut self, username: &str, delta: i64) -> Result<i64, RegistryError> {
        let score = self.score_after(username, delta)?;
        if let Some(player) = self.players.get_mut(username) {
            player.score = score;
        }
        Ok(score)
    }

    /// Snapshot the registry as persisted records.
    pub fn to_entities(&self) -> Vec<PlayerEntity> {
        self.players.values().cloned().map(Into::into).collect()
    }
}

impl FromIterator<Player> for PlayerRegistry {
    fn from_iter<T: IntoIterator<Item = Player>>(iter: T) -> Self {
        let mut players = IndexMap::new();
        for player in iter {
            // Later duplicates in a hand-edited document lose to the first entry.
            players.entry(player.username.clone()).or_insert(player);
        }
        Self { players }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            username: value.username,
            password: value.password,
            role: value.role,
            score: value.score,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            username: value.username,
            password: value.password,
            role: value.role,
            score: value.score,
        }
    }
}
