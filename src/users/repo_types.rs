use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never sent out
    pub favorite_countries: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields needed to create a user; the hash is already computed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A set of profile fields to write together. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Result of a guarded profile write.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(User),
    /// No such user.
    Missing,
    /// The stored password hash no longer matches the one the caller verified.
    Stale,
}

/// One mutation of a favorites set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteChange {
    Add(String),
    Remove(String),
}

impl FavoriteChange {
    /// Applies the change in place; returns whether the set was modified.
    pub fn apply(&self, favorites: &mut Vec<String>) -> bool {
        match self {
            FavoriteChange::Add(code) => {
                if favorites.iter().any(|c| c == code) {
                    false
                } else {
                    favorites.push(code.clone());
                    true
                }
            }
            FavoriteChange::Remove(code) => {
                let before = favorites.len();
                favorites.retain(|c| c != code);
                favorites.len() != before
            }
        }
    }
}
