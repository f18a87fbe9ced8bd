use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{FavoriteChange, NewUser, ProfileChanges, UpdateOutcome, User};

/// Process-local store. Writers take the lock for the whole
/// read-modify-write, which gives the same per-record atomicity as a row lock.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn identity_taken(
    users: &HashMap<Uuid, User>,
    except: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> bool {
    users.values().any(|u| {
        Some(u.id) != except
            && (username.is_some_and(|n| n == u.username) || email.is_some_and(|e| e == u.email))
    })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if identity_taken(&users, None, Some(&new.username), Some(&new.email)) {
            return Err(AppError::DuplicateIdentity);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            favorite_countries: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
        expected_hash: Option<&str>,
    ) -> AppResult<UpdateOutcome> {
        let mut users = self.users.write().await;
        let Some(current) = users.get(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if expected_hash.is_some_and(|h| h != current.password_hash) {
            return Ok(UpdateOutcome::Stale);
        }
        if identity_taken(
            &users,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        ) {
            return Err(AppError::DuplicateIdentity);
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(UpdateOutcome::Updated(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn mutate_favorites(
        &self,
        id: Uuid,
        change: FavoriteChange,
    ) -> AppResult<Option<Vec<String>>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if change.apply(&mut user.favorite_countries) {
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(Some(user.favorite_countries.clone()))
    }
}
