use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::users::dto::{CountryCode, ProfileUpdate};
use crate::users::repo::UserStore;
use crate::users::repo_types::{FavoriteChange, ProfileChanges, UpdateOutcome, User};

/// Attempts for a password change racing another password change.
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Profile and favorites operations for an authenticated user.
pub struct ProfileService {
    store: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// All requested fields are written in one guarded store call, so either
    /// every change lands or none does.
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let ProfileUpdate {
            username,
            email,
            password,
        } = update;

        let Some(password) = password else {
            if username.is_none() && email.is_none() {
                return self.get_profile(user_id).await;
            }
            let changes = ProfileChanges {
                username,
                email,
                password_hash: None,
            };
            return match self.store.update_profile(user_id, changes, None).await? {
                UpdateOutcome::Updated(user) => {
                    info!(user_id = %user.id, "profile updated");
                    Ok(user)
                }
                UpdateOutcome::Missing | UpdateOutcome::Stale => Err(AppError::NotFound),
            };
        };

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let current = self.get_profile(user_id).await?;
            if !verify_password(&password.current, &current.password_hash)? {
                warn!(user_id = %user_id, "profile update with wrong current password");
                return Err(AppError::InvalidCredentials);
            }

            let changes = ProfileChanges {
                username: username.clone(),
                email: email.clone(),
                password_hash: Some(hash_password(&password.new)?),
            };
            match self
                .store
                .update_profile(user_id, changes, Some(&current.password_hash))
                .await?
            {
                UpdateOutcome::Updated(user) => {
                    info!(user_id = %user.id, "profile updated with new password");
                    return Ok(user);
                }
                UpdateOutcome::Missing => return Err(AppError::NotFound),
                UpdateOutcome::Stale => {
                    debug!(user_id = %user_id, attempt, "password changed concurrently; retrying");
                }
            }
        }

        Err(anyhow::anyhow!("profile update lost {MAX_UPDATE_ATTEMPTS} races").into())
    }

    pub async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        if !self.store.delete(user_id).await? {
            return Err(AppError::NotFound);
        }
        info!(user_id = %user_id, "account deleted");
        Ok(())
    }

    pub async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        Ok(self.get_profile(user_id).await?.favorite_countries)
    }

    /// No-op when the code is already a favorite.
    pub async fn add_favorite(&self, user_id: Uuid, code: CountryCode) -> AppResult<Vec<String>> {
        self.mutate(user_id, FavoriteChange::Add(code.into_inner()))
            .await
    }

    /// No-op when the code is not a favorite.
    pub async fn remove_favorite(
        &self,
        user_id: Uuid,
        code: CountryCode,
    ) -> AppResult<Vec<String>> {
        self.mutate(user_id, FavoriteChange::Remove(code.into_inner()))
            .await
    }

    async fn mutate(&self, user_id: Uuid, change: FavoriteChange) -> AppResult<Vec<String>> {
        debug!(user_id = %user_id, change = ?change, "favorites mutation");
        self.store
            .mutate_favorites(user_id, change)
            .await?
            .ok_or(AppError::NotFound)
    }
}
