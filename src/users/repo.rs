use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::repo_types::{FavoriteChange, NewUser, ProfileChanges, UpdateOutcome, User};

/// Persistence for user identity records.
///
/// Every method that modifies a record does so atomically with respect to
/// other writers on that record: `update_profile` is a single guarded write,
/// and `mutate_favorites` is a read-modify-write serialized per user.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DuplicateIdentity` when the username or email is taken.
    async fn insert(&self, new: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Writes all of `changes` or none of them. When `expected_hash` is set the
    /// write only happens if the stored hash still equals it.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
        expected_hash: Option<&str>,
    ) -> AppResult<UpdateOutcome>;

    /// Returns false when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Returns the resulting favorites, or `None` if the user does not exist.
    async fn mutate_favorites(
        &self,
        id: Uuid,
        change: FavoriteChange,
    ) -> AppResult<Option<Vec<String>>>;
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateIdentity,
        _ => AppError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, favorite_countries, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, favorite_countries, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, favorite_countries, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, favorite_countries, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
        expected_hash: Option<&str>,
    ) -> AppResult<UpdateOutcome> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username = COALESCE($2, username),
                   email = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   updated_at = now()
             WHERE id = $1
               AND ($5::text IS NULL OR password_hash = $5)
            RETURNING id, username, email, password_hash, favorite_countries, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(expected_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)?;

        if let Some(user) = updated {
            return Ok(UpdateOutcome::Updated(user));
        }

        let exists: bool = sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)"#)
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        debug!(user_id = %id, exists, "guarded profile update matched no row");
        Ok(if exists {
            UpdateOutcome::Stale
        } else {
            UpdateOutcome::Missing
        })
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn mutate_favorites(
        &self,
        id: Uuid,
        change: FavoriteChange,
    ) -> AppResult<Option<Vec<String>>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        // Row lock serializes concurrent mutations of the same user.
        let row: Option<(Vec<String>,)> = sqlx::query_as(
            r#"SELECT favorite_countries FROM users WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((mut favorites,)) = row else {
            tx.rollback().await.context("rollback tx")?;
            return Ok(None);
        };

        if change.apply(&mut favorites) {
            sqlx::query(
                r#"UPDATE users SET favorite_countries = $2, updated_at = now() WHERE id = $1"#,
            )
            .bind(id)
            .bind(favorites.as_slice())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.context("commit tx")?;
        Ok(Some(favorites))
    }
}
