use crate::auth::AuthService;
use crate::config::{AppConfig, StoreBackend};
use crate::users::{MemoryUserStore, PgUserStore, ProfileService, UserStore};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub profiles: Arc<ProfileService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let pg = PgUserStore::connect(url, config.max_connections).await?;
                pg.migrate().await?;
                Arc::new(pg) as Arc<dyn UserStore>
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory user store; data is lost on restart");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Self::from_parts(Arc::new(config), store)
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let auth = Arc::new(AuthService::new(store.clone(), &config.jwt)?);
        let profiles = Arc::new(ProfileService::new(store));
        Ok(Self {
            config,
            auth,
            profiles,
        })
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(secret: &str) -> anyhow::Result<Self> {
        Self::from_parts(
            Arc::new(AppConfig::in_memory(secret)),
            Arc::new(MemoryUserStore::new()),
        )
    }
}
