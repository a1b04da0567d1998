use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, StoreBackend};
use crate::store::{MemoryStore, PgStore, TodoStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;
                let store = Arc::new(PgStore::connect(url, config.max_connections).await?);
                store.migrate().await;
                info!("using postgres store");
                Ok(Self::from_parts(store.clone(), store, config))
            }
            StoreBackend::Memory => {
                warn!("using in-memory store; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::from_parts(store.clone(), store, config))
            }
        }
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            users,
            todos,
            keys,
            config,
        }
    }

    /// State backed by an empty in-memory store.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            store_backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                algorithm: jsonwebtoken::Algorithm::HS256,
                ttl_minutes: 20,
            },
        });
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(store.clone(), store, config)
    }
}
