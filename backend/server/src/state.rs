use std::sync::Arc;

use tracing::info;

use super::{
    config::{Config, StoreBackend},
    database::{RedisStore, init_redis},
    error::ServerError,
    memory::MemoryStore,
    repository::EntryRepository,
    store::EntryStore,
};

pub struct AppState {
    pub config: Config,
    pub repository: EntryRepository,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, ServerError> {
        let store: Arc<dyn EntryStore> = match config.store_backend {
            StoreBackend::Redis => Arc::new(RedisStore::new(init_redis(&config.redis_url).await?)),
            StoreBackend::Memory => {
                info!("Using in-memory entry store, data will not persist");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn EntryStore>) -> Arc<Self> {
        let repository = EntryRepository::new(store, config.request_timeout);

        Arc::new(Self { config, repository })
    }
}
