use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::{AppConfig, StoreBackend, DEFAULT_EMPLOYEES_COLLECTION};
use crate::salaries::grid::{SalaryGrid, DEFAULT_PAGE_SIZE};
use crate::store::{MemoryStore, PgStore, RecordStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    /// Set when the store is Postgres, for running migrations.
    pub db: Option<PgPool>,
    pub salaries: Arc<RwLock<SalaryGrid>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (store, db) = match (config.store, config.database_url.as_deref()) {
            (StoreBackend::Postgres, Some(url)) => {
                let pg = PgStore::connect(url, config.max_connections).await?;
                let pool = pg.pool().clone();
                (Arc::new(pg) as Arc<dyn RecordStore>, Some(pool))
            }
            (StoreBackend::Postgres, None) => {
                anyhow::bail!("DATABASE_URL is required for the postgres store")
            }
            (StoreBackend::Memory, _) => {
                info!("using in-memory record store; data is lost on restart");
                (Arc::new(MemoryStore::new()) as Arc<dyn RecordStore>, None)
            }
        };

        Ok(Self::from_parts(config, store, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn RecordStore>,
        db: Option<PgPool>,
    ) -> Self {
        let salaries = Arc::new(RwLock::new(SalaryGrid::seeded(config.salary_page_size)));
        Self {
            config,
            store,
            db,
            salaries,
        }
    }

    /// Test state over the given store, with default configuration.
    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            employees_collection: DEFAULT_EMPLOYEES_COLLECTION.into(),
            salary_page_size: DEFAULT_PAGE_SIZE,
        });
        Self::from_parts(config, store, None)
    }

    pub fn fake() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }
}
