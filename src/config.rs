use anyhow::{bail, Context};
use serde::Deserialize;

use crate::salaries::grid::DEFAULT_PAGE_SIZE;

pub const DEFAULT_EMPLOYEES_COLLECTION: &str = "nabila_employees";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub employees_collection: String,
    pub salary_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").filter(|v| !v.is_empty());
        let store = match var("STORE_BACKEND").as_deref() {
            Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("unknown STORE_BACKEND `{other}` (expected postgres or memory)"),
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };
        if store == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required for the postgres store");
        }

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse::<u32>().context("DB_MAX_CONNECTIONS")?,
            None => 10,
        };
        let salary_page_size = var("SALARY_GRID_PAGE_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self {
            store,
            database_url,
            max_connections,
            employees_collection: var("EMPLOYEES_COLLECTION")
                .unwrap_or_else(|| DEFAULT_EMPLOYEES_COLLECTION.into()),
            salary_page_size,
        })
    }
}
