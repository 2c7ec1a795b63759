//! # Application State
//!
//! Cloned into every handler by axum. Holds the selected catalog backend and
//! the runtime configuration; the pool is kept separately for the readiness
//! probe.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::{Catalog, MemoryCatalog};
use crate::config::AppConfig;
use crate::db::PgCatalog;

#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Arc<AppConfig>,
    /// Present when the catalog is backed by Postgres.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: AppConfig) -> Self {
        Self {
            catalog: Catalog::Postgres(PgCatalog::new(pool.clone())),
            config: Arc::new(config),
            db_pool: Some(pool),
        }
    }

    pub fn in_memory(catalog: MemoryCatalog, config: AppConfig) -> Self {
        Self {
            catalog: Catalog::Memory(catalog),
            config: Arc::new(config),
            db_pool: None,
        }
    }
}
