//! # Postgres Catalog
//!
//! The production [`EntityCatalog`] and [`FollowStore`] backend. Schema
//! ownership is external: the service reads a fixed set of views and writes
//! only to `establishment_follow`. No migrations run from here.
//!
//! Every read carries the same scope predicate: the principal's departments
//! (`NULL` for nationwide) must overlap the enterprise footprint, or the
//! principal must follow one of the enterprise's establishments.

mod batch;
mod follow;
mod listing;

use std::time::Duration;

use sigfa_core::{Scope, Siret};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::catalog::{
    BatchRequest, CatalogError, EndFollow, EntityCatalog, FollowOutcome, FollowStore, NewFollow,
    RawBatch, SearchQuery, SummaryRow, WatchlistRow,
};

/// Connect to Postgres. Fails fast when the database is unreachable.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    tracing::info!("database pool initialised");
    Ok(pool)
}

/// Geographic scope as a query parameter: `None` matches every footprint.
pub(crate) fn geo_binding(scope: &Scope) -> Option<Vec<String>> {
    scope
        .geo()
        .departments()
        .map(|set| set.iter().map(|d| d.as_str().to_string()).collect())
}

/// Pool exhaustion and connection loss are reported as unavailability.
pub(crate) fn classify(query: &'static str) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |err| match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            CatalogError::Unavailable(format!("{query}: {err}"))
        }
        other => CatalogError::query(query)(other),
    }
}

#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl EntityCatalog for PgCatalog {
    async fn fetch_batch(&self, request: &BatchRequest<'_>) -> Result<RawBatch, CatalogError> {
        batch::fetch(&self.pool, request).await
    }

    async fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<SummaryRow>, CatalogError> {
        listing::search(&self.pool, query).await
    }

    async fn watchlist(
        &self,
        list_id: &str,
        scope: &Scope,
        username: &str,
    ) -> Result<Vec<SummaryRow>, CatalogError> {
        listing::watchlist(&self.pool, list_id, scope, username).await
    }

    async fn followed(&self, username: &str) -> Result<Vec<SummaryRow>, CatalogError> {
        listing::followed(&self.pool, username).await
    }

    async fn summaries(
        &self,
        sirets: &[Siret],
        scope: &Scope,
        username: &str,
    ) -> Result<Vec<SummaryRow>, CatalogError> {
        listing::summaries(&self.pool, sirets, scope, username).await
    }

    async fn watchlists(&self) -> Result<Vec<WatchlistRow>, CatalogError> {
        listing::watchlists(&self.pool).await
    }
}

impl FollowStore for PgCatalog {
    async fn follow(
        &self,
        username: &str,
        siret: &Siret,
        request: &NewFollow,
    ) -> Result<FollowOutcome, CatalogError> {
        follow::insert(&self.pool, username, siret, request).await
    }

    async fn unfollow(
        &self,
        username: &str,
        siret: &Siret,
        request: &EndFollow,
    ) -> Result<bool, CatalogError> {
        follow::end(&self.pool, username, siret, request).await
    }
}
