//! # Entity Catalog
//!
//! The read seam between the views and the relational store. Two traits:
//!
//! - [`EntityCatalog`]: the batch fetch used to assemble full records, and
//!   the listing queries used by search, watchlists, follow lists and
//!   exports;
//! - [`FollowStore`]: the only writes, toggling follow relations.
//!
//! [`Catalog`] selects the backend at startup: Postgres when a database is
//! configured, an in-memory store otherwise.
//!
//! ## Batch protocol
//!
//! [`EntityCatalog::fetch_batch`] runs the [`BatchQuery`] sequence as one
//! unit against a consistent snapshot and returns a [`RawBatch`] with one
//! typed field per query. Any failing query fails the batch; no partial
//! batch is ever returned. Every query is pre-filtered at the source: a row
//! is only returned when the principal's geographic scope intersects the
//! enterprise footprint, or the principal follows the enterprise.

pub mod memory;
pub mod rows;

use std::future::Future;

use sigfa_core::{Scope, Siren, Siret};
use thiserror::Error;

use crate::db::PgCatalog;
pub use memory::{MemoryCatalog, MemoryData};
pub use rows::{
    FinancialStatementRow, FollowRecord, FurloughConsumptionRow, FurloughRequestRow, IdentityRow,
    LoanGuaranteeRow, PaymentBehaviourRow, PaymentDelayRow, ProcedureRow, ScoreRow, SummaryRow,
    TaxDebtPeriodRow, WatchlistRow,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A query failed. Retryable from the caller's point of view.
    #[error("{query} query failed: {source}")]
    Query {
        query: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// No connection could be obtained.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A row came back in a shape the assembler cannot use.
    #[error("cannot decode {query} row: {reason}")]
    Decode { query: &'static str, reason: String },
}

impl CatalogError {
    pub fn query(query: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Query { query, source }
    }

    pub fn decode(query: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            query,
            reason: reason.to_string(),
        }
    }
}

/// The queries of one batch, in the order they run and are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchQuery {
    Identity,
    FinancialStatements,
    PaymentBehaviour,
    Scores,
    FurloughRequests,
    FurloughConsumptions,
    TaxDebtPeriods,
    PaymentDelays,
    Procedures,
    LoanGuarantees,
}

impl BatchQuery {
    pub const ALL: [BatchQuery; 10] = [
        BatchQuery::Identity,
        BatchQuery::FinancialStatements,
        BatchQuery::PaymentBehaviour,
        BatchQuery::Scores,
        BatchQuery::FurloughRequests,
        BatchQuery::FurloughConsumptions,
        BatchQuery::TaxDebtPeriods,
        BatchQuery::PaymentDelays,
        BatchQuery::Procedures,
        BatchQuery::LoanGuarantees,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::FinancialStatements => "financial_statements",
            Self::PaymentBehaviour => "payment_behaviour",
            Self::Scores => "scores",
            Self::FurloughRequests => "furlough_requests",
            Self::FurloughConsumptions => "furlough_consumptions",
            Self::TaxDebtPeriods => "tax_debt_periods",
            Self::PaymentDelays => "payment_delays",
            Self::Procedures => "procedures",
            Self::LoanGuarantees => "loan_guarantees",
        }
    }
}

/// Targets of one batch fetch.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    pub sirets: &'a [Siret],
    pub sirens: &'a [Siren],
    pub scope: &'a Scope,
    pub username: &'a str,
}

/// Result sets of one batch, one field per [`BatchQuery`], declaration order.
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    pub identities: Vec<IdentityRow>,
    pub financial_statements: Vec<FinancialStatementRow>,
    pub payment_behaviour: Vec<PaymentBehaviourRow>,
    pub scores: Vec<ScoreRow>,
    pub furlough_requests: Vec<FurloughRequestRow>,
    pub furlough_consumptions: Vec<FurloughConsumptionRow>,
    pub tax_debt_periods: Vec<TaxDebtPeriodRow>,
    pub payment_delays: Vec<PaymentDelayRow>,
    pub procedures: Vec<ProcedureRow>,
    pub loan_guarantees: Vec<LoanGuaranteeRow>,
}

/// Free-text search at the source.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    /// Prefix of the siret, or substring of the name.
    pub text: &'a str,
    pub scope: &'a Scope,
    pub username: &'a str,
}

/// A follow request after validation.
#[derive(Debug, Clone)]
pub struct NewFollow {
    pub category: String,
    pub comment: Option<String>,
}

/// An unfollow request after validation.
#[derive(Debug, Clone)]
pub struct EndFollow {
    pub category: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FollowOutcome {
    Created(FollowRecord),
    AlreadyFollowed,
}

pub trait EntityCatalog: Send + Sync {
    /// Run the batch for the requested ids as one atomic, read-only unit.
    fn fetch_batch(
        &self,
        request: &BatchRequest<'_>,
    ) -> impl Future<Output = Result<RawBatch, CatalogError>> + Send;

    /// Listing rows matching a free-text search, ordered by name then siret.
    fn search(
        &self,
        query: &SearchQuery<'_>,
    ) -> impl Future<Output = Result<Vec<SummaryRow>, CatalogError>> + Send;

    /// Rows of one detection list carrying an alert, score descending.
    fn watchlist(
        &self,
        list_id: &str,
        scope: &Scope,
        username: &str,
    ) -> impl Future<Output = Result<Vec<SummaryRow>, CatalogError>> + Send;

    /// Every establishment the user follows, whatever their jurisdiction.
    fn followed(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<SummaryRow>, CatalogError>> + Send;

    /// Listing rows for explicit sirets, pre-filtered by scope.
    fn summaries(
        &self,
        sirets: &[Siret],
        scope: &Scope,
        username: &str,
    ) -> impl Future<Output = Result<Vec<SummaryRow>, CatalogError>> + Send;

    /// Detection lists, most recent first.
    fn watchlists(&self) -> impl Future<Output = Result<Vec<WatchlistRow>, CatalogError>> + Send;
}

pub trait FollowStore: Send + Sync {
    fn follow(
        &self,
        username: &str,
        siret: &Siret,
        request: &NewFollow,
    ) -> impl Future<Output = Result<FollowOutcome, CatalogError>> + Send;

    /// End an active follow. Returns `false` when there was none.
    fn unfollow(
        &self,
        username: &str,
        siret: &Siret,
        request: &EndFollow,
    ) -> impl Future<Output = Result<bool, CatalogError>> + Send;
}

/// Backend selected at startup.
#[derive(Debug, Clone)]
pub enum Catalog {
    Postgres(PgCatalog),
    Memory(MemoryCatalog),
}

impl EntityCatalog for Catalog {
    async fn fetch_batch(&self, request: &BatchRequest<'_>) -> Result<RawBatch, CatalogError> {
        match self {
            Self::Postgres(c) => c.fetch_batch(request).await,
            Self::Memory(c) => c.fetch_batch(request).await,
        }
    }

    async fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<SummaryRow>, CatalogError> {
        match self {
            Self::Postgres(c) => c.search(query).await,
            Self::Memory(c) => c.search(query).await,
        }
    }

    async fn watchlist(
        &self,
        list_id: &str,
        scope: &Scope,
        username: &str,
    ) -> Result<Vec<SummaryRow>, CatalogError> {
        match self {
            Self::Postgres(c) => c.watchlist(list_id, scope, username).await,
            Self::Memory(c) => c.watchlist(list_id, scope, username).await,
        }
    }

    async fn followed(&self, username: &str) -> Result<Vec<SummaryRow>, CatalogError> {
        match self {
            Self::Postgres(c) => c.followed(username).await,
            Self::Memory(c) => c.followed(username).await,
        }
    }

    async fn summaries(
        &self,
        sirets: &[Siret],
        scope: &Scope,
        username: &str,
    ) -> Result<Vec<SummaryRow>, CatalogError> {
        match self {
            Self::Postgres(c) => c.summaries(sirets, scope, username).await,
            Self::Memory(c) => c.summaries(sirets, scope, username).await,
        }
    }

    async fn watchlists(&self) -> Result<Vec<WatchlistRow>, CatalogError> {
        match self {
            Self::Postgres(c) => c.watchlists().await,
            Self::Memory(c) => c.watchlists().await,
        }
    }
}

impl FollowStore for Catalog {
    async fn follow(
        &self,
        username: &str,
        siret: &Siret,
        request: &NewFollow,
    ) -> Result<FollowOutcome, CatalogError> {
        match self {
            Self::Postgres(c) => c.follow(username, siret, request).await,
            Self::Memory(c) => c.follow(username, siret, request).await,
        }
    }

    async fn unfollow(
        &self,
        username: &str,
        siret: &Siret,
        request: &EndFollow,
    ) -> Result<bool, CatalogError> {
        match self {
            Self::Postgres(c) => c.unfollow(username, siret, request).await,
            Self::Memory(c) => c.unfollow(username, siret, request).await,
        }
    }
}

/// Source-side scope predicate shared by the in-memory backend: the
/// geographic scope intersects the footprint, or the enterprise is followed.
pub(crate) fn admits(scope: &Scope, footprint: &[String], followed: bool) -> bool {
    if followed {
        return true;
    }
    match scope.geo().departments() {
        None => true,
        Some(departments) => footprint
            .iter()
            .any(|code| departments.iter().any(|d| d.as_str() == code)),
    }
}
