//! In-memory catalog for development and tests.
//!
//! Holds raw rows behind a `parking_lot::RwLock`. Reads take the lock once,
//! copy what they need, and release it before returning, which gives each
//! batch the same single-snapshot guarantee as the Postgres transaction.
//! Source-side filtering mirrors the SQL predicates.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use sigfa_core::{Scope, Siret};

use super::rows::EXCLUDED_DELAY_STAGE;
use super::{
    admits, BatchRequest, CatalogError, EndFollow, EntityCatalog, FollowOutcome, FollowRecord,
    FollowStore, NewFollow, RawBatch, SearchQuery, SummaryRow, WatchlistRow,
};
use super::rows::{
    FinancialStatementRow, FurloughConsumptionRow, FurloughRequestRow, IdentityRow,
    LoanGuaranteeRow, PaymentBehaviourRow, PaymentDelayRow, ProcedureRow, ScoreRow,
    TaxDebtPeriodRow,
};

/// Rows held by the in-memory catalog.
///
/// `followed` flags on seeded identity and summary rows are ignored; they
/// are recomputed from `follows` for the requesting user.
#[derive(Debug, Clone, Default)]
pub struct MemoryData {
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
    /// Current listing row per establishment.
    pub summaries: Vec<SummaryRow>,
    /// Listing rows per (list, establishment).
    pub watchlist_rows: Vec<SummaryRow>,
    /// Most recent first.
    pub watchlists: Vec<WatchlistRow>,
    pub follows: Vec<FollowRecord>,
}

impl MemoryData {
    fn follows_siret(&self, username: &str, siret: &str) -> bool {
        self.follows
            .iter()
            .any(|f| f.username == username && f.siret.as_str() == siret)
    }

    fn follows_siren(&self, username: &str, siren: &str) -> bool {
        self.follows
            .iter()
            .any(|f| f.username == username && f.siret.as_str().starts_with(siren))
    }

    fn with_follow_flags(&self, mut row: SummaryRow, username: &str) -> SummaryRow {
        row.followed = self.follows_siret(username, &row.siret);
        row.followed_enterprise = self.follows_siren(username, &row.siren);
        row
    }

    fn admitted_summary(&self, row: &SummaryRow, scope: &Scope, username: &str) -> bool {
        admits(scope, &row.footprint, self.follows_siren(username, &row.siren))
    }
}

/// Shared handle to the in-memory rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    data: Arc<RwLock<MemoryData>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: MemoryData) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Mutate the rows in place, e.g. to seed a test.
    pub fn update(&self, f: impl FnOnce(&mut MemoryData)) {
        f(&mut self.data.write());
    }

    pub fn snapshot(&self) -> MemoryData {
        self.data.read().clone()
    }
}

fn normalize_needle(text: &str) -> String {
    text.trim().to_lowercase()
}

impl EntityCatalog for MemoryCatalog {
    async fn fetch_batch(&self, request: &BatchRequest<'_>) -> Result<RawBatch, CatalogError> {
        let data = self.data.read();
        let wanted_sirets: BTreeSet<&str> = request.sirets.iter().map(|s| s.as_str()).collect();
        let wanted_sirens: BTreeSet<&str> = request.sirens.iter().map(|s| s.as_str()).collect();

        let mut identities: Vec<IdentityRow> = data
            .identities
            .iter()
            .filter(|row| {
                wanted_sirets.contains(row.siret.as_str())
                    || wanted_sirens.contains(row.siren.as_str())
            })
            .filter(|row| {
                admits(
                    request.scope,
                    &row.footprint,
                    data.follows_siren(request.username, &row.siren),
                )
            })
            .cloned()
            .map(|mut row| {
                row.followed = data.follows_siret(request.username, &row.siret);
                row.followed_enterprise = data.follows_siren(request.username, &row.siren);
                row
            })
            .collect();
        identities.sort_by(|a, b| a.siret.cmp(&b.siret));

        let sirets: BTreeSet<String> = identities.iter().map(|r| r.siret.clone()).collect();
        let sirens: BTreeSet<String> = identities.iter().map(|r| r.siren.clone()).collect();

        let mut financial_statements: Vec<_> = data
            .financial_statements
            .iter()
            .filter(|r| sirens.contains(&r.siren))
            .cloned()
            .collect();
        financial_statements.sort_by(|a, b| (&a.siren, a.fiscal_year).cmp(&(&b.siren, b.fiscal_year)));

        let mut payment_behaviour: Vec<_> = data
            .payment_behaviour
            .iter()
            .filter(|r| sirens.contains(&r.siren))
            .cloned()
            .collect();
        payment_behaviour.sort_by(|a, b| (&a.siren, a.value_date).cmp(&(&b.siren, b.value_date)));

        let mut scores: Vec<_> = data
            .scores
            .iter()
            .filter(|r| sirets.contains(&r.siret))
            .cloned()
            .collect();
        scores.sort_by(|a, b| {
            a.siret
                .cmp(&b.siret)
                .then_with(|| b.batch.cmp(&a.batch))
                .then_with(|| b.score.total_cmp(&a.score))
        });

        let mut furlough_requests: Vec<_> = data
            .furlough_requests
            .iter()
            .filter(|r| sirets.contains(&r.siret))
            .cloned()
            .collect();
        furlough_requests.sort_by(|a, b| (&a.siret, a.period_start).cmp(&(&b.siret, b.period_start)));

        let mut furlough_consumptions: Vec<_> = data
            .furlough_consumptions
            .iter()
            .filter(|r| sirets.contains(&r.siret))
            .cloned()
            .collect();
        furlough_consumptions.sort_by(|a, b| (&a.siret, a.period).cmp(&(&b.siret, b.period)));

        let mut tax_debt_periods: Vec<_> = data
            .tax_debt_periods
            .iter()
            .filter(|r| sirets.contains(&r.siret))
            .cloned()
            .collect();
        tax_debt_periods.sort_by(|a, b| (&a.siret, a.period).cmp(&(&b.siret, b.period)));

        let mut payment_delays: Vec<_> = data
            .payment_delays
            .iter()
            .filter(|r| sirets.contains(&r.siret))
            .filter(|r| r.stage.as_deref() != Some(EXCLUDED_DELAY_STAGE))
            .cloned()
            .collect();
        payment_delays.sort_by(|a, b| (&a.siret, a.created).cmp(&(&b.siret, b.created)));

        let mut procedures: Vec<_> = data
            .procedures
            .iter()
            .filter(|r| sirens.contains(&r.siren))
            .cloned()
            .collect();
        procedures.sort_by(|a, b| (&a.siren, a.effective_date).cmp(&(&b.siren, b.effective_date)));

        let loan_guarantees: Vec<_> = data
            .loan_guarantees
            .iter()
            .filter(|r| sirets.contains(&r.siret))
            .cloned()
            .collect();

        Ok(RawBatch {
            identities,
            financial_statements,
            payment_behaviour,
            scores,
            furlough_requests,
            furlough_consumptions,
            tax_debt_periods,
            payment_delays,
            procedures,
            loan_guarantees,
        })
    }

    async fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<SummaryRow>, CatalogError> {
        let data = self.data.read();
        let needle = normalize_needle(query.text);
        let mut rows: Vec<SummaryRow> = data
            .summaries
            .iter()
            .filter(|row| {
                row.siret.starts_with(&needle)
                    || row
                        .name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .filter(|row| data.admitted_summary(row, query.scope, query.username))
            .map(|row| data.with_follow_flags(row.clone(), query.username))
            .collect();
        rows.sort_by(|a, b| (&a.name, &a.siret).cmp(&(&b.name, &b.siret)));
        Ok(rows)
    }

    async fn watchlist(
        &self,
        list_id: &str,
        scope: &Scope,
        username: &str,
    ) -> Result<Vec<SummaryRow>, CatalogError> {
        let data = self.data.read();
        let mut rows: Vec<SummaryRow> = data
            .watchlist_rows
            .iter()
            .filter(|row| row.list_id.as_deref() == Some(list_id))
            .filter(|row| {
                matches!(
                    row.score_alert.as_deref(),
                    Some("Alerte seuil F1") | Some("Alerte seuil F2")
                )
            })
            .filter(|row| data.admitted_summary(row, scope, username))
            .map(|row| data.with_follow_flags(row.clone(), username))
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&a.score.unwrap_or(f64::NEG_INFINITY))
        });
        Ok(rows)
    }

    async fn followed(&self, username: &str) -> Result<Vec<SummaryRow>, CatalogError> {
        let data = self.data.read();
        let mut rows: Vec<SummaryRow> = data
            .summaries
            .iter()
            .filter(|row| data.follows_siret(username, &row.siret))
            .map(|row| data.with_follow_flags(row.clone(), username))
            .collect();
        rows.sort_by(|a, b| (&a.name, &a.siret).cmp(&(&b.name, &b.siret)));
        Ok(rows)
    }

    async fn summaries(
        &self,
        sirets: &[Siret],
        scope: &Scope,
        username: &str,
    ) -> Result<Vec<SummaryRow>, CatalogError> {
        let data = self.data.read();
        let wanted: BTreeSet<&str> = sirets.iter().map(|s| s.as_str()).collect();
        Ok(data
            .summaries
            .iter()
            .filter(|row| wanted.contains(row.siret.as_str()))
            .filter(|row| data.admitted_summary(row, scope, username))
            .map(|row| data.with_follow_flags(row.clone(), username))
            .collect())
    }

    async fn watchlists(&self) -> Result<Vec<WatchlistRow>, CatalogError> {
        Ok(self.data.read().watchlists.clone())
    }
}

impl FollowStore for MemoryCatalog {
    async fn follow(
        &self,
        username: &str,
        siret: &Siret,
        request: &NewFollow,
    ) -> Result<FollowOutcome, CatalogError> {
        let mut data = self.data.write();
        if data.follows_siret(username, siret.as_str()) {
            return Ok(FollowOutcome::AlreadyFollowed);
        }
        let record = FollowRecord {
            siret: siret.clone(),
            username: username.to_string(),
            category: request.category.clone(),
            comment: request.comment.clone(),
            since: Utc::now(),
        };
        data.follows.push(record.clone());
        Ok(FollowOutcome::Created(record))
    }

    async fn unfollow(
        &self,
        username: &str,
        siret: &Siret,
        request: &EndFollow,
    ) -> Result<bool, CatalogError> {
        let mut data = self.data.write();
        let before = data.follows.len();
        data.follows
            .retain(|f| !(f.username == username && &f.siret == siret));
        let ended = data.follows.len() != before;
        if ended {
            tracing::debug!(
                siret = %siret,
                category = %request.category,
                "follow ended"
            );
        }
        Ok(ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(siret: &str, footprint: &[&str]) -> IdentityRow {
        IdentityRow {
            siret: siret.to_string(),
            siren: siret[..9].to_string(),
            footprint: footprint.iter().map(|s| s.to_string()).collect(),
            ..IdentityRow::default()
        }
    }

    fn seeded() -> MemoryCatalog {
        MemoryCatalog::with_data(MemoryData {
            identities: vec![
                identity("11111111100011", &["01"]),
                identity("22222222200022", &["05"]),
            ],
            payment_delays: vec![
                PaymentDelayRow {
                    siret: "11111111100011".into(),
                    stage: Some(EXCLUDED_DELAY_STAGE.into()),
                    ..PaymentDelayRow::default()
                },
                PaymentDelayRow {
                    siret: "11111111100011".into(),
                    stage: Some("APPROUVE".into()),
                    ..PaymentDelayRow::default()
                },
            ],
            ..MemoryData::default()
        })
    }

    fn siret(s: &str) -> Siret {
        Siret::new(s).unwrap()
    }

    #[tokio::test]
    async fn batch_is_prefiltered_by_scope() {
        let catalog = seeded();
        let scope = Scope::from_tags(["01"]);
        let targets = [siret("11111111100011"), siret("22222222200022")];
        let batch = catalog
            .fetch_batch(&BatchRequest {
                sirets: &targets,
                sirens: &[],
                scope: &scope,
                username: "alice",
            })
            .await
            .unwrap();
        assert_eq!(batch.identities.len(), 1);
        assert_eq!(batch.identities[0].siret, "11111111100011");
        assert_eq!(batch.payment_delays.len(), 1, "PRO PR plans are excluded");
    }

    #[tokio::test]
    async fn follow_admits_out_of_scope_rows() {
        let catalog = seeded();
        let target = siret("22222222200022");
        let outcome = catalog
            .follow(
                "alice",
                &target,
                &NewFollow {
                    category: "suivi".into(),
                    comment: None,
                },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, FollowOutcome::Created(_)));

        let scope = Scope::from_tags(["01"]);
        let batch = catalog
            .fetch_batch(&BatchRequest {
                sirets: std::slice::from_ref(&target),
                sirens: &[],
                scope: &scope,
                username: "alice",
            })
            .await
            .unwrap();
        assert_eq!(batch.identities.len(), 1);
        assert!(batch.identities[0].followed);
    }

    #[tokio::test]
    async fn follow_twice_then_unfollow() {
        let catalog = seeded();
        let target = siret("11111111100011");
        let req = NewFollow {
            category: "suivi".into(),
            comment: Some("watch".into()),
        };
        catalog.follow("bob", &target, &req).await.unwrap();
        assert_eq!(
            catalog.follow("bob", &target, &req).await.unwrap(),
            FollowOutcome::AlreadyFollowed
        );
        let end = EndFollow {
            category: "closed".into(),
            comment: None,
        };
        assert!(catalog.unfollow("bob", &target, &end).await.unwrap());
        assert!(!catalog.unfollow("bob", &target, &end).await.unwrap());
    }
}
