//! Paginated free-text search.
//!
//! Elevated principals may widen the search past their jurisdiction or
//! their mandates. The widened scope goes through the same policy: ignoring
//! mandates still needs an alert or a follow to disclose anything. `in_zone`
//! stays framed by the principal's own departments.

use sigfa_core::{Elevation, Scope};

use super::{evaluate_summary, paginate, summaries, Page, PageOutcome, RowFilter};
use crate::auth::Principal;
use crate::catalog::{EntityCatalog, SearchQuery};
use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub text: String,
    pub page: usize,
    pub filter: RowFilter,
    pub ignore_jurisdiction: bool,
    pub ignore_mandate: bool,
}

/// The scope a request runs under, after any requested elevation.
///
/// Each elevation used is recorded on the audit target.
pub(crate) fn effective_scope(
    principal: &Principal,
    requested: &[Elevation],
    operation: &'static str,
) -> Result<Scope, AppError> {
    let mut scope = principal.scope.clone();
    for &elevation in requested {
        scope = scope.elevated(elevation).ok_or_else(|| {
            AppError::Forbidden(format!("capability {elevation} is not granted"))
        })?;
        tracing::info!(
            target: "sigfa::audit",
            principal = %principal.username,
            capability = %elevation,
            operation,
            "elevated scope used"
        );
    }
    Ok(scope)
}

pub async fn search<C: EntityCatalog>(
    catalog: &C,
    config: &AppConfig,
    principal: &Principal,
    params: &SearchParams,
) -> Result<PageOutcome<Page>, AppError> {
    let text = params.text.trim();
    if text.chars().count() < config.search_min_length {
        return Err(AppError::Validation(format!(
            "search term must be at least {} characters",
            config.search_min_length
        )));
    }

    let mut requested = Vec::new();
    if params.ignore_jurisdiction {
        requested.push(Elevation::IgnoreJurisdiction);
    }
    if params.ignore_mandate {
        requested.push(Elevation::IgnoreMandate);
    }
    let scope = effective_scope(principal, &requested, "search")?;

    let rows = catalog
        .search(&SearchQuery {
            text,
            scope: &scope,
            username: &principal.username,
        })
        .await?;

    let visible: Vec<_> = summaries(rows)?
        .into_iter()
        .map(|mut row| {
            evaluate_summary(&mut row, &scope, &principal.scope);
            row
        })
        .filter(|row| row.permissions.visible && params.filter.matches(row))
        .collect();

    tracing::debug!(
        principal = %principal.username,
        matches = visible.len(),
        page = params.page,
        "search evaluated"
    );
    Ok(paginate(visible, params.page, config.page_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, MemoryData, SummaryRow};
    use sigfa_core::ProcedureState;

    fn row(siret: &str, name: &str, dept: &str, alert: &str) -> SummaryRow {
        SummaryRow {
            siret: siret.into(),
            siren: siret[..9].into(),
            name: Some(name.into()),
            department: Some(dept.into()),
            footprint: vec![dept.into()],
            alert_history: Some(true),
            list_id: Some("L1".into()),
            score: Some(0.7),
            score_alert: Some(alert.into()),
            ..SummaryRow::default()
        }
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::with_data(MemoryData {
            summaries: vec![
                row("11111111100011", "Boulangerie Martin", "01", "Alerte seuil F1"),
                row("22222222200022", "Boulangerie Durand", "02", "Alerte seuil F2"),
                row("33333333300033", "Garage Petit", "01", "Pas d'alerte"),
            ],
            ..MemoryData::default()
        })
    }

    fn params(text: &str) -> SearchParams {
        SearchParams {
            text: text.into(),
            ..SearchParams::default()
        }
    }

    fn principal(tags: &[&str]) -> Principal {
        Principal::new("alice", Scope::from_tags(tags.iter().copied()))
    }

    #[tokio::test]
    async fn short_term_rejected_before_query() {
        let err = search(&catalog(), &AppConfig::default(), &principal(&["01"]), &params("bo"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn out_of_scope_rows_never_counted() {
        let outcome = search(
            &catalog(),
            &AppConfig::default(),
            &principal(&["01", "score"]),
            &params("boulangerie"),
        )
        .await
        .unwrap();
        let PageOutcome::Page(page) = outcome else {
            panic!("expected a page");
        };
        assert_eq!(page.total, 1);
        assert_eq!(page.nb_f1, 1);
        assert_eq!(page.nb_f2, 0);
        assert!(page.results[0].score.is_some());
    }

    #[tokio::test]
    async fn override_without_capability_is_forbidden() {
        let p = SearchParams {
            ignore_jurisdiction: true,
            ..params("boulangerie")
        };
        let err = search(&catalog(), &AppConfig::default(), &principal(&["01"]), &p)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn ignore_jurisdiction_widens_visibility_not_zone() {
        let p = SearchParams {
            ignore_jurisdiction: true,
            ..params("boulangerie")
        };
        let outcome = search(
            &catalog(),
            &AppConfig::default(),
            &principal(&["01", "score", "override:jurisdiction"]),
            &p,
        )
        .await
        .unwrap();
        let PageOutcome::Page(page) = outcome else {
            panic!("expected a page");
        };
        assert_eq!(page.total, 2);
        assert_eq!((page.nb_f1, page.nb_f2), (1, 1));
        let durand = page
            .results
            .iter()
            .find(|r| r.siret.as_str() == "22222222200022")
            .unwrap();
        assert!(!durand.permissions.in_zone);
    }

    #[tokio::test]
    async fn procedure_filter() {
        let catalog = catalog();
        catalog.update(|data| {
            data.summaries.push(SummaryRow {
                procedure: Some("liquidation".into()),
                ..row("44444444400044", "Boulangerie Roux", "01", "Alerte seuil F2")
            })
        });
        let p = SearchParams {
            filter: RowFilter {
                procedures: vec![ProcedureState::Liquidation],
                ..RowFilter::default()
            },
            ..params("boulangerie")
        };
        let outcome = search(&catalog, &AppConfig::default(), &principal(&["01"]), &p)
            .await
            .unwrap();
        let PageOutcome::Page(page) = outcome else {
            panic!("expected a page");
        };
        assert_eq!(page.total, 1);
        assert_eq!(page.results[0].siret.as_str(), "44444444400044");
        assert_eq!(page.results[0].procedure, ProcedureState::Liquidation);
    }

    #[tokio::test]
    async fn page_past_end_is_empty() {
        let p = SearchParams {
            page: 5,
            ..params("boulangerie")
        };
        let outcome = search(&catalog(), &AppConfig::default(), &principal(&["01"]), &p)
            .await
            .unwrap();
        assert!(matches!(outcome, PageOutcome::Empty));
    }
}
