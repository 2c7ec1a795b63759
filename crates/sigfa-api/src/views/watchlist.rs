//! Scored watchlists.
//!
//! Only rows carrying a tier 1 or tier 2 alert on the selected list are
//! eligible, whatever the filters. Rows whose score is disclosed come first,
//! highest score first. Rows with a withheld score follow in siret order, so
//! their position says nothing about the score.

use serde::Serialize;
use utoipa::ToSchema;

use super::{evaluate_summary, paginate, summaries, Page, PageOutcome, RowFilter};
use crate::auth::Principal;
use crate::catalog::{EntityCatalog, WatchlistRow};
use crate::config::AppConfig;
use crate::error::AppError;

/// Which detection list to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSelector {
    /// The most recent list.
    Current,
    Named(String),
}

#[derive(Debug, Clone, Default)]
pub struct WatchlistParams {
    pub filter: RowFilter,
    pub page: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScoredPage {
    pub list: WatchlistRow,
    #[serde(flatten)]
    pub page: Page,
}

pub async fn catalogue<C: EntityCatalog>(catalog: &C) -> Result<Vec<WatchlistRow>, AppError> {
    Ok(catalog.watchlists().await?)
}

pub async fn scores<C: EntityCatalog>(
    catalog: &C,
    config: &AppConfig,
    principal: &Principal,
    selector: &ListSelector,
    params: &WatchlistParams,
) -> Result<PageOutcome<ScoredPage>, AppError> {
    let lists = catalog.watchlists().await?;
    let list = match selector {
        ListSelector::Current => match lists.into_iter().next() {
            Some(list) => list,
            None => return Ok(PageOutcome::Empty),
        },
        ListSelector::Named(id) => lists
            .into_iter()
            .find(|l| &l.id == id)
            .ok_or_else(|| AppError::NotFound(format!("watchlist {id}")))?,
    };

    let rows = catalog
        .watchlist(&list.id, &principal.scope, &principal.username)
        .await?;

    let mut visible: Vec<_> = summaries(rows)?
        .into_iter()
        .filter(|row| row.score.as_ref().is_some_and(|s| s.alert.is_alert()))
        .map(|mut row| {
            evaluate_summary(&mut row, &principal.scope, &principal.scope);
            row
        })
        .filter(|row| row.permissions.visible && params.filter.matches(row))
        .collect();
    visible.sort_by(|a, b| {
        let a_shown = a.permissions.categories.score;
        let b_shown = b.permissions.categories.score;
        b_shown.cmp(&a_shown).then_with(|| {
            if a_shown && b_shown {
                b.raw_score().total_cmp(&a.raw_score())
            } else {
                a.siret.cmp(&b.siret)
            }
        })
    });

    tracing::debug!(list = %list.id, rows = visible.len(), "watchlist evaluated");
    Ok(match paginate(visible, params.page, config.page_size) {
        PageOutcome::Page(page) => PageOutcome::Page(ScoredPage { list, page }),
        PageOutcome::Empty => PageOutcome::Empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FollowRecord, MemoryCatalog, MemoryData, SummaryRow};
    use sigfa_core::{Scope, Siret};

    fn row(siret: &str, dept: &str, score: f64, alert: &str, headcount: f64) -> SummaryRow {
        SummaryRow {
            siret: siret.into(),
            siren: siret[..9].into(),
            name: Some(format!("Entreprise {siret}")),
            department: Some(dept.into()),
            footprint: vec![dept.into()],
            headcount: Some(headcount),
            alert_history: Some(true),
            list_id: Some("2409".into()),
            score: Some(score),
            score_alert: Some(alert.into()),
            ..SummaryRow::default()
        }
    }

    fn list(id: &str) -> WatchlistRow {
        WatchlistRow {
            id: id.into(),
            batch: id.into(),
            algorithm: "algo_avec_urssaf".into(),
            description: None,
        }
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::with_data(MemoryData {
            watchlist_rows: vec![
                row("11111111100011", "01", 0.4, "Alerte seuil F2", 50.0),
                row("22222222200022", "01", 0.9, "Alerte seuil F1", 8.0),
                row("33333333300033", "01", 0.2, "Pas d'alerte", 50.0),
                row("44444444400044", "05", 0.95, "Alerte seuil F1", 50.0),
            ],
            watchlists: vec![list("2409"), list("2406")],
            ..MemoryData::default()
        })
    }

    fn principal() -> Principal {
        Principal::new("alice", Scope::from_tags(["01", "score"]))
    }

    #[tokio::test]
    async fn current_list_ordered_by_score() {
        let outcome = scores(
            &catalog(),
            &AppConfig::default(),
            &principal(),
            &ListSelector::Current,
            &WatchlistParams::default(),
        )
        .await
        .unwrap();
        let PageOutcome::Page(scored) = outcome else {
            panic!("expected a page");
        };
        assert_eq!(scored.list.id, "2409");
        let sirets: Vec<_> = scored.page.results.iter().map(|r| r.siret.as_str()).collect();
        assert_eq!(sirets, vec!["22222222200022", "11111111100011"]);
        assert_eq!((scored.page.nb_f1, scored.page.nb_f2), (1, 1));
    }

    #[tokio::test]
    async fn withheld_scores_sort_after_disclosed_ones() {
        let catalog = catalog();
        catalog.update(|data| {
            data.watchlist_rows.push(SummaryRow {
                alert_history: Some(false),
                ..row("05555555500055", "01", 0.99, "Alerte seuil F1", 50.0)
            })
        });
        let outcome = scores(
            &catalog,
            &AppConfig::default(),
            &principal(),
            &ListSelector::Current,
            &WatchlistParams::default(),
        )
        .await
        .unwrap();
        let PageOutcome::Page(scored) = outcome else {
            panic!("expected a page");
        };
        let sirets: Vec<_> = scored.page.results.iter().map(|r| r.siret.as_str()).collect();
        assert_eq!(sirets, vec!["22222222200022", "11111111100011", "05555555500055"]);
        assert!(scored.page.results[2].score.is_none());
        assert_eq!((scored.page.nb_f1, scored.page.nb_f2), (1, 1));
    }

    #[tokio::test]
    async fn headcount_and_follow_filters() {
        let catalog = catalog();
        catalog.update(|data| {
            data.follows.push(FollowRecord {
                siret: Siret::new("11111111100011").unwrap(),
                username: "alice".into(),
                category: "suivi".into(),
                comment: None,
                since: chrono::Utc::now(),
            })
        });
        let params = WatchlistParams {
            filter: RowFilter {
                headcount_min: Some(10.0),
                exclude_followed: true,
                ..RowFilter::default()
            },
            page: 0,
        };
        let outcome = scores(
            &catalog,
            &AppConfig::default(),
            &principal(),
            &ListSelector::Current,
            &params,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, PageOutcome::Empty));
    }

    #[tokio::test]
    async fn unknown_list_is_not_found_and_no_list_is_empty() {
        let err = scores(
            &catalog(),
            &AppConfig::default(),
            &principal(),
            &ListSelector::Named("1999".into()),
            &WatchlistParams::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let outcome = scores(
            &MemoryCatalog::new(),
            &AppConfig::default(),
            &principal(),
            &ListSelector::Current,
            &WatchlistParams::default(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, PageOutcome::Empty));
    }
}
