//! # View Builders
//!
//! The read paths. Each one fetches from the catalog, assembles, evaluates
//! the disclosure policy once per (principal, entity), and redacts:
//!
//! - [`entity`]: single establishment or enterprise;
//! - [`search`]: free-text paginated search with alert-tier counts;
//! - [`watchlist`]: scored detection lists;
//! - [`follow`]: follow list and follow toggling;
//! - [`export`]: follow list merged with externally owned cases.
//!
//! Invisible entities never reach a listing: they are dropped before
//! counting and pagination.

pub mod entity;
pub mod export;
pub mod follow;
pub mod search;
pub mod watchlist;

use serde::Serialize;
use sigfa_core::{
    evaluate, AdministrativeState, AlertLevel, DepartmentCode, DisclosureSubject, Redact, Scope,
    Summary,
};
use utoipa::ToSchema;

use crate::assemble;
use crate::catalog::{CatalogError, SummaryRow};

/// Outcome of a paginated read. An offset past the end is not an error.
#[derive(Debug)]
pub enum PageOutcome<T> {
    Page(T),
    Empty,
}

/// One page of listing rows with alert-tier counts over the whole result.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page {
    /// 1-based index of the first row of the page.
    pub from: usize,
    /// 1-based index of the last row of the page.
    pub to: usize,
    pub total: usize,
    pub page: usize,
    pub page_max: usize,
    /// Rows at tier 1 whose score is disclosed.
    pub nb_f1: usize,
    /// Rows at tier 2 whose score is disclosed.
    pub nb_f2: usize,
    pub results: Vec<Summary>,
}

/// Cut one page out of visible, evaluated rows and redact it.
pub(crate) fn paginate(rows: Vec<Summary>, page: usize, limit: usize) -> PageOutcome<Page> {
    let limit = limit.max(1);
    let total = rows.len();
    let start = limit.saturating_mul(page);
    if start >= total {
        return PageOutcome::Empty;
    }
    let (nb_f1, nb_f2) = rows.iter().fold((0, 0), |(f1, f2), row| {
        match row.disclosed_alert() {
            Some(AlertLevel::Tier1) => (f1 + 1, f2),
            Some(AlertLevel::Tier2) => (f1, f2 + 1),
            _ => (f1, f2),
        }
    });
    let results: Vec<Summary> = rows
        .into_iter()
        .skip(start)
        .take(limit)
        .map(Redact::redacted)
        .collect();
    PageOutcome::Page(Page {
        from: start + 1,
        to: start + results.len(),
        total,
        page,
        page_max: (total - 1) / limit,
        nb_f1,
        nb_f2,
        results,
    })
}

/// Evaluate one listing row against `scope`.
///
/// `zone_scope` frames `in_zone`; it differs from `scope` only when an
/// elevated search widened the geographic scope.
pub(crate) fn evaluate_summary(summary: &mut Summary, scope: &Scope, zone_scope: &Scope) {
    let subject = DisclosureSubject {
        footprint: &summary.footprint,
        department: summary.department.as_ref(),
        alert: summary.alert,
        followed: summary.followed_enterprise,
    };
    let mut permissions = evaluate(scope, &subject);
    permissions.in_zone = summary
        .department
        .as_ref()
        .is_some_and(|dept| zone_scope.geo().contains(dept));
    summary.permissions = permissions;
}

pub(crate) fn summaries(rows: Vec<SummaryRow>) -> Result<Vec<Summary>, CatalogError> {
    rows.into_iter().map(assemble::summary).collect()
}

/// Row filters shared by search and watchlists. Empty lists mean "any".
///
/// Bounds on a sensitive indicator only match rows where that category is
/// disclosed, so rows must be evaluated before they are filtered.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub departments: Vec<DepartmentCode>,
    pub sectors: Vec<String>,
    pub procedures: Vec<sigfa_core::ProcedureState>,
    pub headcount_min: Option<f64>,
    pub headcount_max: Option<f64>,
    pub enterprise_headcount_min: Option<f64>,
    pub enterprise_headcount_max: Option<f64>,
    pub revenue_min: Option<f64>,
    pub revenue_max: Option<f64>,
    /// First appearance on a detection list.
    pub first_alert: Option<bool>,
    /// Prefix of the siret or substring of the name, case-insensitive.
    pub text: Option<String>,
    pub head_office_only: bool,
    pub exclude_followed: bool,
    pub administrative_state: Option<AdministrativeState>,
}

impl RowFilter {
    pub fn matches(&self, row: &Summary) -> bool {
        if !self.departments.is_empty()
            && !row
                .department
                .as_ref()
                .is_some_and(|d| self.departments.contains(d))
        {
            return false;
        }
        if !self.sectors.is_empty()
            && !row
                .sector_code
                .as_ref()
                .is_some_and(|s| self.sectors.contains(s))
        {
            return false;
        }
        if !self.procedures.is_empty() && !self.procedures.contains(&row.procedure) {
            return false;
        }
        if !within(row.headcount, self.headcount_min, self.headcount_max) {
            return false;
        }
        if !within(
            row.enterprise_headcount,
            self.enterprise_headcount_min,
            self.enterprise_headcount_max,
        ) {
            return false;
        }
        let revenue = row
            .financial
            .as_ref()
            .filter(|_| row.permissions.categories.financial)
            .and_then(|f| f.revenue);
        if !within(revenue, self.revenue_min, self.revenue_max) {
            return false;
        }
        if let Some(wanted) = self.first_alert {
            let disclosed = row
                .score
                .as_ref()
                .filter(|_| row.permissions.categories.score);
            if disclosed.map_or(true, |s| s.first_alert != wanted) {
                return false;
            }
        }
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let by_siret = row.siret.as_str().starts_with(&needle);
            let by_name = row
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !by_siret && !by_name {
                return false;
            }
        }
        if self.head_office_only && !row.head_office {
            return false;
        }
        if self.exclude_followed && row.followed_enterprise {
            return false;
        }
        if let Some(state) = self.administrative_state {
            if row.administrative_state != Some(state) {
                return false;
            }
        }
        true
    }
}

/// Unbounded sides always pass; a bounded side needs a value.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    value.is_some_and(|v| min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m))
}


#[cfg(test)]
mod tests {
    use super::testing::row;
    use super::*;
    use sigfa_core::FinancialIndicators;

    fn evaluated(rows: Vec<Summary>, scope: &Scope) -> Vec<Summary> {
        rows.into_iter()
            .map(|mut r| {
                evaluate_summary(&mut r, scope, scope);
                r
            })
            .collect()
    }

    #[test]
    fn page_bounds() {
        let scope = Scope::from_tags(["01", "score"]);
        let rows = evaluated(
            (0..5)
                .map(|i| row(&format!("1111111110001{i}"), "01", Some(AlertLevel::Tier1)))
                .collect(),
            &scope,
        );
        let PageOutcome::Page(page) = paginate(rows.clone(), 1, 2) else {
            panic!("expected a page");
        };
        assert_eq!((page.from, page.to, page.total, page.page_max), (3, 4, 5, 2));
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.nb_f1, 5);

        assert!(matches!(paginate(rows.clone(), 3, 2), PageOutcome::Empty));
        let PageOutcome::Page(last) = paginate(rows, 2, 2) else {
            panic!("expected a page");
        };
        assert_eq!((last.from, last.to), (5, 5));
    }

    #[test]
    fn tier_counts_ignore_withheld_scores() {
        let scope = Scope::from_tags(["01"]);
        let rows = evaluated(vec![row("11111111100011", "01", Some(AlertLevel::Tier2))], &scope);
        let PageOutcome::Page(page) = paginate(rows, 0, 20) else {
            panic!("expected a page");
        };
        assert_eq!((page.nb_f1, page.nb_f2), (0, 0));
        assert!(page.results[0].score.is_none(), "redacted on the way out");
    }

    #[test]
    fn in_zone_framed_by_zone_scope() {
        let base = Scope::from_tags(["02"]);
        let wide = Scope::from_tags(["France entière"]);
        let mut r = row("11111111100011", "01", None);
        evaluate_summary(&mut r, &wide, &base);
        assert!(r.permissions.visible);
        assert!(!r.permissions.in_zone);
    }

    #[test]
    fn filter_matches() {
        let r = row("11111111100011", "01", None);
        assert!(RowFilter::default().matches(&r));
        let by_dept = RowFilter {
            departments: vec![DepartmentCode::new("02").unwrap()],
            ..RowFilter::default()
        };
        assert!(!by_dept.matches(&r));
        let by_text = RowFilter {
            text: Some("company".into()),
            ..RowFilter::default()
        };
        assert!(by_text.matches(&r));
        let by_prefix = RowFilter {
            text: Some("111111".into()),
            headcount_min: Some(10.0),
            headcount_max: Some(20.0),
            ..RowFilter::default()
        };
        assert!(by_prefix.matches(&r));
        let closed = RowFilter {
            administrative_state: Some(AdministrativeState::Closed),
            ..RowFilter::default()
        };
        assert!(!closed.matches(&r));
    }

    #[test]
    fn sensitive_bounds_need_disclosure() {
        let mut r = row("11111111100011", "01", Some(AlertLevel::Tier1));
        r.enterprise_headcount = Some(250.0);
        r.financial = Some(FinancialIndicators {
            revenue: Some(2_000_000.0),
            revenue_variation: None,
            operating_result: None,
            ebitda: None,
            fiscal_year: Some(2023),
            closing_date: None,
        });
        let filter = RowFilter {
            enterprise_headcount_min: Some(200.0),
            revenue_min: Some(1_000_000.0),
            revenue_max: Some(5_000_000.0),
            first_alert: Some(false),
            ..RowFilter::default()
        };

        evaluate_summary(&mut r, &Scope::from_tags(["01"]), &Scope::from_tags(["01"]));
        assert!(!filter.matches(&r), "withheld revenue never matches");

        let scope = Scope::from_tags(["01", "bdf", "score"]);
        evaluate_summary(&mut r, &scope, &scope);
        assert!(filter.matches(&r));

        let small = RowFilter {
            enterprise_headcount_max: Some(100.0),
            ..RowFilter::default()
        };
        assert!(!small.matches(&r));
        let first = RowFilter {
            first_alert: Some(true),
            ..RowFilter::default()
        };
        assert!(!first.matches(&r));
    }
}
