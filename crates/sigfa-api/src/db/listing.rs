//! Listing queries: search, watchlists, follow lists and exports.
//!
//! These read the precomputed `establishment_summary` and
//! `watchlist_summary` views. One row per establishment (per list for
//! watchlists); the follow flags are computed for the requesting user.

use sigfa_core::{Scope, Siret};
use sqlx::PgPool;

use super::{classify, geo_binding};
use crate::catalog::{CatalogError, SearchQuery, SummaryRow, WatchlistRow};

/// Column list shared by every listing query, over alias `s`. `$user` is
/// the placeholder bound to the username.
macro_rules! summary_columns {
    ($user:literal) => {
        concat!(
            "s.siret, s.siren, s.name, s.commune, s.department, s.department_label,
             s.activity_code, s.activity_label, s.sector_code, s.sector_label,
             s.headcount, s.enterprise_headcount, s.administrative_state, s.head_office,
             s.procedure, s.footprint, s.alert_history,
             EXISTS (SELECT 1 FROM establishment_follow f
                     WHERE f.siret = s.siret AND f.username = ",
            $user,
            " AND f.active) AS followed,
             EXISTS (SELECT 1 FROM establishment_follow f
                     WHERE f.siren = s.siren AND f.username = ",
            $user,
            " AND f.active) AS followed_enterprise,
             s.list_id, s.score, s.score_diff, s.score_alert, s.first_alert,
             s.debt_increase, s.debt_amount, s.has_payment_plan,
             s.furlough_active, s.furlough_avg_hours, s.furlough_avg_amount,
             s.revenue, s.revenue_variation, s.operating_result, s.ebitda,
             s.fiscal_year, s.closing_date, s.loan_guarantee"
        )
    };
}

/// Scope predicate over alias `s`.
macro_rules! in_scope {
    ($geo:literal, $user:literal) => {
        concat!(
            "(",
            $geo,
            "::text[] IS NULL OR s.footprint && ",
            $geo,
            "::text[] OR EXISTS (SELECT 1 FROM establishment_follow f
                 WHERE f.siren = s.siren AND f.username = ",
            $user,
            " AND f.active))"
        )
    };
}

const SEARCH: &str = concat!(
    "SELECT ",
    summary_columns!("$3"),
    " FROM establishment_summary s
     WHERE (s.siret LIKE $1 || '%' OR s.name ILIKE '%' || $1 || '%')
       AND ",
    in_scope!("$2", "$3"),
    " ORDER BY s.name, s.siret"
);

const WATCHLIST: &str = concat!(
    "SELECT ",
    summary_columns!("$3"),
    " FROM watchlist_summary s
     WHERE s.list_id = $1
       AND s.score_alert IN ('Alerte seuil F1', 'Alerte seuil F2')
       AND ",
    in_scope!("$2", "$3"),
    " ORDER BY s.score DESC"
);

const FOLLOWED: &str = concat!(
    "SELECT ",
    summary_columns!("$1"),
    " FROM establishment_summary s
     JOIN establishment_follow fo ON fo.siret = s.siret AND fo.username = $1 AND fo.active
     ORDER BY s.name, s.siret"
);

const SUMMARIES: &str = concat!(
    "SELECT ",
    summary_columns!("$3"),
    " FROM establishment_summary s
     WHERE s.siret = ANY($1)
       AND ",
    in_scope!("$2", "$3")
);

const WATCHLISTS: &str =
    "SELECT id, batch, algorithm, description FROM watchlist ORDER BY batch DESC, id DESC";

/// Escape `LIKE` wildcards so the free text matches literally.
fn like_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(super) async fn search(
    pool: &PgPool,
    query: &SearchQuery<'_>,
) -> Result<Vec<SummaryRow>, CatalogError> {
    sqlx::query_as::<_, SummaryRow>(SEARCH)
        .bind(like_literal(query.text))
        .bind(geo_binding(query.scope))
        .bind(query.username)
        .fetch_all(pool)
        .await
        .map_err(classify("search"))
}

pub(super) async fn watchlist(
    pool: &PgPool,
    list_id: &str,
    scope: &Scope,
    username: &str,
) -> Result<Vec<SummaryRow>, CatalogError> {
    sqlx::query_as::<_, SummaryRow>(WATCHLIST)
        .bind(list_id)
        .bind(geo_binding(scope))
        .bind(username)
        .fetch_all(pool)
        .await
        .map_err(classify("watchlist"))
}

pub(super) async fn followed(
    pool: &PgPool,
    username: &str,
) -> Result<Vec<SummaryRow>, CatalogError> {
    sqlx::query_as::<_, SummaryRow>(FOLLOWED)
        .bind(username)
        .fetch_all(pool)
        .await
        .map_err(classify("followed"))
}

pub(super) async fn summaries(
    pool: &PgPool,
    sirets: &[Siret],
    scope: &Scope,
    username: &str,
) -> Result<Vec<SummaryRow>, CatalogError> {
    let ids: Vec<String> = sirets.iter().map(|s| s.as_str().to_string()).collect();
    sqlx::query_as::<_, SummaryRow>(SUMMARIES)
        .bind(ids)
        .bind(geo_binding(scope))
        .bind(username)
        .fetch_all(pool)
        .await
        .map_err(classify("summaries"))
}

pub(super) async fn watchlists(pool: &PgPool) -> Result<Vec<WatchlistRow>, CatalogError> {
    sqlx::query_as::<_, WatchlistRow>(WATCHLISTS)
        .fetch_all(pool)
        .await
        .map_err(classify("watchlists"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_literal(" 50%_off\\ "), "50\\%\\_off\\\\");
        assert_eq!(like_literal("Boulangerie"), "Boulangerie");
    }

    #[test]
    fn scoped_listings_bind_user_for_follow_flags() {
        for sql in [SEARCH, WATCHLIST, SUMMARIES] {
            assert!(sql.contains("f.username = $3"));
            assert!(sql.contains("$2::text[] IS NULL"));
        }
        assert!(FOLLOWED.contains("f.username = $1"));
    }
}
