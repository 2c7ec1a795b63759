//! # Watchlist Routes
//!
//! - `GET /v1/watchlists`: detection lists, most recent first.
//! - `POST /v1/watchlists/current/scores`: scored rows of the most recent list.
//! - `POST /v1/watchlists/{list_id}/scores`: scored rows of a named list.
//!
//! Scores answer 204 when there is no list at all or the page is past the
//! end, and 404 for an unknown list id.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sigfa_core::{AdministrativeState, DepartmentCode, ProcedureState};
use utoipa::ToSchema;

use super::page_index;
use crate::auth::Principal;
use crate::catalog::WatchlistRow;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;
use crate::views::watchlist::{self as view, ListSelector, ScoredPage, WatchlistParams};
use crate::views::{PageOutcome, RowFilter};

/// Watchlist filter body. Every field is optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct WatchlistRequest {
    /// Departments.
    #[schema(value_type = Vec<String>)]
    pub zone: Vec<DepartmentCode>,
    /// Collective-proceeding states.
    pub procol: Vec<ProcedureState>,
    /// Sector codes.
    pub activite: Vec<String>,
    pub effectif_min: Option<f64>,
    pub effectif_max: Option<f64>,
    /// Enterprise-wide headcount bounds.
    pub effectif_min_entreprise: Option<f64>,
    pub effectif_max_entreprise: Option<f64>,
    /// Revenue bounds. Rows whose financial data is withheld never match.
    pub ca_min: Option<f64>,
    pub ca_max: Option<f64>,
    /// Keep only first (`true`) or repeat (`false`) appearances on a list.
    pub first_alert: Option<bool>,
    /// Free text matched against the siret prefix and the legal name.
    pub filter: Option<String>,
    pub siege_uniquement: bool,
    /// Leave out enterprises the caller already follows through any site.
    pub exclure_suivi: bool,
    /// `A` (active) or `F` (closed).
    pub etat_administratif: Option<String>,
    pub page: i64,
}

impl Validate for WatchlistRequest {
    fn validate(&self) -> Result<(), String> {
        page_index(self.page)?;
        ordered("effectif", self.effectif_min, self.effectif_max)?;
        ordered(
            "effectif_entreprise",
            self.effectif_min_entreprise,
            self.effectif_max_entreprise,
        )?;
        ordered("ca", self.ca_min, self.ca_max)?;
        if let Some(state) = &self.etat_administratif {
            state
                .parse::<AdministrativeState>()
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

fn ordered(field: &str, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(format!(
            "{field} lower bound ({min}) exceeds upper bound ({max})"
        )),
        _ => Ok(()),
    }
}

impl WatchlistRequest {
    fn into_params(self) -> Result<WatchlistParams, AppError> {
        let administrative_state = self
            .etat_administratif
            .as_deref()
            .map(str::parse::<AdministrativeState>)
            .transpose()?;
        Ok(WatchlistParams {
            filter: RowFilter {
                departments: self.zone,
                sectors: self.activite,
                procedures: self.procol,
                headcount_min: self.effectif_min,
                headcount_max: self.effectif_max,
                enterprise_headcount_min: self.effectif_min_entreprise,
                enterprise_headcount_max: self.effectif_max_entreprise,
                revenue_min: self.ca_min,
                revenue_max: self.ca_max,
                first_alert: self.first_alert,
                text: self.filter,
                head_office_only: self.siege_uniquement,
                exclude_followed: self.exclure_suivi,
                administrative_state,
            },
            page: page_index(self.page).map_err(AppError::Validation)?,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/watchlists", get(list_watchlists))
        .route("/v1/watchlists/current/scores", post(current_scores))
        .route("/v1/watchlists/{list_id}/scores", post(list_scores))
}

/// GET /v1/watchlists
#[utoipa::path(
    get,
    path = "/v1/watchlists",
    responses(
        (status = 200, description = "Detection lists, most recent first", body = Vec<WatchlistRow>),
    ),
    tag = "watchlists"
)]
async fn list_watchlists(
    State(state): State<AppState>,
    _principal: Principal,
) -> Result<Json<Vec<WatchlistRow>>, AppError> {
    Ok(Json(view::catalogue(&state.catalog).await?))
}

/// POST /v1/watchlists/current/scores
#[utoipa::path(
    post,
    path = "/v1/watchlists/current/scores",
    request_body = WatchlistRequest,
    responses(
        (status = 200, description = "One page of the most recent list", body = ScoredPage),
        (status = 204, description = "No list yet, or page past the end"),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    ),
    tag = "watchlists"
)]
async fn current_scores(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<WatchlistRequest>, JsonRejection>,
) -> Result<PageOutcome<ScoredPage>, AppError> {
    let params = extract_validated_json(body)?.into_params()?;
    view::scores(
        &state.catalog,
        &state.config,
        &principal,
        &ListSelector::Current,
        &params,
    )
    .await
}

/// POST /v1/watchlists/{list_id}/scores
#[utoipa::path(
    post,
    path = "/v1/watchlists/{list_id}/scores",
    params(("list_id" = String, Path, description = "Detection list id")),
    request_body = WatchlistRequest,
    responses(
        (status = 200, description = "One page of the named list", body = ScoredPage),
        (status = 204, description = "Page past the end"),
        (status = 404, description = "Unknown list", body = ErrorBody),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    ),
    tag = "watchlists"
)]
async fn list_scores(
    State(state): State<AppState>,
    principal: Principal,
    Path(list_id): Path<String>,
    body: Result<Json<WatchlistRequest>, JsonRejection>,
) -> Result<PageOutcome<ScoredPage>, AppError> {
    let params = extract_validated_json(body)?.into_params()?;
    view::scores(
        &state.catalog,
        &state.config,
        &principal,
        &ListSelector::Named(list_id),
        &params,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_unfiltered_first_page() {
        let req: WatchlistRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_ok());
        let params = req.into_params().unwrap();
        assert_eq!(params.page, 0);
        assert!(!params.filter.exclude_followed);
    }

    #[test]
    fn full_body_maps_onto_filter() {
        let req: WatchlistRequest = serde_json::from_value(serde_json::json!({
            "zone": ["2A", "75"],
            "procol": ["redressement", "plan_continuation"],
            "activite": ["C"],
            "effectif_min": 10,
            "effectif_max": 50,
            "effectif_min_entreprise": 100,
            "ca_min": 1000000,
            "first_alert": true,
            "filter": "garage",
            "siege_uniquement": true,
            "exclure_suivi": true,
            "etat_administratif": "A",
            "page": 1
        }))
        .unwrap();
        let params = req.into_params().unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.filter.departments.len(), 2);
        assert_eq!(
            params.filter.procedures,
            vec![ProcedureState::Redressement, ProcedureState::PlanContinuation]
        );
        assert_eq!(params.filter.text.as_deref(), Some("garage"));
        assert_eq!(params.filter.enterprise_headcount_min, Some(100.0));
        assert_eq!(params.filter.revenue_min, Some(1_000_000.0));
        assert_eq!(params.filter.revenue_max, None);
        assert_eq!(params.filter.first_alert, Some(true));
        assert_eq!(
            params.filter.administrative_state,
            Some(AdministrativeState::Active)
        );
    }

    #[test]
    fn inverted_headcount_bounds_rejected() {
        let req = WatchlistRequest {
            effectif_min: Some(50.0),
            effectif_max: Some(10.0),
            ..WatchlistRequest::default()
        };
        assert!(req.validate().is_err());

        let req = WatchlistRequest {
            ca_min: Some(2e6),
            ca_max: Some(1e6),
            ..WatchlistRequest::default()
        };
        assert!(req.validate().unwrap_err().starts_with("ca "));
    }
}
