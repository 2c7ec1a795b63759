//! # Search Route
//!
//! `POST /v1/search` with a JSON filter body. Returns a page of redacted
//! listing rows with alert-tier counts, or 204 when the page is past the end.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use sigfa_core::{AdministrativeState, DepartmentCode, ProcedureState};
use utoipa::ToSchema;

use super::page_index;
use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;
use crate::views::search::{self as view, SearchParams};
use crate::views::{Page, PageOutcome, RowFilter};

/// Search request body. Field names follow the client contract.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free text matched against the siret prefix and the legal name.
    pub search: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub departements: Vec<DepartmentCode>,
    /// Sector codes.
    #[serde(default)]
    pub activites: Vec<String>,
    /// Collective-proceeding states.
    #[serde(default)]
    pub procol: Vec<ProcedureState>,
    #[serde(default)]
    pub effectif_min: Option<f64>,
    #[serde(default)]
    pub siege_uniquement: bool,
    /// `A` (active) or `F` (closed).
    #[serde(default)]
    pub etat_administratif: Option<String>,
    #[serde(default)]
    pub ignore_jurisdiction: bool,
    #[serde(default)]
    pub ignore_mandate: bool,
}

impl Validate for SearchRequest {
    fn validate(&self) -> Result<(), String> {
        page_index(self.page)?;
        if let Some(state) = &self.etat_administratif {
            state
                .parse::<AdministrativeState>()
                .map_err(|e| e.to_string())?;
        }
        if self.effectif_min.is_some_and(|m| m < 0.0) {
            return Err("effectif_min must be >= 0".to_string());
        }
        Ok(())
    }
}

impl SearchRequest {
    fn into_params(self) -> Result<SearchParams, AppError> {
        let administrative_state = self
            .etat_administratif
            .as_deref()
            .map(str::parse::<AdministrativeState>)
            .transpose()?;
        Ok(SearchParams {
            text: self.search,
            page: page_index(self.page).map_err(AppError::Validation)?,
            filter: RowFilter {
                departments: self.departements,
                sectors: self.activites,
                procedures: self.procol,
                headcount_min: self.effectif_min,
                head_office_only: self.siege_uniquement,
                administrative_state,
                ..RowFilter::default()
            },
            ignore_jurisdiction: self.ignore_jurisdiction,
            ignore_mandate: self.ignore_mandate,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/search", post(search))
}

/// POST /v1/search
#[utoipa::path(
    post,
    path = "/v1/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "One page of matches", body = Page),
        (status = 204, description = "Page past the end of the results"),
        (status = 403, description = "Override requested without the capability", body = ErrorBody),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    ),
    tag = "search"
)]
async fn search(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<PageOutcome<Page>, AppError> {
    let params = extract_validated_json(body)?.into_params()?;
    view::search(&state.catalog, &state.config, &principal, &params).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> SearchRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn minimal_body_defaults() {
        let req = request(serde_json::json!({ "search": "boulangerie" }));
        assert!(req.validate().is_ok());
        let params = req.into_params().unwrap();
        assert_eq!(params.page, 0);
        assert!(params.filter.departments.is_empty());
        assert!(!params.ignore_jurisdiction);
    }

    #[test]
    fn administrative_state_must_be_a_or_f() {
        let req = request(serde_json::json!({ "search": "abc", "etat_administratif": "X" }));
        assert!(req.validate().is_err());
        let req = request(serde_json::json!({ "search": "abc", "etat_administratif": "F" }));
        assert!(req.validate().is_ok());
        assert_eq!(
            req.into_params().unwrap().filter.administrative_state,
            Some(AdministrativeState::Closed)
        );
    }

    #[test]
    fn procedure_states_map_to_filter() {
        let req = request(serde_json::json!({
            "search": "abc",
            "procol": ["liquidation", "plan_continuation"],
        }));
        assert!(req.validate().is_ok());
        assert_eq!(
            req.into_params().unwrap().filter.procedures,
            vec![ProcedureState::Liquidation, ProcedureState::PlanContinuation]
        );

        let unknown: Result<SearchRequest, _> =
            serde_json::from_value(serde_json::json!({ "search": "abc", "procol": ["faillite"] }));
        assert!(unknown.is_err());
    }

    #[test]
    fn negative_page_rejected() {
        let req = request(serde_json::json!({ "search": "abc", "page": -2 }));
        assert!(req.validate().unwrap_err().contains("page"));
    }

    #[test]
    fn malformed_department_fails_deserialization() {
        let parsed: Result<SearchRequest, _> =
            serde_json::from_value(serde_json::json!({ "search": "abc", "departements": ["7"] }));
        assert!(parsed.is_err());
    }
}
