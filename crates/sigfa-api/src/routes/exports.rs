//! # Export Route
//!
//! `POST /v1/exports/follows` merges the caller's follow list with the cases
//! the case-management system reports as theirs. Rows are redacted and
//! sorted by name then siret.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use sigfa_core::{Siret, Summary};
use utoipa::ToSchema;

use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;
use crate::views::export;

const MAX_EXTERNAL_CASES: usize = 10_000;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExportRequest {
    /// Sirets of the cases owned in the case-management system.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub external_owned: Vec<Siret>,
}

impl Validate for ExportRequest {
    fn validate(&self) -> Result<(), String> {
        if self.external_owned.len() > MAX_EXTERNAL_CASES {
            return Err(format!(
                "external_owned must not exceed {MAX_EXTERNAL_CASES} entries"
            ));
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/exports/follows", post(export_follows))
}

/// POST /v1/exports/follows
#[utoipa::path(
    post,
    path = "/v1/exports/follows",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Followed and externally owned establishments, redacted", body = Vec<Summary>),
        (status = 422, description = "Malformed siret in external_owned", body = ErrorBody),
    ),
    tag = "follows"
)]
async fn export_follows(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Json<Vec<Summary>>, AppError> {
    let req = extract_validated_json(body)?;
    let rows = export::follows(&state.catalog, &principal, &req.external_owned).await?;
    tracing::info!(principal = %principal.username, rows = rows.len(), "follow export");
    Ok(Json(rows))
}
