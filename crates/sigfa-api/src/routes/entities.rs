//! # Entity Routes
//!
//! - `GET /v1/establishments/{siret}`: one establishment and its enterprise.
//! - `GET /v1/enterprises/{siren}`: one enterprise and its visible establishments.
//!
//! A malformed identifier is a 422. An unknown identifier and one the
//! caller may not see are the same 404.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use sigfa_core::{Siren, Siret};

use crate::auth::Principal;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::views::entity::{self, EnterpriseView, EstablishmentView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/establishments/{siret}", get(get_establishment))
        .route("/v1/enterprises/{siren}", get(get_enterprise))
}

/// GET /v1/establishments/{siret}
#[utoipa::path(
    get,
    path = "/v1/establishments/{siret}",
    params(("siret" = String, Path, description = "14-digit establishment identifier")),
    responses(
        (status = 200, description = "Redacted establishment", body = EstablishmentView),
        (status = 404, description = "Unknown or not visible", body = ErrorBody),
        (status = 422, description = "Malformed siret", body = ErrorBody),
    ),
    tag = "entities"
)]
async fn get_establishment(
    State(state): State<AppState>,
    principal: Principal,
    Path(siret): Path<String>,
) -> Result<Json<EstablishmentView>, AppError> {
    let siret = Siret::new(siret)?;
    let view = entity::establishment(&state.catalog, &principal, &siret).await?;
    Ok(Json(view))
}

/// GET /v1/enterprises/{siren}
#[utoipa::path(
    get,
    path = "/v1/enterprises/{siren}",
    params(("siren" = String, Path, description = "9-digit enterprise identifier")),
    responses(
        (status = 200, description = "Redacted enterprise with its establishments", body = EnterpriseView),
        (status = 404, description = "Unknown or not visible", body = ErrorBody),
        (status = 422, description = "Malformed siren", body = ErrorBody),
    ),
    tag = "entities"
)]
async fn get_enterprise(
    State(state): State<AppState>,
    principal: Principal,
    Path(siren): Path<String>,
) -> Result<Json<EnterpriseView>, AppError> {
    let siren = Siren::new(siren)?;
    let view = entity::enterprise(&state.catalog, &principal, &siren).await?;
    Ok(Json(view))
}
