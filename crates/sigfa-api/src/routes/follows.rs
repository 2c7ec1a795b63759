//! # Follow Routes
//!
//! - `GET /v1/follows`: the caller's follow list.
//! - `POST /v1/follows/{siret}`: start following (201), or 204 when already followed.
//! - `DELETE /v1/follows/{siret}`: stop following (200), or 404 when not followed.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sigfa_core::{Siret, Summary};
use utoipa::ToSchema;

use crate::auth::Principal;
use crate::catalog::{EndFollow, FollowOutcome, FollowRecord, NewFollow};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;
use crate::views::follow as view;

const MAX_COMMENT_LEN: usize = 4000;

fn check_text(field: &str, category: &str, comment: Option<&str>) -> Result<(), String> {
    if category.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if category.len() > 255 {
        return Err(format!("{field} must not exceed 255 characters"));
    }
    if comment.is_some_and(|c| c.len() > MAX_COMMENT_LEN) {
        return Err(format!("comment must not exceed {MAX_COMMENT_LEN} characters"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FollowRequest {
    #[serde(default)]
    pub comment: Option<String>,
    /// Why the establishment is followed. Required.
    #[serde(default)]
    pub category: String,
}

impl Validate for FollowRequest {
    fn validate(&self) -> Result<(), String> {
        check_text("category", &self.category, self.comment.as_deref())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnfollowRequest {
    #[serde(default)]
    pub unfollow_comment: Option<String>,
    /// Why the follow ends. Required.
    #[serde(default)]
    pub unfollow_category: String,
}

impl Validate for UnfollowRequest {
    fn validate(&self) -> Result<(), String> {
        check_text(
            "unfollow_category",
            &self.unfollow_category,
            self.unfollow_comment.as_deref(),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnfollowResponse {
    #[schema(value_type = String)]
    pub siret: Siret,
    pub followed: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/follows", get(list_follows))
        .route(
            "/v1/follows/{siret}",
            axum::routing::post(follow).delete(unfollow),
        )
}

/// GET /v1/follows
#[utoipa::path(
    get,
    path = "/v1/follows",
    responses(
        (status = 200, description = "Followed establishments, redacted", body = Vec<Summary>),
    ),
    tag = "follows"
)]
async fn list_follows(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Summary>>, AppError> {
    Ok(Json(view::list(&state.catalog, &principal).await?))
}

/// POST /v1/follows/{siret}
#[utoipa::path(
    post,
    path = "/v1/follows/{siret}",
    params(("siret" = String, Path, description = "14-digit establishment identifier")),
    request_body = FollowRequest,
    responses(
        (status = 201, description = "Follow started", body = FollowRecord),
        (status = 204, description = "Already followed"),
        (status = 404, description = "Unknown or not visible", body = ErrorBody),
        (status = 422, description = "Missing category or malformed siret", body = ErrorBody),
    ),
    tag = "follows"
)]
async fn follow(
    State(state): State<AppState>,
    principal: Principal,
    Path(siret): Path<String>,
    body: Result<Json<FollowRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let siret = Siret::new(siret)?;
    let req = extract_validated_json(body)?;
    let request = NewFollow {
        category: req.category,
        comment: req.comment,
    };
    let outcome = view::follow(&state.catalog, &principal, &siret, &request).await?;
    Ok(match outcome {
        FollowOutcome::Created(record) => (StatusCode::CREATED, Json(record)).into_response(),
        FollowOutcome::AlreadyFollowed => StatusCode::NO_CONTENT.into_response(),
    })
}

/// DELETE /v1/follows/{siret}
#[utoipa::path(
    delete,
    path = "/v1/follows/{siret}",
    params(("siret" = String, Path, description = "14-digit establishment identifier")),
    request_body = UnfollowRequest,
    responses(
        (status = 200, description = "Follow ended", body = UnfollowResponse),
        (status = 404, description = "Not followed", body = ErrorBody),
        (status = 422, description = "Missing unfollow_category or malformed siret", body = ErrorBody),
    ),
    tag = "follows"
)]
async fn unfollow(
    State(state): State<AppState>,
    principal: Principal,
    Path(siret): Path<String>,
    body: Result<Json<UnfollowRequest>, JsonRejection>,
) -> Result<Json<UnfollowResponse>, AppError> {
    let siret = Siret::new(siret)?;
    let req = extract_validated_json(body)?;
    let request = EndFollow {
        category: req.unfollow_category,
        comment: req.unfollow_comment,
    };
    view::unfollow(&state.catalog, &principal, &siret, &request).await?;
    Ok(Json(UnfollowResponse {
        siret,
        followed: false,
    }))
}
