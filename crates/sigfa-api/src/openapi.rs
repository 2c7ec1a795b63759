//! # OpenAPI Document
//!
//! Collects the utoipa-annotated routes into one OpenAPI 3.1 document,
//! served at `/openapi.json` behind the same auth layer as the API.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the gateway bearer token scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Shared gateway secret, set with SIGFA_AUTH_TOKEN. The caller \
                             identity travels in x-sigfa-principal and x-sigfa-roles.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SIGFA API",
        version = "0.1.0",
        description = "Weak-signals company monitor.\n\nEvery record leaves the service redacted for the calling principal: \
            jurisdiction decides what is visible, mandates decide which sensitive categories are disclosed, \
            and an alert or a follow is required before any of them is.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Entities ────────────────────────────────────────────────
        crate::routes::entities::get_establishment,
        crate::routes::entities::get_enterprise,
        // ── Search ──────────────────────────────────────────────────
        crate::routes::search::search,
        // ── Watchlists ──────────────────────────────────────────────
        crate::routes::watchlists::list_watchlists,
        crate::routes::watchlists::current_scores,
        crate::routes::watchlists::list_scores,
        // ── Follows ─────────────────────────────────────────────────
        crate::routes::follows::list_follows,
        crate::routes::follows::follow,
        crate::routes::follows::unfollow,
        crate::routes::exports::export_follows,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::views::Page,
            crate::views::entity::EstablishmentView,
            crate::views::entity::EnterpriseView,
            crate::views::watchlist::ScoredPage,
            crate::catalog::WatchlistRow,
            crate::catalog::FollowRecord,
            crate::routes::search::SearchRequest,
            crate::routes::watchlists::WatchlistRequest,
            crate::routes::follows::FollowRequest,
            crate::routes::follows::UnfollowRequest,
            crate::routes::follows::UnfollowResponse,
            crate::routes::exports::ExportRequest,
            sigfa_core::Summary,
            sigfa_core::PermissionSet,
            sigfa_core::CategoryFlags,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "entities", description = "Single establishment and enterprise records"),
        (name = "search", description = "Paginated free-text search with alert-tier counts"),
        (name = "watchlists", description = "Detection lists and their scored rows"),
        (name = "follows", description = "Follow list, follow toggling and export"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
