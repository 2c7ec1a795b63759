//! # API Route Modules
//!
//! - `entities`: single establishment and enterprise fetch.
//! - `search`: paginated free-text search.
//! - `watchlists`: detection-list catalogue and scored watchlists.
//! - `follows`: follow list, follow and unfollow.
//! - `exports`: follow list merged with externally owned cases.
//!
//! Every route sits behind the auth middleware and reads the caller's
//! [`Principal`](crate::auth::Principal) from the request extensions.

pub mod entities;
pub mod exports;
pub mod follows;
pub mod search;
pub mod watchlists;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::views::PageOutcome;

/// A page past the end is a successful empty answer.
impl<T: Serialize> IntoResponse for PageOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            PageOutcome::Page(page) => (StatusCode::OK, Json(page)).into_response(),
            PageOutcome::Empty => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Convert a client page number, rejecting negatives.
pub(crate) fn page_index(page: i64) -> Result<usize, String> {
    usize::try_from(page).map_err(|_| format!("page must be >= 0, got {page}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_page_rejected() {
        assert_eq!(page_index(0), Ok(0));
        assert_eq!(page_index(3), Ok(3));
        assert!(page_index(-1).is_err());
    }

    #[test]
    fn empty_outcome_is_no_content() {
        let response = PageOutcome::<Vec<u8>>::Empty.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = PageOutcome::Page(vec![1u8]).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
