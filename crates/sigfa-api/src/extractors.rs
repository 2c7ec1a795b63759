//! # Request Body Extraction
//!
//! Handlers take their body as `Result<Json<T>, JsonRejection>` and hand it to
//! [`extract_json`] or [`extract_validated_json`], so a malformed body comes
//! back through [`AppError`] with the same JSON error shape as every other
//! failure instead of axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Field-level checks that serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

/// Extract the body, then run its [`Validate`] checks.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(body)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        page: i64,
    }

    impl Validate for Probe {
        fn validate(&self) -> Result<(), String> {
            if self.page < 0 {
                return Err("page must be >= 0".to_string());
            }
            Ok(())
        }
    }

    async fn body(json: &str) -> Result<Json<Probe>, JsonRejection> {
        let request = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        Json::<Probe>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let parsed = extract_validated_json(body(r#"{"page": 2}"#).await).unwrap();
        assert_eq!(parsed.page, 2);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let err = extract_json(body(r#"{"page": "two"}"#).await).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn failed_check_is_validation_error() {
        let err = extract_validated_json(body(r#"{"page": -1}"#).await).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("page")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
