//! # Principal Authentication
//!
//! The identity provider sits in front of this service. The gateway resolves
//! the caller and forwards two headers:
//!
//! - `x-sigfa-principal`: the caller's username;
//! - `x-sigfa-roles`: comma-separated role tags.
//!
//! When a shared token is configured, the gateway must also present it as
//! `Authorization: Bearer <token>`; the comparison is constant-time. The
//! middleware parses the headers into a [`Principal`] once and stores it in
//! the request extensions, where handlers pick it up as an extractor.

use axum::extract::{FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sigfa_core::Scope;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AppError;

pub const PRINCIPAL_HEADER: &str = "x-sigfa-principal";
pub const ROLES_HEADER: &str = "x-sigfa-roles";

/// A string wiped from memory on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Auth settings injected as a request extension.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub token: Option<SecretString>,
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub scope: Scope,
}

impl Principal {
    pub fn new(username: impl Into<String>, scope: Scope) -> Self {
        Self {
            username: username.into(),
            scope,
        }
    }

    /// Build the principal from the gateway headers.
    ///
    /// Header values are read as UTF-8 bytes: the nationwide role tag is not
    /// plain ASCII.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let username = headers
            .get(PRINCIPAL_HEADER)
            .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing principal".to_string()))?;

        let roles = headers
            .get(ROLES_HEADER)
            .map(|v| {
                std::str::from_utf8(v.as_bytes())
                    .map_err(|_| AppError::Unauthorized("roles header is not UTF-8".to_string()))
            })
            .transpose()?
            .unwrap_or_default();

        let scope = Scope::from_tags(roles.split(',').map(str::trim).filter(|t| !t.is_empty()));
        Ok(Self::new(username, scope))
    }
}

fn constant_time_token_eq(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Authenticate the request and attach its [`Principal`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    if let Some(expected) = &config.token {
        let presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match presented {
            Some(token) if constant_time_token_eq(token, expected.expose()) => {}
            _ => {
                tracing::debug!("rejecting request with missing or invalid gateway token");
                return Err(AppError::Unauthorized(
                    "missing or invalid bearer token".to_string(),
                ));
            }
        }
    }

    let principal = Principal::from_headers(request.headers())?;
    tracing::debug!(principal = %principal.username, "authenticated");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no authenticated principal".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use sigfa_core::{Category, DepartmentCode};

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_bytes(value.as_bytes()).unwrap());
        }
        map
    }

    #[test]
    fn principal_from_headers() {
        let h = headers(&[(PRINCIPAL_HEADER, "alice"), (ROLES_HEADER, "75, score ,urssaf")]);
        let p = Principal::from_headers(&h).unwrap();
        assert_eq!(p.username, "alice");
        assert!(p.scope.holds(Category::Score));
        assert!(p.scope.holds(Category::TaxDebt));
        assert!(p.scope.geo().contains(&DepartmentCode::new("75").unwrap()));
    }

    #[test]
    fn nationwide_tag_survives_utf8_header() {
        let h = headers(&[(PRINCIPAL_HEADER, "bob"), (ROLES_HEADER, "France entière")]);
        let p = Principal::from_headers(&h).unwrap();
        assert_eq!(p.scope.geo(), &sigfa_core::GeoScope::Nationwide);
    }

    #[test]
    fn missing_principal_is_unauthorized() {
        let h = headers(&[(ROLES_HEADER, "75")]);
        assert!(matches!(
            Principal::from_headers(&h),
            Err(AppError::Unauthorized(_))
        ));
        let blank = headers(&[(PRINCIPAL_HEADER, "  ")]);
        assert!(Principal::from_headers(&blank).is_err());
    }

    #[test]
    fn missing_roles_gives_empty_scope() {
        let h = headers(&[(PRINCIPAL_HEADER, "carol")]);
        let p = Principal::from_headers(&h).unwrap();
        assert_eq!(p.scope.mandates().count(), 0);
    }

    #[test]
    fn token_comparison() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abc", "abd"));
        assert!(!constant_time_token_eq("abc", "abcd"));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let s = SecretString::new("hunter2");
        assert!(!format!("{s:?}").contains("hunter2"));
    }
}
