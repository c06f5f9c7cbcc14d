//! Edge gateway: runs in front of every route.
//!
//! Per request: strip client identity headers, extract a bearer token,
//! verify it, evaluate the access policy, then either forward (with identity
//! injected) or reject. No state is shared between requests beyond the
//! read-only validator and policy.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use innkeep_auth::{AccessPolicy, Allowed, AuthError, JwtValidator, Principal};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Verified subject id, set by the gateway only.
pub const SUBJECT_ID_HEADER: HeaderName = HeaderName::from_static("x-subject-id");

/// Verified role, set by the gateway only.
pub const SUBJECT_ROLE_HEADER: HeaderName = HeaderName::from_static("x-subject-role");

#[derive(Clone)]
pub struct GatewayState {
    pub jwt: Arc<dyn JwtValidator>,
    pub policy: Arc<AccessPolicy>,
}

pub async fn gateway(
    State(state): State<GatewayState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Identity headers are only trusted when we set them.
    strip_identity(req.headers_mut());

    let path = req.uri().path().to_owned();

    match authorize_request(&state, req.headers(), &path, Utc::now()) {
        Ok(Allowed { principal }) => {
            if let Some(principal) = principal {
                inject_identity(&mut req, principal);
            }
            next.run(req).await
        }
        Err(err) => {
            tracing::info!(
                method = %req.method(),
                path = %path,
                kind = err.kind(),
                "request rejected"
            );
            errors::auth_error_to_response(&err)
        }
    }
}

/// Extract → verify → authorize for one request.
///
/// On protected paths any verification failure rejects. On public paths a
/// bad token is ignored and the request continues anonymously.
pub fn authorize_request(
    state: &GatewayState,
    headers: &HeaderMap,
    path: &str,
    now: DateTime<Utc>,
) -> Result<Allowed, AuthError> {
    let protected = state.policy.is_protected(path);

    let claims = match extract_bearer(headers) {
        None => None,
        Some(token) => match token.and_then(|t| state.jwt.validate(t, now)) {
            Ok(claims) => Some(claims),
            Err(err) if protected => return Err(err),
            Err(err) => {
                tracing::debug!(path, kind = err.kind(), "ignoring bad token on public path");
                None
            }
        },
    };

    state.policy.evaluate(path, claims.as_ref())
}

/// `None` when there is no bearer credential at all; `Some(Err)` when the
/// header claims to be a bearer token but cannot carry one.
fn extract_bearer(headers: &HeaderMap) -> Option<Result<&str, AuthError>> {
    let value = headers.get(AUTHORIZATION)?;

    let Ok(value) = value.to_str() else {
        return Some(Err(AuthError::TokenMalformed));
    };

    let (scheme, token) = value.trim().split_once(' ').unwrap_or((value.trim(), ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return Some(Err(AuthError::TokenMalformed));
    }

    Some(Ok(token))
}

fn strip_identity(headers: &mut HeaderMap) {
    headers.remove(SUBJECT_ID_HEADER);
    headers.remove(SUBJECT_ROLE_HEADER);
}

fn inject_identity(req: &mut Request<Body>, principal: Principal) {
    let headers = req.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&principal.subject.to_string()) {
        headers.insert(SUBJECT_ID_HEADER, v);
    }
    if let Ok(v) = HeaderValue::from_str(principal.role.as_str()) {
        headers.insert(SUBJECT_ROLE_HEADER, v);
    }
    req.extensions_mut().insert(PrincipalContext::from(principal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use chrono::Duration;
    use innkeep_auth::{Hs256JwtValidator, Role, TokenIssuer};
    use innkeep_core::UserId;
    use tower::ServiceExt;

    use crate::config::default_access_rules;

    const SECRET: &[u8] = b"gateway-test-secret";

    fn state() -> GatewayState {
        GatewayState {
            jwt: Arc::new(Hs256JwtValidator::new(SECRET)),
            policy: Arc::new(AccessPolicy::new(default_access_rules()).unwrap()),
        }
    }

    fn token(role: Role, issued_at: DateTime<Utc>) -> String {
        TokenIssuer::new(SECRET, Duration::hours(24))
            .issue(UserId::new(), role, issued_at)
            .unwrap()
            .token
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extraction_handles_schemes() {
        assert!(extract_bearer(&HeaderMap::new()).is_none());
        assert!(extract_bearer(&bearer("Basic dXNlcjpwYXNz")).is_none());
        assert_eq!(extract_bearer(&bearer("Bearer abc")), Some(Ok("abc")));
        assert_eq!(extract_bearer(&bearer("bearer   abc ")), Some(Ok("abc")));
        assert_eq!(extract_bearer(&bearer("Bearer")), Some(Err(AuthError::TokenMalformed)));
        assert_eq!(extract_bearer(&bearer("Bearer   ")), Some(Err(AuthError::TokenMalformed)));
    }

    #[test]
    fn protected_path_outcomes() {
        let s = state();
        let now = Utc::now();
        let admin = bearer(&format!("Bearer {}", token(Role::ADMIN, now)));
        let user = bearer(&format!("Bearer {}", token(Role::USER, now)));
        let stale = bearer(&format!("Bearer {}", token(Role::ADMIN, now - Duration::hours(25))));

        assert!(authorize_request(&s, &admin, "/api/admin/hotels", now).is_ok());
        assert_eq!(
            authorize_request(&s, &user, "/api/admin/hotels", now),
            Err(AuthError::Forbidden(Role::ADMIN))
        );
        assert_eq!(
            authorize_request(&s, &HeaderMap::new(), "/api/admin/hotels", now),
            Err(AuthError::Unauthenticated)
        );
        assert_eq!(
            authorize_request(&s, &stale, "/api/admin/hotels", now),
            Err(AuthError::TokenExpired)
        );
        assert_eq!(
            authorize_request(&s, &bearer("Bearer not.a.jwt"), "/api/bookings", now),
            Err(AuthError::TokenMalformed)
        );
    }

    #[test]
    fn public_paths_tolerate_bad_tokens() {
        let s = state();
        let now = Utc::now();
        assert_eq!(
            authorize_request(&s, &bearer("Bearer garbage"), "/api/hotels", now),
            Ok(Allowed { principal: None })
        );

        let user = bearer(&format!("Bearer {}", token(Role::USER, now)));
        let allowed = authorize_request(&s, &user, "/api/hotels", now).unwrap();
        assert_eq!(allowed.principal.map(|p| p.role), Some(Role::USER));
    }

    async fn echo_identity(headers: HeaderMap) -> String {
        let get = |name: &HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string()
        };
        format!("{}|{}", get(&SUBJECT_ID_HEADER), get(&SUBJECT_ROLE_HEADER))
    }

    fn echo_app() -> Router {
        Router::new()
            .route("/api/me", get(echo_identity))
            .route("/api/hotels", get(echo_identity))
            .layer(axum::middleware::from_fn_with_state(state(), gateway))
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn injected_identity_overrides_spoofed_headers() {
        let issued = TokenIssuer::new(SECRET, Duration::hours(1))
            .issue(UserId::new(), Role::USER, Utc::now())
            .unwrap();

        let req = Request::builder()
            .uri("/api/me")
            .header(AUTHORIZATION, format!("Bearer {}", issued.token))
            .header("x-subject-id", "00000000-0000-0000-0000-000000000000")
            .header("x-subject-role", "admin")
            .body(Body::empty())
            .unwrap();

        let res = echo_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), axum::http::StatusCode::OK);
        assert_eq!(body_text(res).await, format!("{}|user", issued.claims.sub));
    }

    #[tokio::test]
    async fn spoofed_headers_are_dropped_on_anonymous_requests() {
        let req = Request::builder()
            .uri("/api/hotels")
            .header("x-subject-id", "00000000-0000-0000-0000-000000000000")
            .header("x-subject-role", "admin")
            .body(Body::empty())
            .unwrap();

        let res = echo_app().oneshot(req).await.unwrap();
        assert_eq!(body_text(res).await, "-|-");
    }

    #[tokio::test]
    async fn rejection_short_circuits_with_json_error() {
        let req = Request::builder().uri("/api/me").body(Body::empty()).unwrap();

        let res = echo_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), axum::http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "authentication required" }));
    }
}
