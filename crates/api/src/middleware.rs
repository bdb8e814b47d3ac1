use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use keygate_auth::AccountService;

use crate::app::errors::json_error;

#[derive(Clone)]
pub struct AuthState {
    pub accounts: Arc<AccountService>,
}

/// Resolve the bearer token to a [`keygate_auth::Principal`] and attach it to
/// the request. A missing header is treated exactly like a bad token.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = extract_bearer(req.headers());

    let principal = match state.accounts.authenticate(token) {
        Ok(p) => p,
        Err(e) => return json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

/// `Authorization: Bearer <token>`; anything else reads as "no token".
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
