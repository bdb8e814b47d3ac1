use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Path,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use keygate_auth::{Operation, Principal};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.accounts.register(body.into()) {
        Ok(reg) => (StatusCode::CREATED, Json(dto::registration_to_json(reg))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn show(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    match services.accounts.show(&principal) {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<dto::UpdateProfileRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.accounts.update(&principal, body.into()) {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn destroy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    match services.accounts.destroy(&principal) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn accept_tos(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    match services.accounts.accept_tos(&principal) {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

/// Audit view: what the gate and elevation policy would decide.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    operation: Result<Path<Operation>, PathRejection>,
) -> axum::response::Response {
    let Path(operation) = match operation {
        Ok(operation) => operation,
        Err(rejection) => {
            return errors::json_error(rejection.status(), "bad_request", rejection.body_text());
        }
    };
    match services.accounts.explain(&principal, operation) {
        Ok(explained) => (StatusCode::OK, Json(explained)).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
