use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use keygate_auth::AccountError;

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    let status = match &err {
        AccountError::Unauthorized => StatusCode::UNAUTHORIZED,
        AccountError::ForbiddenTosNotAccepted
        | AccountError::ForbiddenUserInactive
        | AccountError::ForbiddenSudoRequired
        | AccountError::RegistrationDisabled => StatusCode::FORBIDDEN,
        AccountError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        AccountError::Token(e) => {
            tracing::error!(error = %e, "token issuance failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, err.code(), "internal error");
        }
    };

    match err {
        AccountError::ValidationFailed { field, message } => (
            status,
            axum::Json(json!({
                "error": "validation_failed",
                "message": message,
                "field": field,
            })),
        )
            .into_response(),
        other => json_error(status, other.code(), other.to_string()),
    }
}

/// Body extraction failures (bad JSON, wrong content type) in the common error shape.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "bad_request", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
