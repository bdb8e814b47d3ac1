use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use keygate_auth::Principal;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<Principal>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": principal.user_id.to_string(),
        "elevated": principal.elevated,
    }))
}
