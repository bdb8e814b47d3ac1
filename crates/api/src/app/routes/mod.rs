use axum::{
    Router,
    routing::{get, put},
};

pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route(
            "/users/me",
            get(users::show).patch(users::update).delete(users::destroy),
        )
        .route("/users/me/tos", put(users::accept_tos))
        .route("/users/me/authorization/:operation", get(users::explain))
}
