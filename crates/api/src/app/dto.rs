use serde::Deserialize;

use keygate_auth::{NewUser, ProfileChanges, Registration, User};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<RegisterUserRequest> for NewUser {
    fn from(req: RegisterUserRequest) -> Self {
        NewUser {
            username: req.username,
            email: req.email,
            display_name: req.display_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileChanges {
            username: req.username,
            email: req.email,
            display_name: req.display_name,
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn user_to_json(user: User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "display_name": user.display_name,
        "activated": user.activated,
        "accepted_tos_version": user.accepted_tos_version,
        "tos_accepted_at": user.tos_accepted_at.map(|t| t.to_rfc3339()),
        "created_at": user.created_at.to_rfc3339(),
        "updated_at": user.updated_at.to_rfc3339(),
    })
}

pub fn registration_to_json(reg: Registration) -> serde_json::Value {
    serde_json::json!({
        "user": user_to_json(reg.user),
        "token": reg.token,
    })
}
