//! User Store interface consumed by the auth core, plus an in-memory
//! implementation for tests/dev.
//!
//! The core only reads through this trait before a decision; mutations are
//! invoked strictly after the gate and policy checks pass.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keygate_core::UserId;

use crate::account::{AccountState, TosVersion};

/// User record as owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub activated: bool,
    /// ToS version the user last accepted.
    pub accepted_tos_version: Option<String>,
    pub tos_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Field-level constraint violation, passed through to callers unchanged.
    #[error("validation failed on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("user not found")]
    NotFound,

    #[error("user store unavailable")]
    Unavailable,
}

impl StoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// User Store contract.
pub trait UserStore: Send + Sync {
    fn find_user(&self, id: UserId) -> Option<User>;

    /// Whether a username or email is already taken (case-insensitive).
    fn user_exists(&self, login: &str) -> bool;

    /// The ToS version in force at `now`, if any.
    fn effective_tos(&self, now: DateTime<Utc>) -> Option<TosVersion>;

    fn create_user(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;

    fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError>;

    /// Activation completion.
    fn activate(&self, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError>;

    /// Record acceptance of the ToS in force at `now`. Accepting the same
    /// version again changes nothing.
    fn accept_tos(&self, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError>;

    fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    /// Derived account state of `user` at `now`.
    fn account_state(&self, user: &User, now: DateTime<Utc>) -> AccountState {
        let effective = self.effective_tos(now);
        AccountState::derive(
            user.activated,
            user.accepted_tos_version.as_deref(),
            effective.as_ref(),
        )
    }
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn find_user(&self, id: UserId) -> Option<User> {
        (**self).find_user(id)
    }

    fn user_exists(&self, login: &str) -> bool {
        (**self).user_exists(login)
    }

    fn effective_tos(&self, now: DateTime<Utc>) -> Option<TosVersion> {
        (**self).effective_tos(now)
    }

    fn create_user(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        (**self).create_user(new_user, now)
    }

    fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        (**self).update_profile(id, changes, now)
    }

    fn activate(&self, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError> {
        (**self).activate(id, now)
    }

    fn accept_tos(&self, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError> {
        (**self).accept_tos(id, now)
    }

    fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        (**self).delete_user(id)
    }
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    tos_versions: RwLock<Vec<TosVersion>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a ToS version. It becomes enforceable once its effective date passes.
    pub fn publish_tos(&self, version: TosVersion) -> Result<(), StoreError> {
        let mut versions = self.tos_versions.write().map_err(|_| poisoned("tos_versions"))?;
        versions.push(version);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(lock: &'static str) -> StoreError {
    tracing::warn!(lock, "in-memory user store lock poisoned");
    StoreError::Unavailable
}

#[derive(Clone, Copy)]
enum Field {
    Username,
    Email,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
        }
    }
}

fn check_field(
    users: &HashMap<UserId, User>,
    id: Option<UserId>,
    field: Field,
    value: &str,
) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(field.name(), "can't be blank"));
    }
    let taken = users.values().any(|u| {
        Some(u.id) != id
            && match field {
                Field::Username => u.username.eq_ignore_ascii_case(value),
                Field::Email => u.email.eq_ignore_ascii_case(value),
            }
    });
    if taken {
        return Err(StoreError::validation(field.name(), "has already been taken"));
    }
    Ok(())
}

impl UserStore for InMemoryUserStore {
    fn find_user(&self, id: UserId) -> Option<User> {
        // The trait has no error channel here; a poisoned lock reads as "no user".
        let users = self.users.read().map_err(|_| poisoned("users")).ok()?;
        users.get(&id).cloned()
    }

    fn user_exists(&self, login: &str) -> bool {
        let Ok(users) = self.users.read().map_err(|_| poisoned("users")) else {
            return false;
        };
        users.values().any(|u| {
            u.username.eq_ignore_ascii_case(login) || u.email.eq_ignore_ascii_case(login)
        })
    }

    fn effective_tos(&self, now: DateTime<Utc>) -> Option<TosVersion> {
        let versions = self.tos_versions.read().map_err(|_| poisoned("tos_versions")).ok()?;
        versions
            .iter()
            .filter(|v| v.is_in_effect_at(now))
            .max_by_key(|v| v.effective_at)
            .cloned()
    }

    fn create_user(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned("users"))?;

        check_field(&users, None, Field::Username, &new_user.username)?;
        check_field(&users, None, Field::Email, &new_user.email)?;

        let user = User {
            id: UserId::new(),
            username: new_user.username,
            email: new_user.email,
            display_name: new_user.display_name,
            activated: false,
            accepted_tos_version: None,
            tos_accepted_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned("users"))?;

        if let Some(username) = &changes.username {
            check_field(&users, Some(id), Field::Username, username)?;
        }
        if let Some(email) = &changes.email {
            check_field(&users, Some(id), Field::Email, email)?;
        }

        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(display_name) = changes.display_name {
            user.display_name = Some(display_name);
        }
        user.updated_at = now;
        Ok(user.clone())
    }

    fn activate(&self, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned("users"))?;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !user.activated {
            user.activated = true;
            user.updated_at = now;
        }
        Ok(user.clone())
    }

    fn accept_tos(&self, id: UserId, now: DateTime<Utc>) -> Result<User, StoreError> {
        let effective = self.effective_tos(now);
        let mut users = self.users.write().map_err(|_| poisoned("users"))?;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;

        if let Some(current) = effective {
            if user.accepted_tos_version.as_deref() != Some(current.version.as_str()) {
                user.accepted_tos_version = Some(current.version);
                user.tos_accepted_at = Some(now);
                user.updated_at = now;
            }
        }
        Ok(user.clone())
    }

    fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| poisoned("users"))?;
        users.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
