//! Failure taxonomy surfaced to the application layer.
//!
//! Every variant is terminal: nothing here is retried or recovered
//! internally, and none is raised after a store mutation has started.

use thiserror::Error;

use crate::authenticate::Unauthorized;
use crate::authorize::PolicyError;
use crate::gate::GateError;
use crate::store::StoreError;
use crate::token::TokenError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: terms of service not accepted")]
    ForbiddenTosNotAccepted,

    #[error("forbidden: user is not activated")]
    ForbiddenUserInactive,

    #[error("forbidden: elevated (sudo) token required")]
    ForbiddenSudoRequired,

    /// Passed through unchanged from the user store.
    #[error("validation failed on '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("registration is disabled")]
    RegistrationDisabled,

    #[error("user store unavailable")]
    StoreUnavailable,

    #[error(transparent)]
    Token(TokenError),
}

impl AccountError {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::Unauthorized => "unauthorized",
            AccountError::ForbiddenTosNotAccepted => "tos_not_accepted",
            AccountError::ForbiddenUserInactive => "user_inactive",
            AccountError::ForbiddenSudoRequired => "sudo_required",
            AccountError::ValidationFailed { .. } => "validation_failed",
            AccountError::RegistrationDisabled => "registration_disabled",
            AccountError::StoreUnavailable => "store_unavailable",
            AccountError::Token(_) => "internal",
        }
    }
}

impl From<Unauthorized> for AccountError {
    fn from(_: Unauthorized) -> Self {
        AccountError::Unauthorized
    }
}

impl From<GateError> for AccountError {
    fn from(value: GateError) -> Self {
        match value {
            GateError::TosNotAccepted => AccountError::ForbiddenTosNotAccepted,
            GateError::UserInactive => AccountError::ForbiddenUserInactive,
        }
    }
}

impl From<PolicyError> for AccountError {
    fn from(value: PolicyError) -> Self {
        match value {
            PolicyError::SudoRequired => AccountError::ForbiddenSudoRequired,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation { field, message } => {
                AccountError::ValidationFailed { field, message }
            }
            // The subject vanished between authentication and the mutation.
            StoreError::NotFound => AccountError::Unauthorized,
            StoreError::Unavailable => AccountError::StoreUnavailable,
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Decode(_) => AccountError::Unauthorized,
            other => AccountError::Token(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_validation_passes_through_with_field() {
        let err: AccountError = StoreError::validation("email", "has already been taken").into();
        assert_eq!(
            err,
            AccountError::ValidationFailed {
                field: "email".to_string(),
                message: "has already been taken".to_string(),
            }
        );
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn decode_failures_collapse_to_unauthorized() {
        let err: AccountError = TokenError::Decode("InvalidSignature".to_string()).into();
        assert_eq!(err, AccountError::Unauthorized);
    }
}
