//! Account Gate: lifecycle preconditions evaluated after authentication and
//! before an operation touches the store.
//!
//! Rules, first match wins:
//! 1. `Show` is always permitted.
//! 2. `Update` requires activation, then acceptance of the ToS in force.
//!    Activation is checked first, so an inactive user with pending ToS gets
//!    [`GateError::UserInactive`].
//! 3. `Destroy` has no lifecycle precondition (elevation is the policy's job).
//! 4. `AcceptTos` is always permitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::AccountState;
use crate::principal::Principal;

/// Operation classes the core distinguishes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read the authenticated user's own profile.
    Show,
    /// Mutate the user's profile.
    Update,
    /// Delete the account.
    Destroy,
    /// Accept the ToS currently in force.
    AcceptTos,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Show => "show",
            Operation::Update => "update",
            Operation::Destroy => "destroy",
            Operation::AcceptTos => "accept_tos",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("forbidden: terms of service not accepted")]
    TosNotAccepted,

    #[error("forbidden: user is not activated")]
    UserInactive,
}

/// Check lifecycle preconditions for `operation` against the target account.
///
/// - No IO
/// - No panics
pub fn check_account_gate(
    principal: &Principal,
    operation: Operation,
    target: &AccountState,
) -> Result<(), GateError> {
    let outcome = gate_decision(operation, target);
    if let Err(e) = &outcome {
        tracing::debug!(user_id = %principal.user_id, %operation, error = %e, "account gate denied");
    }
    outcome
}

/// The gate rules alone, without request logging.
pub(crate) fn gate_decision(operation: Operation, target: &AccountState) -> Result<(), GateError> {
    match operation {
        Operation::Show | Operation::Destroy | Operation::AcceptTos => Ok(()),
        Operation::Update => {
            if !target.is_activated() {
                Err(GateError::UserInactive)
            } else if target.tos_pending() {
                Err(GateError::TosNotAccepted)
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Activation, TosStatus};
    use keygate_core::UserId;

    fn principal() -> Principal {
        Principal::new(UserId::new(), false)
    }

    fn state(activation: Activation, tos: TosStatus) -> AccountState {
        AccountState { activation, tos }
    }

    const ALL_STATES: [(Activation, TosStatus); 6] = [
        (Activation::Active, TosStatus::Accepted),
        (Activation::Active, TosStatus::Pending),
        (Activation::Active, TosStatus::NotRequired),
        (Activation::InactiveNew, TosStatus::Accepted),
        (Activation::InactiveNew, TosStatus::Pending),
        (Activation::InactiveNew, TosStatus::NotRequired),
    ];

    #[test]
    fn show_destroy_and_accept_tos_pass_in_every_state() {
        for (a, t) in ALL_STATES {
            for op in [Operation::Show, Operation::Destroy, Operation::AcceptTos] {
                assert_eq!(
                    check_account_gate(&principal(), op, &state(a, t)),
                    Ok(()),
                    "{op} in {a:?}/{t:?}"
                );
            }
        }
    }

    #[test]
    fn update_requires_accepted_tos_when_one_is_in_force() {
        let p = principal();
        assert_eq!(
            check_account_gate(&p, Operation::Update, &state(Activation::Active, TosStatus::Pending)),
            Err(GateError::TosNotAccepted)
        );
        assert_eq!(
            check_account_gate(&p, Operation::Update, &state(Activation::Active, TosStatus::Accepted)),
            Ok(())
        );
        assert_eq!(
            check_account_gate(&p, Operation::Update, &state(Activation::Active, TosStatus::NotRequired)),
            Ok(())
        );
    }

    #[test]
    fn update_requires_activation() {
        let p = principal();
        assert_eq!(
            check_account_gate(&p, Operation::Update, &state(Activation::InactiveNew, TosStatus::Accepted)),
            Err(GateError::UserInactive)
        );
    }

    #[test]
    fn inactive_wins_over_pending_tos() {
        assert_eq!(
            check_account_gate(
                &principal(),
                Operation::Update,
                &state(Activation::InactiveNew, TosStatus::Pending)
            ),
            Err(GateError::UserInactive)
        );
    }
}
