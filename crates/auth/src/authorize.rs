use serde::Serialize;
use thiserror::Error;

use keygate_core::UserId;

use crate::account::AccountState;
use crate::gate::{GateError, Operation, gate_decision};
use crate::principal::Principal;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("forbidden: elevated (sudo) token required")]
    SudoRequired,
}

/// Elevation policy for an operation on the target account.
///
/// Only `Destroy` is elevation-sensitive, and only for activated accounts.
/// Deleting a never-activated account is self-cleanup and needs no sudo token.
///
/// - No IO
/// - No panics
pub fn authorize(
    principal: &Principal,
    operation: Operation,
    target: &AccountState,
) -> Result<(), PolicyError> {
    let outcome = policy_decision(principal, operation, target);
    if outcome.is_err() {
        tracing::debug!(user_id = %principal.user_id, %operation, "sudo token required");
    }
    outcome
}

/// The elevation rule alone, without request logging.
fn policy_decision(
    principal: &Principal,
    operation: Operation,
    target: &AccountState,
) -> Result<(), PolicyError> {
    match operation {
        Operation::Destroy if target.is_activated() && !principal.elevated => {
            Err(PolicyError::SudoRequired)
        }
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a gate + policy decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub user_id: UserId,
    pub operation: Operation,
    pub elevated: bool,
    pub account: AccountState,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UserInactive,
    TosNotAccepted,
    SudoRequired,
}

/// Explain why an operation would be allowed or denied.
///
/// Runs the same rules, in the same order, as the request path. Nothing is
/// logged as a denial; the explanation itself is logged once at `debug`.
pub fn explain_authorization(
    principal: &Principal,
    operation: Operation,
    target: &AccountState,
) -> AuthorizationExplanation {
    let denial = match gate_decision(operation, target) {
        Err(GateError::UserInactive) => Some(DenialKind::UserInactive),
        Err(GateError::TosNotAccepted) => Some(DenialKind::TosNotAccepted),
        Ok(()) => match policy_decision(principal, operation, target) {
            Err(PolicyError::SudoRequired) => Some(DenialKind::SudoRequired),
            Ok(()) => None,
        },
    };

    let reason = match denial {
        Some(DenialKind::UserInactive) => {
            format!("'{operation}' requires an activated account")
        }
        Some(DenialKind::TosNotAccepted) => {
            format!("'{operation}' requires acceptance of the terms of service in force")
        }
        Some(DenialKind::SudoRequired) => {
            format!("'{operation}' on an activated account requires an elevated (sudo) token")
        }
        None if operation == Operation::Destroy && !target.is_activated() => {
            "account was never activated; deletion needs no elevation".to_string()
        }
        None => format!("'{operation}' has no unmet preconditions"),
    };

    tracing::debug!(
        user_id = %principal.user_id,
        %operation,
        granted = denial.is_none(),
        "authorization explained"
    );

    AuthorizationExplanation {
        user_id: principal.user_id,
        operation,
        elevated: principal.elevated,
        account: *target,
        granted: denial.is_none(),
        reason,
        denial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Activation, TosStatus};
    use crate::gate::check_account_gate;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    /// Collects the `message` of every event emitted while installed.
    #[derive(Clone, Default)]
    struct Messages(Arc<Mutex<Vec<String>>>);

    struct MessageVisitor<'a>(&'a mut String);

    impl Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn core::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Messages {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            if let Ok(mut messages) = self.0.lock() {
                messages.push(message);
            }
        }
    }

    fn logged<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
        let messages = Messages::default();
        let subscriber = tracing_subscriber::registry().with(messages.clone());
        let out = tracing::subscriber::with_default(subscriber, f);
        let lines = messages.0.lock().unwrap().clone();
        (out, lines)
    }

    fn active() -> AccountState {
        AccountState {
            activation: Activation::Active,
            tos: TosStatus::Accepted,
        }
    }

    fn inactive() -> AccountState {
        AccountState {
            activation: Activation::InactiveNew,
            tos: TosStatus::Pending,
        }
    }

    #[test]
    fn destroying_an_active_account_needs_sudo() {
        let plain = Principal::new(UserId::new(), false);
        let sudo = Principal::new(plain.user_id, true);

        assert_eq!(
            authorize(&plain, Operation::Destroy, &active()),
            Err(PolicyError::SudoRequired)
        );
        assert_eq!(authorize(&sudo, Operation::Destroy, &active()), Ok(()));
    }

    #[test]
    fn destroying_an_inactive_account_needs_no_sudo() {
        let plain = Principal::new(UserId::new(), false);
        assert_eq!(authorize(&plain, Operation::Destroy, &inactive()), Ok(()));
    }

    #[test]
    fn elevation_is_irrelevant_elsewhere() {
        let plain = Principal::new(UserId::new(), false);
        for op in [Operation::Show, Operation::Update, Operation::AcceptTos] {
            assert_eq!(authorize(&plain, op, &active()), Ok(()));
            assert_eq!(authorize(&plain, op, &inactive()), Ok(()));
        }
    }

    #[test]
    fn explanation_reports_gate_denials_before_policy() {
        let plain = Principal::new(UserId::new(), false);
        let explained = explain_authorization(&plain, Operation::Update, &inactive());

        assert!(!explained.granted);
        assert_eq!(explained.denial, Some(DenialKind::UserInactive));
    }

    #[test]
    fn explanation_serializes_for_audit() {
        let plain = Principal::new(UserId::new(), false);
        let explained = explain_authorization(&plain, Operation::Destroy, &active());

        let json = serde_json::to_value(&explained).unwrap();
        assert_eq!(json["operation"], "destroy");
        assert_eq!(json["denial"], "sudo_required");
        assert_eq!(json["account"]["activation"], "active");
        assert_eq!(json["granted"], false);
    }

    #[test]
    fn explaining_a_denial_does_not_log_it_as_a_request_denial() {
        let plain = Principal::new(UserId::new(), false);

        let (explained, lines) =
            logged(|| explain_authorization(&plain, Operation::Destroy, &active()));
        assert_eq!(explained.denial, Some(DenialKind::SudoRequired));
        assert_eq!(lines, vec!["authorization explained".to_string()]);

        let (_, lines) = logged(|| explain_authorization(&plain, Operation::Update, &inactive()));
        assert_eq!(lines, vec!["authorization explained".to_string()]);
    }

    #[test]
    fn request_path_denials_are_logged() {
        let plain = Principal::new(UserId::new(), false);

        let (outcome, lines) = logged(|| authorize(&plain, Operation::Destroy, &active()));
        assert_eq!(outcome, Err(PolicyError::SudoRequired));
        assert_eq!(lines, vec!["sudo token required".to_string()]);

        let (outcome, lines) =
            logged(|| check_account_gate(&plain, Operation::Update, &inactive()));
        assert_eq!(outcome, Err(GateError::UserInactive));
        assert_eq!(lines, vec!["account gate denied".to_string()]);
    }
}
