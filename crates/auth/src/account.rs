//! Account lifecycle state.
//!
//! Nothing here is stored: the store keeps two independent facts per user
//! (`activated`, accepted ToS version) and [`AccountState`] is derived from
//! them against the currently effective ToS.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the user completed activation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Active,
    InactiveNew,
}

/// The user's standing against the Terms of Service currently in force.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TosStatus {
    /// The effective version has been accepted.
    Accepted,
    /// A version is in effect and has not been accepted.
    Pending,
    /// No version is in effect yet, so there is nothing to accept.
    NotRequired,
}

/// Derived lifecycle state of one account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub activation: Activation,
    pub tos: TosStatus,
}

impl AccountState {
    /// Derive the state from the stored facts.
    ///
    /// `accepted_version` is the ToS version the user last accepted, `effective`
    /// is the version currently in force (if any).
    pub fn derive(
        activated: bool,
        accepted_version: Option<&str>,
        effective: Option<&TosVersion>,
    ) -> Self {
        let activation = if activated {
            Activation::Active
        } else {
            Activation::InactiveNew
        };

        let tos = match effective {
            None => TosStatus::NotRequired,
            Some(current) if accepted_version == Some(current.version.as_str()) => {
                TosStatus::Accepted
            }
            Some(_) => TosStatus::Pending,
        };

        Self { activation, tos }
    }

    pub fn is_activated(&self) -> bool {
        self.activation == Activation::Active
    }

    /// `true` when a ToS is in force and the user has not accepted it.
    pub fn tos_pending(&self) -> bool {
        self.tos == TosStatus::Pending
    }
}

/// A published Terms of Service version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TosVersion {
    pub version: String,
    pub effective_at: DateTime<Utc>,
}

impl TosVersion {
    pub fn new(version: impl Into<String>, effective_at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            effective_at,
        }
    }

    /// Only versions whose effective date has passed are enforceable.
    pub fn is_in_effect_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_at <= now
    }
}
