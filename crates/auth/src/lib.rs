//! `keygate-auth` — pure authentication/authorization core.
//!
//! This crate is intentionally decoupled from HTTP. Storage and feature flags
//! are consumed through the [`UserStore`] and [`FeatureFlags`] traits.
//!
//! Request flow: raw token → [`Authenticator`] → [`check_account_gate`] →
//! [`authorize`] → store mutation.

pub mod account;
pub mod authenticate;
pub mod authorize;
pub mod error;
pub mod flags;
pub mod gate;
pub mod principal;
pub mod service;
pub mod store;
pub mod token;

pub use account::{AccountState, Activation, TosStatus, TosVersion};
pub use authenticate::{Authenticated, Authenticator, Unauthorized};
pub use authorize::{AuthorizationExplanation, DenialKind, PolicyError, authorize, explain_authorization};
pub use error::AccountError;
pub use flags::{FeatureFlags, InMemoryFeatureFlags};
pub use gate::{GateError, Operation, check_account_gate};
pub use principal::Principal;
pub use service::{AccountService, Registration};
pub use store::{InMemoryUserStore, NewUser, ProfileChanges, StoreError, User, UserStore};
pub use token::{DEFAULT_TOKEN_LIFETIME_SECS, Hs256TokenCodec, IssueOptions, TokenClaims, TokenCodec, TokenError};
