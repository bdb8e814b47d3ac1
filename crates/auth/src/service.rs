//! Account operations wired through the auth core.
//!
//! Each operation runs authenticate → account gate → elevation policy and
//! only then calls into the user store, so a denied request never mutates
//! anything.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use keygate_core::{Clock, UserId};

use crate::authenticate::{Authenticator, Unauthorized};
use crate::authorize::{AuthorizationExplanation, authorize, explain_authorization};
use crate::error::AccountError;
use crate::flags::{self, FeatureFlags};
use crate::gate::{Operation, check_account_gate};
use crate::principal::Principal;
use crate::store::{NewUser, ProfileChanges, User, UserStore};
use crate::token::{DEFAULT_TOKEN_LIFETIME_SECS, IssueOptions, TokenCodec};

/// Result of a successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn UserStore>,
    flags: Arc<dyn FeatureFlags>,
    clock: Arc<dyn Clock>,
    authenticator: Authenticator,
    session_lifetime: Duration,
}

impl AccountService {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn UserStore>,
        flags: Arc<dyn FeatureFlags>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let authenticator = Authenticator::new(codec.clone(), store.clone(), clock.clone());
        Self {
            codec,
            store,
            flags,
            clock,
            authenticator,
            session_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }

    /// Lifetime of tokens handed out at registration.
    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    pub fn issue_token(&self, user_id: UserId, options: IssueOptions) -> Result<String, AccountError> {
        Ok(self.codec.issue(user_id, options, self.clock.now())?)
    }

    pub fn authenticate(&self, raw_token: Option<&str>) -> Result<Principal, Unauthorized> {
        self.authenticator.authenticate(raw_token)
    }

    /// Read the principal's own profile. Permitted in every account state.
    pub fn show(&self, principal: &Principal) -> Result<User, AccountError> {
        self.admit(principal, Operation::Show)
    }

    pub fn update(&self, principal: &Principal, changes: ProfileChanges) -> Result<User, AccountError> {
        let user = self.admit(principal, Operation::Update)?;
        Ok(self.store.update_profile(user.id, changes, self.clock.now())?)
    }

    pub fn destroy(&self, principal: &Principal) -> Result<(), AccountError> {
        let user = self.admit(principal, Operation::Destroy)?;
        self.store.delete_user(user.id)?;
        tracing::info!(user_id = %user.id, elevated = principal.elevated, "account deleted");
        Ok(())
    }

    /// Accept the ToS in force. Accepting twice is a successful no-op.
    pub fn accept_tos(&self, principal: &Principal) -> Result<User, AccountError> {
        let user = self.admit(principal, Operation::AcceptTos)?;
        Ok(self.store.accept_tos(user.id, self.clock.now())?)
    }

    /// Create an (inactive) account and hand back a non-elevated session token.
    pub fn register(&self, new_user: NewUser) -> Result<Registration, AccountError> {
        if !self.flags.is_enabled(flags::REGISTRATION) {
            tracing::debug!("registration rejected: flag disabled");
            return Err(AccountError::RegistrationDisabled);
        }

        let user = self.store.create_user(new_user, self.clock.now())?;
        let token = self.issue_token(
            user.id,
            IssueOptions::default().with_lifetime(self.session_lifetime),
        )?;
        tracing::info!(user_id = %user.id, "account registered");

        Ok(Registration { user, token })
    }

    /// Explain what the gate and policy would decide for `operation`.
    pub fn explain(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> Result<AuthorizationExplanation, AccountError> {
        let user = self.find(principal)?;
        let state = self.store.account_state(&user, self.clock.now());
        Ok(explain_authorization(principal, operation, &state))
    }

    fn admit(&self, principal: &Principal, operation: Operation) -> Result<User, AccountError> {
        let user = self.find(principal)?;
        let state = self.store.account_state(&user, self.clock.now());
        check_account_gate(principal, operation, &state)?;
        authorize(principal, operation, &state)?;
        Ok(user)
    }

    fn find(&self, principal: &Principal) -> Result<User, AccountError> {
        self.store
            .find_user(principal.user_id)
            .ok_or(AccountError::Unauthorized)
    }
}

impl core::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountService")
            .field("session_lifetime", &self.session_lifetime)
            .finish_non_exhaustive()
    }
}
