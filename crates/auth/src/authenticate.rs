//! Token Authenticator: raw bearer token → [`Principal`].
//!
//! Every call re-resolves the subject against the user store. There is no
//! token cache and no revocation list: deleting a user is what revokes its
//! outstanding tokens.

use std::sync::Arc;

use thiserror::Error;

use keygate_core::Clock;

use crate::principal::Principal;
use crate::store::{User, UserStore};
use crate::token::TokenCodec;

/// Single outward authentication failure.
///
/// Missing, malformed, expired, and unknown-subject tokens all collapse into
/// this value; the specific cause is only logged.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("unauthorized")]
pub struct Unauthorized;

/// A principal together with the user record it was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub principal: Principal,
    pub user: User,
}

#[derive(Clone)]
pub struct Authenticator {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(codec: Arc<dyn TokenCodec>, store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { codec, store, clock }
    }

    /// Resolve a raw token (or its absence) to a principal.
    pub fn authenticate(&self, raw_token: Option<&str>) -> Result<Principal, Unauthorized> {
        self.resolve(raw_token).map(|auth| auth.principal)
    }

    /// Like [`Authenticator::authenticate`], also returning the resolved user.
    pub fn resolve(&self, raw_token: Option<&str>) -> Result<Authenticated, Unauthorized> {
        let token = match raw_token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                tracing::debug!("authentication rejected: no token");
                return Err(Unauthorized);
            }
        };

        let claims = self.codec.decode(token).map_err(|e| {
            tracing::debug!(error = %e, "authentication rejected: undecodable token");
            Unauthorized
        })?;

        let now = self.clock.now();
        if claims.is_expired_at(now) {
            tracing::debug!(
                user_id = %claims.sub,
                expires_at = %claims.expires_at,
                "authentication rejected: token expired"
            );
            return Err(Unauthorized);
        }

        let user = self.store.find_user(claims.sub).ok_or_else(|| {
            tracing::debug!(user_id = %claims.sub, "authentication rejected: unknown subject");
            Unauthorized
        })?;

        Ok(Authenticated {
            principal: Principal::new(user.id, claims.elevated),
            user,
        })
    }
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryUserStore, NewUser};
    use crate::token::{Hs256TokenCodec, IssueOptions};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use keygate_core::{ManualClock, UserId};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
    }

    struct Fixture {
        codec: Arc<Hs256TokenCodec>,
        store: Arc<InMemoryUserStore>,
        clock: Arc<ManualClock>,
        authn: Authenticator,
        user: User,
    }

    fn fixture() -> Fixture {
        let codec = Arc::new(Hs256TokenCodec::new("authn-secret"));
        let store = Arc::new(InMemoryUserStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let user = store
            .create_user(
                NewUser {
                    username: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                    display_name: None,
                },
                t0(),
            )
            .unwrap();
        let authn = Authenticator::new(codec.clone(), store.clone(), clock.clone());
        Fixture {
            codec,
            store,
            clock,
            authn,
            user,
        }
    }

    impl Fixture {
        fn token(&self, options: IssueOptions) -> String {
            self.codec.issue(self.user.id, options, t0()).unwrap()
        }
    }

    #[test]
    fn valid_token_resolves_principal() {
        let fx = fixture();
        let token = fx.token(IssueOptions::default().elevated());

        let principal = fx.authn.authenticate(Some(&token)).unwrap();
        assert_eq!(principal, Principal::new(fx.user.id, true));
    }

    #[test]
    fn absent_or_empty_token_is_unauthorized() {
        let fx = fixture();
        assert_eq!(fx.authn.authenticate(None), Err(Unauthorized));
        assert_eq!(fx.authn.authenticate(Some("")), Err(Unauthorized));
        assert_eq!(fx.authn.authenticate(Some("   ")), Err(Unauthorized));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let fx = fixture();
        assert_eq!(fx.authn.authenticate(Some("not.a.jwt")), Err(Unauthorized));
    }

    #[test]
    fn token_is_rejected_exactly_at_expiry() {
        let fx = fixture();
        let token = fx.token(IssueOptions::default());

        fx.clock.set(t0() + Duration::seconds(86_399));
        assert!(fx.authn.authenticate(Some(&token)).is_ok());

        fx.clock.set(t0() + Duration::seconds(86_400));
        assert_eq!(fx.authn.authenticate(Some(&token)), Err(Unauthorized));
    }

    #[test]
    fn token_expired_a_day_ago_is_unauthorized() {
        let fx = fixture();
        let token = fx.token(IssueOptions::default().with_lifetime(Duration::days(-1)));
        assert_eq!(fx.authn.authenticate(Some(&token)), Err(Unauthorized));
    }

    #[test]
    fn deleting_the_user_invalidates_outstanding_tokens() {
        let fx = fixture();
        let token = fx.token(IssueOptions::default());
        assert!(fx.authn.authenticate(Some(&token)).is_ok());

        fx.store.delete_user(fx.user.id).unwrap();
        assert_eq!(fx.authn.authenticate(Some(&token)), Err(Unauthorized));
    }

    #[test]
    fn token_for_unknown_subject_is_unauthorized() {
        let fx = fixture();
        let token = fx
            .codec
            .issue(UserId::new(), IssueOptions::default(), t0())
            .unwrap();
        assert_eq!(fx.authn.authenticate(Some(&token)), Err(Unauthorized));
    }

    #[test]
    fn resolve_returns_the_current_user_record() {
        let fx = fixture();
        let token = fx.token(IssueOptions::default());
        fx.store.activate(fx.user.id, t0()).unwrap();

        let auth = fx.authn.resolve(Some(&token)).unwrap();
        assert!(auth.user.activated);
        assert!(!auth.principal.elevated);
    }
}
