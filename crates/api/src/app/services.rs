use std::sync::Arc;

use keygate_auth::flags::REGISTRATION;
use keygate_auth::{AccountService, Hs256TokenCodec, InMemoryFeatureFlags, InMemoryUserStore};
use keygate_core::{Clock, SystemClock};

use crate::config::ApiConfig;

/// Everything the handlers need, shared across requests.
///
/// The concrete store and flag handles are kept alongside the service so
/// operators (and tests) can activate users, publish ToS versions, or flip
/// registration without going through HTTP.
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub users: Arc<InMemoryUserStore>,
    pub flags: Arc<InMemoryFeatureFlags>,
    pub clock: Arc<dyn Clock>,
}

impl AppServices {
    /// In-memory wiring for dev and black-box tests.
    pub fn in_memory(config: &ApiConfig) -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let flags = Arc::new(InMemoryFeatureFlags::default());
        if config.registration_enabled {
            flags.enable(REGISTRATION);
        }
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let accounts = AccountService::new(
            Arc::new(Hs256TokenCodec::new(config.jwt_secret.as_bytes())),
            users.clone(),
            flags.clone(),
            clock.clone(),
        )
        .with_session_lifetime(config.token_lifetime);

        Self {
            accounts: Arc::new(accounts),
            users,
            flags,
            clock,
        }
    }
}
