use serde::Serialize;

use keygate_core::UserId;

/// An authenticated identity, resolved from a token on every request.
///
/// `elevated` is carried over from the token's `sudo` claim and only matters to
/// the authorization policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub elevated: bool,
}

impl Principal {
    pub fn new(user_id: UserId, elevated: bool) -> Self {
        Self { user_id, elevated }
    }
}
