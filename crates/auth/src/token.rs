//! Signed, time-bound bearer tokens (HS256 JWT).
//!
//! The codec only signs and verifies. Expiry is *not* checked here: the
//! authenticator compares `expires_at` against its own clock so the boundary is
//! exact and free of library leeway.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keygate_core::UserId;

/// Default token lifetime: one day.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Claims carried by every token.
///
/// Times travel as whole unix seconds (`iat`/`exp`), so a decoded token has
/// exactly the instants it was issued with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Elevated ("sudo") token. Absent on the wire means `false`.
    #[serde(rename = "sudo", default)]
    pub elevated: bool,
}

impl TokenClaims {
    /// A token is expired from `expires_at` onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Per-token issuance options.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IssueOptions {
    pub elevated: bool,
    pub lifetime: Duration,
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            elevated: false,
            lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

impl IssueOptions {
    /// Mark the token as elevated ("sudo").
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Override the lifetime. Negative lifetimes produce already-expired tokens.
    /// Must be whole seconds, otherwise issuing fails with
    /// [`TokenError::FractionalLifetime`].
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be encoded: {0}")]
    Encode(String),

    #[error("token lifetime is outside the representable time range")]
    LifetimeOutOfRange,

    /// Token times are whole seconds; a sub-second lifetime would not survive
    /// the wire.
    #[error("token lifetime must be a whole number of seconds")]
    FractionalLifetime,

    /// Malformed, unsigned, or signature mismatch. Callers treat this exactly
    /// like an absent token.
    #[error("token could not be decoded: {0}")]
    Decode(String),
}

/// Token Codec contract.
pub trait TokenCodec: Send + Sync {
    fn issue(
        &self,
        subject: UserId,
        options: IssueOptions,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError>;

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

/// HMAC-SHA256 JWT codec keyed by a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(
        &self,
        subject: UserId,
        options: IssueOptions,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if options.lifetime.subsec_nanos() != 0 {
            return Err(TokenError::FractionalLifetime);
        }

        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(options.lifetime)
            .ok_or(TokenError::LifetimeOutOfRange)?;

        let claims = TokenClaims {
            sub: subject,
            issued_at,
            expires_at,
            elevated: options.elevated,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Decode(e.to_string()))
    }
}

impl<C> TokenCodec for std::sync::Arc<C>
where
    C: TokenCodec + ?Sized,
{
    fn issue(
        &self,
        subject: UserId,
        options: IssueOptions,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        (**self).issue(subject, options, now)
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        (**self).decode(token)
    }
}
