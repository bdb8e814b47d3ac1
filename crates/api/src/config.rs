//! Environment-driven configuration for the API binary.

use std::net::SocketAddr;

use chrono::{Duration, Utc};
use thiserror::Error;

use keygate_auth::DEFAULT_TOKEN_LIFETIME_SECS;
use keygate_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HS256 signing secret (`KEYGATE_JWT_SECRET`).
    pub jwt_secret: String,
    /// `KEYGATE_BIND_ADDR`, default `0.0.0.0:8080`.
    pub bind_addr: SocketAddr,
    /// Lifetime of tokens issued at registration (`KEYGATE_TOKEN_LIFETIME_SECS`).
    pub token_lifetime: Duration,
    /// Initial state of the registration flag (`KEYGATE_REGISTRATION_ENABLED`).
    pub registration_enabled: bool,
    /// `KEYGATE_LOG_FORMAT`: `json` or `pretty`.
    pub log_format: LogFormat,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("KEYGATE_JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("KEYGATE_JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let bind_addr = parse_or(&lookup, "KEYGATE_BIND_ADDR", || {
            SocketAddr::from(([0, 0, 0, 0], 8080))
        })?;

        let lifetime_secs: i64 = parse_or(&lookup, "KEYGATE_TOKEN_LIFETIME_SECS", || {
            DEFAULT_TOKEN_LIFETIME_SECS
        })?;
        if lifetime_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "KEYGATE_TOKEN_LIFETIME_SECS",
                reason: "must be positive".to_string(),
            });
        }
        // Tokens expire at issue time + lifetime; that instant must be representable.
        let token_lifetime = Duration::try_seconds(lifetime_secs)
            .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
            .ok_or(ConfigError::Invalid {
                var: "KEYGATE_TOKEN_LIFETIME_SECS",
                reason: "out of range".to_string(),
            })?;

        let registration_enabled = parse_or(&lookup, "KEYGATE_REGISTRATION_ENABLED", || true)?;
        let log_format = parse_or(&lookup, "KEYGATE_LOG_FORMAT", LogFormat::default)?;

        Ok(Self {
            jwt_secret,
            bind_addr,
            token_lifetime,
            registration_enabled,
            log_format,
        })
    }
}

fn parse_or<F, T, D>(lookup: &F, var: &'static str, default: D) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
    D: FnOnce() -> T,
{
    match lookup(var) {
        None => Ok(default()),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.token_lifetime, Duration::days(1));
        assert!(cfg.registration_enabled);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("KEYGATE_JWT_SECRET", "s3cret"),
            ("KEYGATE_BIND_ADDR", "127.0.0.1:9000"),
            ("KEYGATE_TOKEN_LIFETIME_SECS", "3600"),
            ("KEYGATE_REGISTRATION_ENABLED", "false"),
            ("KEYGATE_LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.token_lifetime, Duration::hours(1));
        assert!(!cfg.registration_enabled);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn malformed_values_are_errors_not_defaults() {
        let err = config(&[("KEYGATE_REGISTRATION_ENABLED", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "KEYGATE_REGISTRATION_ENABLED", .. }));

        let err = config(&[("KEYGATE_TOKEN_LIFETIME_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "KEYGATE_TOKEN_LIFETIME_SECS", .. }));

        // Parses as seconds, but expiry would land past the last representable date.
        let err = config(&[("KEYGATE_TOKEN_LIFETIME_SECS", "9000000000000")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "KEYGATE_TOKEN_LIFETIME_SECS",
                reason: "out of range".to_string(),
            }
        );
    }
}
