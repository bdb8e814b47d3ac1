//! Feature Flag Service interface.
//!
//! Only the registration entry point consults flags; authentication and
//! authorization decisions never do.

use std::collections::HashSet;
use std::sync::RwLock;

/// Flag gating new-account creation.
pub const REGISTRATION: &str = "registration";

pub trait FeatureFlags: Send + Sync {
    fn is_enabled(&self, flag: &str) -> bool;
}

/// In-memory flag set for tests/dev. Unknown flags are disabled.
#[derive(Debug, Default)]
pub struct InMemoryFeatureFlags {
    enabled: RwLock<HashSet<String>>,
}

impl InMemoryFeatureFlags {
    pub fn new<I, S>(enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: RwLock::new(enabled.into_iter().map(Into::into).collect()),
        }
    }

    pub fn enable(&self, flag: &str) {
        if let Ok(mut set) = self.enabled.write() {
            set.insert(flag.to_string());
        }
    }

    pub fn disable(&self, flag: &str) {
        if let Ok(mut set) = self.enabled.write() {
            set.remove(flag);
        }
    }
}

impl FeatureFlags for InMemoryFeatureFlags {
    fn is_enabled(&self, flag: &str) -> bool {
        self.enabled
            .read()
            .map(|set| set.contains(flag))
            .unwrap_or(false)
    }
}

impl<F> FeatureFlags for std::sync::Arc<F>
where
    F: FeatureFlags + ?Sized,
{
    fn is_enabled(&self, flag: &str) -> bool {
        (**self).is_enabled(flag)
    }
}
