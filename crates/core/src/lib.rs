//! `keygate-core` — foundation building blocks shared by the auth core and its adapters.
//!
//! This crate contains **pure** primitives (no storage, no transport).

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::UserId;
