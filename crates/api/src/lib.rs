//! HTTP adapter over the keygate auth core.

pub mod app;
pub mod config;
pub mod middleware;
