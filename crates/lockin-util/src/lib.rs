//! Shared utilities for lockind
//!
//! This crate provides:
//! - ID types (ClientId) and the per-session unlock secret
//! - Time utilities (mockable wall clock, epoch-millisecond conversion)
//! - Error types
//! - Rate limiting helpers
//! - Default paths for socket, data, and config files

mod error;
mod ids;
mod paths;
mod rate_limit;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
