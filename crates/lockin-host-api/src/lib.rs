//! Host collaborator interfaces for lockind
//!
//! This crate defines the boundary between the lockdown engine and the
//! outside world that enforces and times it: a rule sink that accepts
//! blocking rules, and a scheduler that fires named alarms. It contains no
//! platform code itself; mocks for tests live here too.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
