//! Lockdown engine for lockind
//!
//! This crate is the heart of lockind, containing:
//! - The alias table and allow-list expander
//! - The rule compiler (expanded allow-list to one blocking rule)
//! - The unlock verifier (monotonic-prefix secret entry)
//! - The session state machine (Idle <-> Active) with persistence,
//!   rule installation and alarm scheduling at each transition

mod aliases;
mod allowlist;
mod engine;
mod events;
mod rules;
mod session;
mod unlock;

pub use aliases::*;
pub use allowlist::*;
pub use engine::*;
pub use events::*;
pub use rules::*;
pub use session::*;
pub use unlock::*;
