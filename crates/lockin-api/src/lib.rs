//! Protocol types for lockind IPC
//!
//! This crate defines the stable API between lockind and clients:
//! - Domains and the block rule handed to the rule sink
//! - Commands (requests from clients)
//! - Responses
//! - Events (service -> clients)
//! - Versioning

mod commands;
mod domain;
mod events;
mod rules;
mod types;

pub use commands::*;
pub use domain::*;
pub use events::*;
pub use rules::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
