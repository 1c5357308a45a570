//! Host collaborators for lockind
//!
//! Provides:
//! - A tokio-timer backed alarm scheduler
//! - A rule sink that publishes the installed rules as a JSON file for the
//!   enforcing filter to pick up

mod rule_file;
mod scheduler;

pub use rule_file::*;
pub use scheduler::*;
