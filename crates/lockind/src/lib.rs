//! Request dispatch for lockind
//!
//! Turns protocol commands into engine calls and engine events into
//! protocol events. The binary wires this to the IPC server and alarms.

mod dispatch;

pub use dispatch::*;
