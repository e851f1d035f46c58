//! The focusguard service
//!
//! Wires the session engine to its collaborators and runs the single
//! event loop that owns all session state. The console front end lives
//! here as well.

mod console;
mod service;
mod startup;

pub use console::*;
pub use service::*;
pub use startup::*;
