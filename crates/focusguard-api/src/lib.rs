//! Shared value types for focusguard
//!
//! This crate defines the vocabulary passed between the session engine and
//! its collaborators:
//! - Session state and snapshots (engine -> presentation)
//! - User intents (presentation -> engine)

mod intents;
mod types;

pub use intents::*;
pub use types::*;
