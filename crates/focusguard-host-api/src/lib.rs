//! Collaborator trait interfaces for focusguard
//!
//! This crate defines the seams between the session engine and everything
//! platform-specific: process scanning, desktop notifications, application
//! discovery and the presentation layer. It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
