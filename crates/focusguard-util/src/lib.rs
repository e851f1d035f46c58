//! Shared utilities for focusguard
//!
//! This crate provides:
//! - ID types (SessionId)
//! - Time utilities (monotonic time, countdown formatting)
//! - Default paths for the settings file and the persisted block list

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
