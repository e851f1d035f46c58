//! Session state machine and enforcement loop for focusguard
//!
//! This crate is the heart of focusguard, containing:
//! - The block list
//! - Session state machine (Idle -> Running -> RunningLocked -> Idle)
//! - Two-step lock confirmation
//! - The enforcement loop that kills blocked processes once per tick
//! - Deadline enforcement using monotonic time

mod block_list;
mod enforcer;
mod engine;
mod events;
mod session;

pub use block_list::*;
pub use enforcer::*;
pub use engine::*;
pub use events::*;
pub use session::*;
