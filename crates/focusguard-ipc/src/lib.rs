//! Single-instance coordination for focusguard
//!
//! Provides:
//! - Ownership of a well-known loopback TCP port by the first instance
//! - A `RAISE` message sent by later instances before they exit
//! - A listener that turns received `RAISE` messages into raise signals

mod client;
mod server;

pub use client::*;
pub use server::*;

use std::time::Duration;
use thiserror::Error;

/// Payload a second instance sends to the primary
pub const RAISE_MESSAGE: &[u8] = b"RAISE";

/// Most bytes read from one coordination connection
pub const MAX_MESSAGE_LEN: usize = 1024;

/// IPC errors
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Coordination port {port} is unavailable: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

pub type IpcResult<T> = Result<T, IpcError>;
