//! Linux host integration for focusguard
//!
//! Provides:
//! - Process enumeration and SIGKILL of blocked applications
//! - Desktop notifications via `notify-send`
//! - Discovery of installed (`.desktop`) and running applications

mod catalog;
mod notify;
mod scanner;

pub use catalog::*;
pub use notify::*;
pub use scanner::*;
