//! Client middleware
//!
//! Logging helpers and the pluggable event hook every component reports to.

pub mod events;
pub mod logging;

pub use events::{EventHook, FtpEvent, NoopHook, SharedHook};
