//! FTP protocol vocabulary
//!
//! Command formatting for the control channel and decoding of the numeric
//! replies the server sends back.

pub mod commands;
pub mod reply;

pub use commands::Command;
pub use reply::{LINE_TERMINATOR, Reply, ReplySeverity, classify};
