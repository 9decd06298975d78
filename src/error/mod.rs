//! Error handling
//!
//! Defines the error type shared by every layer of the FTP client.

pub mod types;

pub use types::*;
