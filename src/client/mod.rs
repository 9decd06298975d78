//! FTP client
//!
//! The user-facing transfer operations built on a session.

pub mod engine;

pub use engine::FtpClient;
