//! RAX FTP Client
//!
//! A passive-mode FTP client: control channel framing, reply classification,
//! PASV endpoint negotiation and the transfer operations built on them.

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod session;
pub mod transfer;

pub use client::FtpClient;
pub use config::ClientConfig;
pub use error::{FtpClientError, FtpResult};
pub use session::{ConnectionDescriptor, SessionState};
