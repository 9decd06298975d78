//! Transfer module for the FTP client
//!
//! Passive-mode endpoint negotiation and the short-lived data connections
//! used by LIST, RETR and STOR.

pub mod data_channel;
pub mod passive;

pub use data_channel::DataChannel;
pub use passive::{PassiveEndpoint, request_passive};
