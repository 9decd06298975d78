//! Logging middleware
//!
//! Control channel traffic logging.

use std::net::SocketAddr;

use log::{debug, info};

use crate::protocol::{Command, Reply};

/// Log a control connection being established
pub fn log_connection(server: &SocketAddr) {
    info!("Control channel connected to {}", server);
}

/// Log a command sent to the server
pub fn log_command(server: &SocketAddr, command: &Command) {
    debug!("[{}] >>> {}", server, command);
}

/// Log a reply received from the server
pub fn log_reply(server: &SocketAddr, reply: &Reply) {
    for line in reply.lines() {
        debug!("[{}] <<< {}", server, line);
    }
    debug!("[{}] <<< {} {}", server, reply.code(), reply.message());
}
