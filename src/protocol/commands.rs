//! Module `commands`
//!
//! Defines the FTP commands this client issues and how each one is rendered
//! onto the control channel.

use std::fmt;

use super::reply::LINE_TERMINATOR;

/// A command sent by the client on the control channel.
///
/// Commands taking a path keep it verbatim; an empty path renders the bare verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    USER(String), // Username for login
    PASS(String), // Password for login
    TYPE,         // TYPE I, 8-bit binary
    MODE,         // MODE S, stream mode
    STRU,         // STRU F, file structure
    LIST(String), // List a directory
    DELE(String), // Delete a file
    MKD(String),  // Make a directory
    RMD(String),  // Remove a directory
    STOR(String), // Store/upload file
    RETR(String), // Retrieve/download file
    QUIT,
    PASV, // Enter passive mode
}

impl Command {
    /// The command verb as it appears on the wire.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::USER(_) => "USER",
            Command::PASS(_) => "PASS",
            Command::TYPE => "TYPE",
            Command::MODE => "MODE",
            Command::STRU => "STRU",
            Command::LIST(_) => "LIST",
            Command::DELE(_) => "DELE",
            Command::MKD(_) => "MKD",
            Command::RMD(_) => "RMD",
            Command::STOR(_) => "STOR",
            Command::RETR(_) => "RETR",
            Command::QUIT => "QUIT",
            Command::PASV => "PASV",
        }
    }

    fn argument(&self) -> Option<&str> {
        match self {
            Command::USER(arg)
            | Command::PASS(arg)
            | Command::LIST(arg)
            | Command::DELE(arg)
            | Command::MKD(arg)
            | Command::RMD(arg)
            | Command::STOR(arg)
            | Command::RETR(arg) => Some(arg.as_str()).filter(|a| !a.is_empty()),
            Command::TYPE => Some("I"),
            Command::MODE => Some("S"),
            Command::STRU => Some("F"),
            Command::QUIT | Command::PASV => None,
        }
    }

    /// Renders the full command line including the line terminator.
    pub fn to_line(&self) -> String {
        match self.argument() {
            Some(arg) => format!("{} {}{}", self.verb(), arg, LINE_TERMINATOR),
            None => format!("{}{}", self.verb(), LINE_TERMINATOR),
        }
    }
}

/// Log-safe rendering: no terminator, password masked.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PASS(_) => write!(f, "PASS ****"),
            _ => match self.argument() {
                Some(arg) => write!(f, "{} {}", self.verb(), arg),
                None => f.write_str(self.verb()),
            },
        }
    }
}
