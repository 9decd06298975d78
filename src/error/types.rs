//! Error types
//!
//! Every failure is fatal for the session that produced it. Callers receive
//! the variant together with the offending reply code and server text.

use std::io;

use thiserror::Error;

use crate::session::SessionState;

/// Convenience alias used throughout the crate.
pub type FtpResult<T> = Result<T, FtpClientError>;

#[derive(Debug, Error)]
pub enum FtpClientError {
    /// Transport level connect/read/write failure.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// The server closed the control channel while a reply was expected.
    #[error("control connection closed by server")]
    ConnectionClosed,

    #[error("timed out during {stage}")]
    Timeout { stage: &'static str },

    /// A control line could not be decoded into a code and message.
    #[error("malformed reply: {0:?}")]
    MalformedReply(String),

    /// Reply with a 4xx, 5xx or 6xx code.
    #[error("FTP ERROR: {code} {message}")]
    ProtocolFailure { code: String, message: String },

    /// Reply whose leading digit is outside 1..=6.
    #[error("FTP ERROR: code {code} is not recognized ({message})")]
    UnrecognizedCode { code: String, message: String },

    /// The PASV reply did not carry a usable address sextet.
    #[error("cannot parse passive address: {0}")]
    ProtocolParseError(String),

    #[error("operation requires {expected:?} session, current state is {actual:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("invalid FTP url: {0}")]
    InvalidUrl(String),
}

impl FtpClientError {
    /// Server reply code carried by the error, if the error came from a reply.
    pub fn reply_code(&self) -> Option<&str> {
        match self {
            FtpClientError::ProtocolFailure { code, .. }
            | FtpClientError::UnrecognizedCode { code, .. } => Some(code),
            _ => None,
        }
    }
}
