//! Passive mode negotiation
//!
//! Sends `PASV` and decodes the `(h1,h2,h3,h4,p1,p2)` sextet the server
//! advertises into a connectable endpoint.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::control::ControlChannel;
use crate::error::{FtpClientError, FtpResult};
use crate::protocol::Command;

/// Server-advertised data endpoint, valid for a single transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveEndpoint {
    host: String,
    port: u16,
}

impl PassiveEndpoint {
    /// Decodes the last closed parenthesized group of a PASV reply message.
    /// An unclosed `(` after the sextet is skipped.
    pub fn parse(message: &str) -> FtpResult<Self> {
        let parse_error = || FtpClientError::ProtocolParseError(message.to_string());
        let group = last_group(message).ok_or_else(parse_error)?;

        let octets = group
            .split(',')
            .map(|part| u8::from_str(part.trim()))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| parse_error())?;
        let [h1, h2, h3, h4, p1, p2] = octets[..] else {
            return Err(parse_error());
        };

        Ok(Self {
            host: format!("{h1}.{h2}.{h3}.{h4}"),
            port: (u16::from(p1) << 8) + u16::from(p2),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for PassiveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Contents of the last `(...)` group that has a closing parenthesis.
fn last_group(message: &str) -> Option<&str> {
    message.match_indices('(').rev().find_map(|(start, _)| {
        let inner = &message[start + 1..];
        inner.find(')').map(|end| &inner[..end])
    })
}

/// Issues `PASV` on the control channel and decodes the advertised endpoint.
pub async fn request_passive(control: &mut ControlChannel) -> FtpResult<PassiveEndpoint> {
    let reply = control.send(&Command::PASV).await?;
    let endpoint = PassiveEndpoint::parse(reply.message())?;
    debug!(
        "Server {} advertised passive endpoint {}",
        control.peer_addr(),
        endpoint
    );
    Ok(endpoint)
}
