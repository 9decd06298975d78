//! Reply decoding
//!
//! A reply line is `<code> <message>`. The code's leading digit decides the
//! severity, and anything other than a success-class reply ends the session.

use crate::error::{FtpClientError, FtpResult};

/// Terminator for every line written to the control channel.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Severity bucket derived from the first digit of a reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySeverity {
    /// 1xx, 2xx and 3xx: accepted, completed, or more input needed.
    Success,
    /// 4xx, 5xx and 6xx.
    Failure,
    /// Non-digit lead, or a digit outside 1..=6.
    Malformed,
}

/// Classifies a reply code by its first character.
pub fn classify(code: &str) -> ReplySeverity {
    match code.chars().next().and_then(|c| c.to_digit(10)) {
        Some(1..=3) => ReplySeverity::Success,
        Some(4..=6) => ReplySeverity::Failure,
        _ => ReplySeverity::Malformed,
    }
}

/// One decoded server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: String,
    message: String,
    lines: Vec<String>,
}

impl Reply {
    /// Splits a raw line on whitespace: the first token is the code, the rest
    /// is rejoined with single spaces and loses one trailing period.
    pub fn parse(raw: &str) -> FtpResult<Self> {
        let mut tokens = raw.split_whitespace();
        let code = tokens
            .next()
            .ok_or_else(|| FtpClientError::MalformedReply(raw.to_string()))?;
        let message = tokens.collect::<Vec<_>>().join(" ");
        let message = message.strip_suffix('.').unwrap_or(&message).to_string();

        Ok(Self {
            code: code.to_string(),
            message,
            lines: Vec::new(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Continuation lines of a multi-line reply, without the final line.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn severity(&self) -> ReplySeverity {
        classify(&self.code)
    }

    /// A 1xx reply: the command was accepted and a completion reply follows.
    pub fn is_preliminary(&self) -> bool {
        self.code.starts_with('1')
    }

    /// Turns failure-class and malformed replies into their fatal error.
    pub fn ensure_success(self) -> FtpResult<Self> {
        match self.severity() {
            ReplySeverity::Success => Ok(self),
            ReplySeverity::Failure => Err(FtpClientError::ProtocolFailure {
                code: self.code,
                message: self.message,
            }),
            ReplySeverity::Malformed => Err(FtpClientError::UnrecognizedCode {
                code: self.code,
                message: self.message,
            }),
        }
    }
}
