//! Module `channel`
//!
//! Owns the control socket of a session. Every method takes `&mut self`, so
//! only one command can ever be outstanding on a channel.

use std::future::Future;
use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ClientConfig;
use crate::error::{FtpClientError, FtpResult};
use crate::middleware::logging::{log_command, log_connection, log_reply};
use crate::middleware::{FtpEvent, SharedHook};
use crate::protocol::{Command, Reply};

/// Persistent command connection to an FTP server.
pub struct ControlChannel {
    stream: Option<BufReader<TcpStream>>,
    peer: SocketAddr,
    config: ClientConfig,
    hook: SharedHook,
}

impl ControlChannel {
    /// Connects to the server and consumes its greeting.
    ///
    /// # Arguments
    ///
    /// * `host` - Server hostname or IP address.
    /// * `port` - Control port, usually 21.
    /// * `config` - Timeouts and the reply line limit for this channel.
    /// * `hook` - Event sink shared with the rest of the session.
    ///
    /// # Returns
    ///
    /// * `Ok((ControlChannel, Reply))` - The open channel and the greeting.
    /// * `Err(FtpClientError)` - Connect failure, timeout, or a greeting that
    ///   is not success-class.
    ///
    /// # Behavior
    ///
    /// A failure-class greeting (e.g. `421`) closes the socket before the
    /// error is returned.
    pub async fn open(
        host: &str,
        port: u16,
        config: &ClientConfig,
        hook: SharedHook,
    ) -> FtpResult<(Self, Reply)> {
        let stream = timeout(config.connect_timeout(), TcpStream::connect((host, port)))
            .await
            .map_err(|_| FtpClientError::Timeout {
                stage: "control connect",
            })??;
        let peer = stream.peer_addr()?;
        log_connection(&peer);

        let mut channel = Self {
            stream: Some(BufReader::new(stream)),
            peer,
            config: config.clone(),
            hook,
        };

        match channel.receive().await {
            Ok(greeting) => Ok((channel, greeting)),
            Err(e) => {
                channel.close().await;
                Err(e)
            }
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn hook(&self) -> SharedHook {
        self.hook.clone()
    }

    /// Writes one command line and reads its reply.
    ///
    /// # Arguments
    ///
    /// * `command` - The command to render and send, terminated by CRLF.
    ///
    /// # Returns
    ///
    /// * `Ok(Reply)` - A success-class (1xx, 2xx or 3xx) reply.
    /// * `Err(FtpClientError::ProtocolFailure)` - A 4xx, 5xx or 6xx reply.
    /// * `Err(FtpClientError::UnrecognizedCode)` - Any other leading digit.
    /// * `Err(FtpClientError::MalformedReply)` - A blank or over-long line.
    ///
    /// # Behavior
    ///
    /// Write and read each run under the command timeout. The channel is
    /// borrowed mutably, so a second command cannot start before this
    /// reply has been read.
    pub async fn send(&mut self, command: &Command) -> FtpResult<Reply> {
        log_command(&self.peer, command);
        self.hook.on_event(&FtpEvent::CommandSent(command.to_string()));

        let line = command.to_line();
        let limit = self.config.command_timeout();
        let stream = self.stream_mut()?;
        with_timeout(limit, "command write", async {
            stream.get_mut().write_all(line.as_bytes()).await?;
            stream.get_mut().flush().await?;
            Ok::<(), FtpClientError>(())
        })
        .await?;

        self.receive().await
    }

    /// Reads the next reply without sending anything. Used for greetings and
    /// for completion replies that follow a preliminary `1xx`.
    pub async fn receive(&mut self) -> FtpResult<Reply> {
        let limit = self.config.command_timeout();
        let reply = with_timeout(limit, "reply", self.read_reply()).await?;

        log_reply(&self.peer, &reply);
        self.hook.on_event(&FtpEvent::ReplyReceived {
            code: reply.code().to_string(),
            message: reply.message().to_string(),
        });

        reply.ensure_success()
    }

    /// Shuts down the control socket. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.get_mut().shutdown().await {
                debug!("Shutdown of control channel to {} failed: {}", self.peer, e);
            }
            info!("Control channel to {} closed", self.peer);
        }
    }

    fn stream_mut(&mut self) -> FtpResult<&mut BufReader<TcpStream>> {
        self.stream.as_mut().ok_or(FtpClientError::ConnectionClosed)
    }

    async fn read_reply(&mut self) -> FtpResult<Reply> {
        let first = self.read_line().await?;

        let Some(code) = multi_line_code(&first) else {
            return Reply::parse(&first);
        };

        let mut lines = vec![first.trim_end().to_string()];
        loop {
            let line = self.read_line().await?;
            if is_final_line(&line, &code) {
                return Ok(Reply::parse(&line)?.with_lines(lines));
            }
            lines.push(line.trim_end().to_string());
        }
    }

    async fn read_line(&mut self) -> FtpResult<String> {
        let max = self.config.max_reply_line;
        let stream = self.stream_mut()?;

        let mut raw = Vec::new();
        let n = (&mut *stream)
            .take(max as u64)
            .read_until(b'\n', &mut raw)
            .await?;
        if n == 0 {
            return Err(FtpClientError::ConnectionClosed);
        }
        // servers echo paths in whatever encoding they store them in
        let line = String::from_utf8_lossy(&raw).into_owned();
        if !line.ends_with('\n') {
            if n >= max {
                return Err(FtpClientError::MalformedReply(format!(
                    "reply line exceeds {max} bytes"
                )));
            }
            warn!("Reply from {} ended without a line terminator", self.peer);
        }
        Ok(line)
    }
}

/// `ddd-` opens a multi-line reply; returns its code.
fn multi_line_code(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    if bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b'-' {
        Some(line[..3].to_string())
    } else {
        None
    }
}

/// `ddd ` (or a bare `ddd`) with the opening code closes a multi-line reply.
fn is_final_line(line: &str, code: &str) -> bool {
    let line = line.trim_end();
    line.starts_with(code) && matches!(line.as_bytes().get(3), None | Some(b' '))
}

async fn with_timeout<T, F>(limit: std::time::Duration, stage: &'static str, fut: F) -> FtpResult<T>
where
    F: Future<Output = FtpResult<T>>,
{
    timeout(limit, fut)
        .await
        .map_err(|_| FtpClientError::Timeout { stage })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_multi_line_opening() {
        assert_eq!(multi_line_code("220-Welcome\r\n").as_deref(), Some("220"));
        assert_eq!(multi_line_code("220 Welcome\r\n"), None);
        assert_eq!(multi_line_code("ab0-x\r\n"), None);
    }

    #[test]
    fn detects_multi_line_end() {
        assert!(is_final_line("220 Ready\r\n", "220"));
        assert!(is_final_line("220\r\n", "220"));
        assert!(!is_final_line("220-still going\r\n", "220"));
        assert!(!is_final_line(" 220 indented\r\n", "220"));
    }
}
