//! Module `engine`
//!
//! `FtpClient` exposes list, retrieve, store, delete, make/remove directory
//! and quit. Data-bearing operations negotiate a passive endpoint, open the
//! data channel, and only then send the command that starts the transfer.

use std::ops::AsyncFnOnce;
use std::sync::Arc;

use log::{debug, warn};

use crate::config::ClientConfig;
use crate::error::FtpResult;
use crate::middleware::EventHook;
use crate::middleware::events::noop_hook;
use crate::protocol::{Command, Reply};
use crate::session::{ConnectionDescriptor, Session, SessionState};
use crate::transfer::{DataChannel, request_passive};

/// A single FTP session and the operations available on it.
///
/// Every operation needs the `Ready` state. A fatal reply or transport error
/// closes the session; subsequent calls fail with a state error.
pub struct FtpClient {
    session: Session,
}

impl FtpClient {
    /// Creates a disconnected client.
    pub fn new(descriptor: ConnectionDescriptor, config: ClientConfig) -> Self {
        Self {
            session: Session::new(descriptor, config, noop_hook()),
        }
    }

    /// Creates a disconnected client reporting to `hook`.
    pub fn with_hook(
        descriptor: ConnectionDescriptor,
        config: ClientConfig,
        hook: Arc<dyn EventHook>,
    ) -> Self {
        Self {
            session: Session::new(descriptor, config, hook),
        }
    }

    /// Connects and returns a `Ready` client.
    pub async fn open(descriptor: ConnectionDescriptor, config: ClientConfig) -> FtpResult<Self> {
        let mut client = Self::new(descriptor, config);
        client.connect().await?;
        Ok(client)
    }

    /// Connects, runs `body` on the ready client, then sends `QUIT`.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Server and login to use.
    /// * `config` - Client timeouts and limits.
    /// * `body` - Async closure performing the session's operations.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The body's value, once `QUIT` succeeded too.
    /// * `Err(FtpClientError)` - A connect failure, the body's error, or a
    ///   failing `QUIT` after a successful body.
    ///
    /// # Behavior
    ///
    /// `QUIT` runs on every path after connect. When the body fails, its
    /// error wins over a failing `QUIT`.
    pub async fn with_session<T>(
        descriptor: ConnectionDescriptor,
        config: ClientConfig,
        body: impl AsyncFnOnce(&mut FtpClient) -> FtpResult<T>,
    ) -> FtpResult<T> {
        let mut client = Self::open(descriptor, config).await?;
        let result = body(&mut client).await;
        let quit = client.quit().await;

        match (result, quit) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), quit) => {
                if let Err(quit_err) = quit {
                    debug!("QUIT after failed session body also failed: {}", quit_err);
                }
                Err(e)
            }
        }
    }

    pub async fn connect(&mut self) -> FtpResult<()> {
        self.session.connect().await
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Whether a control connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        self.session.descriptor()
    }

    /// `LIST`: returns the raw listing text.
    pub async fn list(&mut self, path: Option<&str>) -> FtpResult<String> {
        let command = Command::LIST(self.resolve_path(path));
        let data = self.read_transfer(command).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// `RETR`: returns the file contents.
    pub async fn retrieve(&mut self, path: Option<&str>) -> FtpResult<Vec<u8>> {
        let command = Command::RETR(self.resolve_path(path));
        self.read_transfer(command).await
    }

    /// `STOR`: uploads `data`.
    pub async fn store(&mut self, path: Option<&str>, data: &[u8]) -> FtpResult<()> {
        let command = Command::STOR(self.resolve_path(path));
        let result = self.write_transfer(command, data).await;
        self.session.settle(result).await
    }

    /// `DELE`
    pub async fn delete(&mut self, path: Option<&str>) -> FtpResult<Reply> {
        let command = Command::DELE(self.resolve_path(path));
        self.simple_command(command).await
    }

    /// `MKD`
    pub async fn make_directory(&mut self, path: Option<&str>) -> FtpResult<Reply> {
        let command = Command::MKD(self.resolve_path(path));
        self.simple_command(command).await
    }

    /// `RMD`
    pub async fn remove_directory(&mut self, path: Option<&str>) -> FtpResult<Reply> {
        let command = Command::RMD(self.resolve_path(path));
        self.simple_command(command).await
    }

    /// `QUIT`, then the control socket is closed regardless of the reply.
    pub async fn quit(&mut self) -> FtpResult<()> {
        self.session.disconnect().await
    }

    fn resolve_path(&self, path: Option<&str>) -> String {
        path.unwrap_or(self.session.descriptor().default_path()).to_string()
    }

    async fn simple_command(&mut self, command: Command) -> FtpResult<Reply> {
        let result = match self.session.control() {
            Ok(control) => control.send(&command).await,
            Err(e) => Err(e),
        };
        self.session.settle(result).await
    }

    async fn read_transfer(&mut self, command: Command) -> FtpResult<Vec<u8>> {
        let result = self.try_read_transfer(command).await;
        self.session.settle(result).await
    }

    async fn try_read_transfer(&mut self, command: Command) -> FtpResult<Vec<u8>> {
        let control = self.session.control()?;
        let endpoint = request_passive(control).await?;
        let mut data_channel =
            DataChannel::open(&endpoint, control.config(), control.hook()).await?;

        let reply = control.send(&command).await?;
        let data = data_channel.read_to_end().await?;
        drop(data_channel);

        if reply.is_preliminary() {
            control.receive().await?;
        }
        debug!("{} transferred {} bytes", command.verb(), data.len());
        Ok(data)
    }

    async fn write_transfer(&mut self, command: Command, data: &[u8]) -> FtpResult<()> {
        let control = self.session.control()?;
        let endpoint = request_passive(control).await?;
        let mut data_channel =
            DataChannel::open(&endpoint, control.config(), control.hook()).await?;

        let reply = control.send(&command).await?;
        data_channel.write_all(data).await?;
        data_channel.close().await?;

        if reply.is_preliminary() {
            control.receive().await?;
        } else {
            warn!(
                "{} completed with {} before the upload finished",
                command.verb(),
                reply.code()
            );
        }
        Ok(())
    }
}
