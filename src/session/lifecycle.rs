//! Session lifecycle
//!
//! Sequences connect, login and session parameter negotiation over the
//! control channel, and tears everything down on `QUIT` or on the first
//! fatal error.

use log::{info, warn};

use crate::config::ClientConfig;
use crate::control::ControlChannel;
use crate::error::{FtpClientError, FtpResult};
use crate::middleware::{FtpEvent, SharedHook};
use crate::protocol::Command;
use crate::session::{ConnectionDescriptor, SessionState};

/// One login session against one server.
pub struct Session {
    descriptor: ConnectionDescriptor,
    config: ClientConfig,
    hook: SharedHook,
    control: Option<ControlChannel>,
    state: SessionState,
}

impl Session {
    pub fn new(descriptor: ConnectionDescriptor, config: ClientConfig, hook: SharedHook) -> Self {
        Self {
            descriptor,
            config,
            hook,
            control: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the control channel, logs in and configures the session.
    ///
    /// Any failure on the way closes the session for good.
    pub async fn connect(&mut self) -> FtpResult<()> {
        self.require(SessionState::Disconnected)?;
        let result = self.establish().await;
        self.settle(result).await
    }

    async fn establish(&mut self) -> FtpResult<()> {
        let (control, greeting) = ControlChannel::open(
            self.descriptor.host(),
            self.descriptor.port(),
            &self.config,
            self.hook.clone(),
        )
        .await?;
        info!(
            "Connected to {}:{} ({} {})",
            self.descriptor.host(),
            self.descriptor.port(),
            greeting.code(),
            greeting.message()
        );
        self.control = Some(control);
        self.transition(SessionState::ControlOpen);

        self.authenticate().await?;
        self.transition(SessionState::Authenticated);

        self.configure().await?;
        self.transition(SessionState::Configured);

        self.transition(SessionState::Ready);
        Ok(())
    }

    /// `USER`, then `PASS` only when a password was supplied.
    async fn authenticate(&mut self) -> FtpResult<()> {
        let user = Command::USER(self.descriptor.username().to_string());
        let pass = self
            .descriptor
            .password()
            .map(|p| Command::PASS(p.to_string()));

        let control = self.channel()?;
        control.send(&user).await?;
        if let Some(pass) = pass {
            control.send(&pass).await?;
        }
        Ok(())
    }

    /// Binary type, stream mode, file structure, in that order.
    async fn configure(&mut self) -> FtpResult<()> {
        let control = self.channel()?;
        for command in [Command::TYPE, Command::MODE, Command::STRU] {
            control.send(&command).await?;
        }
        Ok(())
    }

    /// Sends `QUIT` and closes the control socket whatever the reply was.
    ///
    /// A no-op when no control channel is open.
    pub async fn disconnect(&mut self) -> FtpResult<()> {
        let Some(control) = self.control.as_mut() else {
            return Ok(());
        };

        let result = control.send(&Command::QUIT).await;
        if let Err(e) = &result {
            warn!("QUIT to {} failed: {}", control.peer_addr(), e);
        }
        self.teardown().await;
        result.map(|_| ())
    }

    /// The control channel of a `Ready` session.
    pub(crate) fn control(&mut self) -> FtpResult<&mut ControlChannel> {
        self.require(SessionState::Ready)?;
        self.channel()
    }

    /// Passes `result` through, closing the session first if it is an error.
    /// State precondition errors leave the session untouched.
    pub(crate) async fn settle<T>(&mut self, result: FtpResult<T>) -> FtpResult<T> {
        match result {
            Err(e) if !matches!(e, FtpClientError::InvalidState { .. }) => {
                warn!("Session with {} aborted: {}", self.descriptor.host(), e);
                self.teardown().await;
                Err(e)
            }
            other => other,
        }
    }

    fn require(&self, expected: SessionState) -> FtpResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FtpClientError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn channel(&mut self) -> FtpResult<&mut ControlChannel> {
        self.control.as_mut().ok_or(FtpClientError::ConnectionClosed)
    }

    async fn teardown(&mut self) {
        if let Some(mut control) = self.control.take() {
            control.close().await;
        }
        self.transition(SessionState::Closed);
    }

    fn transition(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        self.hook.on_event(&FtpEvent::SessionStateChanged { from, to });
    }
}
