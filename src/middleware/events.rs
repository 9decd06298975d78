//! Event hook
//!
//! Structured notifications emitted by the control and data channels and by
//! session state changes. The default hook discards everything.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::session::SessionState;

/// Something observable happened on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpEvent {
    /// Command sent, rendered with the password masked.
    CommandSent(String),
    ReplyReceived { code: String, message: String },
    DataChannelOpened(SocketAddr),
    DataChannelClosed { bytes_read: u64, bytes_written: u64 },
    SessionStateChanged { from: SessionState, to: SessionState },
}

/// Receiver for [`FtpEvent`]s.
pub trait EventHook: Send + Sync {
    fn on_event(&self, event: &FtpEvent);
}

/// Hook that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl EventHook for NoopHook {
    fn on_event(&self, _event: &FtpEvent) {}
}

/// Hook handle shared between the components of one session.
pub type SharedHook = Arc<dyn EventHook>;

pub(crate) fn noop_hook() -> SharedHook {
    Arc::new(NoopHook)
}
