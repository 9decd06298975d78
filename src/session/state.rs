//! Session state machine
//!
//! `Disconnected -> ControlOpen -> Authenticated -> Configured -> Ready -> Closed`.
//! There is no way back from `Closed`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    ControlOpen,
    Authenticated,
    Configured,
    Ready,
    Closed,
}

impl SessionState {
    /// Whether the control channel may still be live in this state.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            SessionState::ControlOpen
                | SessionState::Authenticated
                | SessionState::Configured
                | SessionState::Ready
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::ControlOpen => "control-open",
            SessionState::Authenticated => "authenticated",
            SessionState::Configured => "configured",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
