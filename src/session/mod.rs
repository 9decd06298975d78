//! Session management
//!
//! Connection parameters, the per-session state machine, and the
//! connect/authenticate/configure/disconnect sequence.

pub mod descriptor;
pub mod lifecycle;
pub mod state;

pub use descriptor::ConnectionDescriptor;
pub use lifecycle::Session;
pub use state::SessionState;
