//! Control channel
//!
//! The persistent command connection: one command line out, one reply in.

pub mod channel;

pub use channel::ControlChannel;
