//! Protocol bridge to the lift simulator.
//!
//! - `frame` - 4-byte wire frames and replies
//! - `coordinator` - the thread owning the socket
//! - `client` - dialing and the caller-facing API

pub mod client;
pub mod coordinator;
pub mod frame;

pub use client::BridgeClient;
pub use coordinator::CoordinatorHandle;
pub use frame::{Frame, FrameClass, Opcode, Reply};
