//! # Lift HAL Library
//!
//! Hardware abstraction for a single elevator car, with a simulator that
//! stands in for the real lift.
//!
//! Backends implement the `Lifter` trait defined in `lift_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`physics`] - car kinematics, floor sensor model, tick thread
//! - [`bridge`] - 4-byte wire protocol and the connection coordinator
//! - [`drivers`] - `SimLift` and `HardwareLift` backends
//! - [`panel`] - simulated lamps and buttons
//! - [`server`] - in-process simulator speaking the wire protocol
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────┐          ┌──────────────────────────────────┐
//! │   controller (any thread)  │          │          lift_sim / SimServer    │
//! │  ┌──────────────────────┐  │          │  ┌────────────┐   ┌───────────┐  │
//! │  │  dyn Lifter          │  │          │  │ connection │──►│  Panel    │  │
//! │  └─────────┬────────────┘  │          │  │  threads   │   └───────────┘  │
//! │            ▼               │   TCP    │  │            │   ┌───────────┐  │
//! │  ┌──────────────────────┐  │ 4-byte   │  │            │──►│ Physics   │◄─┼── tick
//! │  │ SimLift ─► Bridge    │◄─┼─frames──►│  └────────────┘   │ Engine    │  │
//! │  │  (coordinator thread)│  │          │                   └───────────┘  │
//! │  └──────────────────────┘  │          └──────────────────────────────────┘
//! └────────────────────────────┘
//! ```

pub mod bridge;
pub mod drivers;
pub mod panel;
pub mod physics;
pub mod server;

// Re-export key types for convenience
pub use crate::bridge::BridgeClient;
pub use crate::drivers::{HardwareLift, IoBinding, SimLift};
pub use crate::panel::Panel;
pub use crate::physics::{CarModel, PhysicsEngine, PhysicsHandle};
pub use crate::server::{SimHandle, SimServer};
