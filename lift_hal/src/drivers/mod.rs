//! Lift backends.
//!
//! - [`simulated`] - talks to the lift simulator over the bridge
//! - [`hardware`] - drives the lab lift through an I/O card binding
//!
//! Both implement `Lifter` from `lift_common::hal::driver`.

pub mod hardware;
pub mod simulated;

pub use hardware::{HardwareLift, IoBinding};
pub use simulated::SimLift;
