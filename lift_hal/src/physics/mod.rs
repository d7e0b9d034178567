//! Physics simulation module.
//!
//! This module provides the continuous-time model of the car and the
//! periodic tick thread driving it.

mod car;
mod engine;

pub use car::CarModel;
pub use engine::{PhysicsEngine, PhysicsHandle, TickStats};
