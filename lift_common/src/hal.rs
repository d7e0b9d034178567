//! Hardware abstraction layer types shared by every lift backend.
//!
//! This module contains the capability trait implemented by the physical and
//! simulated backends, the value types flowing through it, the simulator
//! configuration and the error types.

pub mod config;
pub mod driver;
pub mod types;
