//! Prelude module for common re-exports.
//!
//! ```rust
//! use lift_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::hal::config::{SimConfig, SimConfigBuilder, SimFileConfig, SimSection};

// ─── Lift interface ─────────────────────────────────────────────────
pub use crate::hal::driver::{LiftError, Lifter, ProtocolError, SimulationFault};
pub use crate::hal::types::{Button, CommandOutcome, Direction, FloorSensor};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{FRAME_LEN, MAX_FLOORS, MIN_FLOORS};
