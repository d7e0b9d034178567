//! Lift capability trait and error types.
//!
//! This module defines:
//! - `Lifter` trait - one interface over every lift backend
//! - `LiftError` enum - errors surfaced by lift operations
//! - `ProtocolError` enum - wire frame decoding failures
//! - `SimulationFault` enum - unrecoverable faults of the physics model

use crate::config::ConfigError;
use crate::hal::types::{CommandOutcome, FloorSensor};
use std::time::Duration;
use thiserror::Error;

/// Wire frame decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// First byte is not a known opcode.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// Fewer (or more) bytes than one frame.
    #[error("frame must be {expected} bytes, got {actual}")]
    ShortFrame {
        /// Frame length required by the protocol.
        expected: usize,
        /// Bytes actually received.
        actual: usize,
    },

    /// Reply does not echo the opcode of the outstanding query.
    #[error("reply opcode {actual:#04x} does not match query opcode {expected:#04x}")]
    OpcodeMismatch {
        /// Opcode of the query in flight.
        expected: u8,
        /// Opcode found in the reply.
        actual: u8,
    },

    /// Payload byte outside its domain (e.g. direction byte `0x02`).
    #[error("invalid payload for opcode {opcode:#04x}: {reason}")]
    InvalidPayload {
        /// Opcode of the offending frame.
        opcode: u8,
        /// What was wrong.
        reason: String,
    },
}

/// Errors surfaced by lift operations.
#[derive(Debug, Error)]
pub enum LiftError {
    /// Invalid construction parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dialing the simulator failed.
    #[error("unable to connect to simulator at {addr}: {source}")]
    Connect {
        /// Endpoint that was dialed.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backend is not initialized, or its connection is gone.
    #[error("lift is not connected")]
    Disconnected,

    /// A query's reply did not arrive in time.
    #[error("no reply to opcode {opcode:#04x} within {waited:?}")]
    Timeout {
        /// Opcode of the query.
        opcode: u8,
        /// How long the caller waited.
        waited: Duration,
    },

    /// The peer sent bytes that do not form a valid frame.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Query arguments out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Socket failure after connection establishment.
    #[error("I/O error: {0}")]
    Io(String),

    /// Physical I/O binding failure.
    #[error("hardware error: {0}")]
    Hardware(String),
}

impl LiftError {
    /// Returns true if the connection or backend cannot be used afterwards.
    ///
    /// `InvalidArgument` only affects the call that produced it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LiftError::InvalidArgument(_))
    }
}

/// Unrecoverable faults of the simulated car.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationFault {
    /// Car travelled past an end of the shaft (end-of-track switch).
    #[error("car left the shaft at position {position:.3} (allowed {lower:.3}..={upper:.3})")]
    ShaftBoundViolation {
        /// Position after the offending tick.
        position: f64,
        /// Lowest allowed position including slack.
        lower: f64,
        /// Highest allowed position including slack.
        upper: f64,
    },
}

/// One interface over every lift backend.
///
/// Conventions:
///
/// | Value | Meaning |
/// |-------|---------|
/// | direction `-1 / 0 / 1` | down / stop / up |
/// | button `0 / 1 / 2` | hall up / hall down / cabin |
///
/// Fire operations never fail on bad arguments; they return
/// [`CommandOutcome::Ignored`] and do nothing. Queries with bad arguments
/// return [`LiftError::InvalidArgument`].
///
/// Every method may be called concurrently from several threads once
/// `init()` has returned.
pub trait Lifter: Send + Sync {
    /// Prepare the backend for use (open hardware, dial the simulator).
    fn init(&mut self) -> Result<(), LiftError>;

    /// Set the motor direction (`-1 / 0 / 1`).
    fn set_motor_direction(&self, direction: i32) -> Result<CommandOutcome, LiftError>;

    /// Switch an order button lamp.
    fn order_button_light(
        &self,
        button: i32,
        floor: i32,
        on: bool,
    ) -> Result<CommandOutcome, LiftError>;

    /// Show `floor` on the floor indicator.
    fn floor_indicator(&self, floor: i32) -> Result<CommandOutcome, LiftError>;

    /// Switch the door open lamp.
    fn door_light(&self, on: bool) -> Result<CommandOutcome, LiftError>;

    /// Switch the stop button lamp.
    fn stop_light(&self, on: bool) -> Result<CommandOutcome, LiftError>;

    /// Whether an order button is pressed.
    fn order_button(&self, button: i32, floor: i32) -> Result<bool, LiftError>;

    /// Read the floor sensors.
    fn floor_sensor(&self) -> Result<FloorSensor, LiftError>;

    /// Whether the stop button is pressed.
    fn stop_button(&self) -> Result<bool, LiftError>;

    /// Whether the obstruction switch is active.
    fn obstruction(&self) -> Result<bool, LiftError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::types::Direction;
    use std::sync::Mutex;

    /// Minimal in-memory backend exercising the trait contract.
    #[derive(Default)]
    struct RecordingLift {
        initialized: bool,
        direction: Mutex<Direction>,
    }

    impl Lifter for RecordingLift {
        fn init(&mut self) -> Result<(), LiftError> {
            self.initialized = true;
            Ok(())
        }

        fn set_motor_direction(&self, direction: i32) -> Result<CommandOutcome, LiftError> {
            let Some(direction) = Direction::from_i32(direction) else {
                return Ok(CommandOutcome::Ignored);
            };
            *self.direction.lock().unwrap() = direction;
            Ok(CommandOutcome::Applied)
        }

        fn order_button_light(&self, _: i32, _: i32, _: bool) -> Result<CommandOutcome, LiftError> {
            Ok(CommandOutcome::Applied)
        }

        fn floor_indicator(&self, _: i32) -> Result<CommandOutcome, LiftError> {
            Ok(CommandOutcome::Applied)
        }

        fn door_light(&self, _: bool) -> Result<CommandOutcome, LiftError> {
            Ok(CommandOutcome::Applied)
        }

        fn stop_light(&self, _: bool) -> Result<CommandOutcome, LiftError> {
            Ok(CommandOutcome::Applied)
        }

        fn order_button(&self, _: i32, _: i32) -> Result<bool, LiftError> {
            Ok(false)
        }

        fn floor_sensor(&self) -> Result<FloorSensor, LiftError> {
            Ok(FloorSensor::at(0))
        }

        fn stop_button(&self) -> Result<bool, LiftError> {
            Ok(false)
        }

        fn obstruction(&self) -> Result<bool, LiftError> {
            Ok(false)
        }
    }

    #[test]
    fn test_lifter_is_object_safe() {
        let mut lift: Box<dyn Lifter> = Box::new(RecordingLift::default());
        lift.init().unwrap();
        assert_eq!(lift.set_motor_direction(1).unwrap(), CommandOutcome::Applied);
        assert_eq!(lift.set_motor_direction(5).unwrap(), CommandOutcome::Ignored);
        assert_eq!(lift.floor_sensor().unwrap().floor(), Some(0));
    }

    #[test]
    fn test_lift_error_display() {
        let err = LiftError::Timeout {
            opcode: 7,
            waited: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("0x07"));
        assert!(err.to_string().contains("250ms"));

        let err = LiftError::from(ProtocolError::UnknownOpcode(0x2a));
        assert!(err.to_string().contains("0x2a"));
    }

    #[test]
    fn test_lift_error_is_fatal() {
        assert!(!LiftError::InvalidArgument("floor 12".to_string()).is_fatal());
        assert!(LiftError::Disconnected.is_fatal());
        let short = ProtocolError::ShortFrame {
            expected: 4,
            actual: 2,
        };
        assert!(LiftError::Protocol(short).is_fatal());
    }

    #[test]
    fn test_config_error_converts() {
        let err: LiftError = ConfigError::ValidationError("floors".to_string()).into();
        assert!(matches!(err, LiftError::Config(_)));
    }

    #[test]
    fn test_simulation_fault_display() {
        let fault = SimulationFault::ShaftBoundViolation {
            position: -0.75,
            lower: -0.5,
            upper: 4.5,
        };
        let text = fault.to_string();
        assert!(text.contains("-0.750"));
        assert!(text.contains("4.500"));
    }
}
