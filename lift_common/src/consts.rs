//! System-wide constants for the lift workspace.
//!
//! Single source of truth for numeric limits and defaults.
//! Imported by both crates; do not redefine these elsewhere.

/// Smallest number of floors a simulated lift may have.
pub const MIN_FLOORS: u8 = 2;

/// Largest number of floors a simulated lift may have.
pub const MAX_FLOORS: u8 = 9;

/// Default number of floors.
pub const DEFAULT_FLOORS: u8 = 4;

/// Default start floor of the car.
pub const DEFAULT_START_FLOOR: u8 = 0;

/// Lowest TCP port the simulator may listen on.
pub const MIN_COM_PORT: u16 = 1024;

/// Highest TCP port the simulator may listen on.
pub const MAX_COM_PORT: u16 = 65535;

/// Default simulator port.
pub const DEFAULT_COM_PORT: u16 = 15657;

/// Size of every message on the wire, in both directions.
pub const FRAME_LEN: usize = 4;

/// Number of order button kinds (hall up, hall down, cabin).
pub const BUTTON_KINDS: usize = 3;

/// Default physics tick period (100 Hz).
pub const DEFAULT_TICK_PERIOD_MS: u64 = 10;

/// Default travel time between two adjacent floors.
pub const DEFAULT_TRAVEL_TIME_BETWEEN_FLOORS_MS: u64 = 2000;

/// Default time spent inside the floor sensor range while passing a floor.
pub const DEFAULT_TRAVEL_TIME_PASSING_FLOORS_MS: u64 = 500;

/// Default time an order button reads as pressed after a press event.
pub const DEFAULT_BTN_DEPRESSED_TIME_MS: u64 = 200;

/// Default distance between two adjacent floors (distance units).
pub const DEFAULT_FLOOR_SPACING: f64 = 1.0;

/// Default distance the car may overshoot the shaft ends before faulting.
pub const DEFAULT_SLACK_MARGIN: f64 = 0.5;

/// Default bound on how long a query waits for its reply.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 1000;

/// Default simulator service name (logging).
pub const DEFAULT_SERVICE_NAME: &str = "lift-sim";
