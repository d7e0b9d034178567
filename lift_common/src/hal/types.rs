//! Lift value types and the input validation layer.
//!
//! The `Lifter` surface keeps the integer conventions of the hardware
//! driver (`-1/0/1` for direction, `0/1/2` for buttons). This module maps
//! those integers onto typed values. Anything that does not map is not an
//! error: the operation becomes [`CommandOutcome::Ignored`], mirroring the
//! permissive behaviour of the physical driver.

use crate::consts::BUTTON_KINDS;

/// Direction of car travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Moving towards floor 0.
    Down,
    /// Motor off.
    #[default]
    Stop,
    /// Moving towards the top floor.
    Up,
}

impl Direction {
    /// Map the `-1/0/1` convention onto a direction.
    ///
    /// Returns `None` for any other value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Direction::Down),
            0 => Some(Direction::Stop),
            1 => Some(Direction::Up),
            _ => None,
        }
    }

    /// Signed unit value of the direction.
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Down => -1,
            Direction::Stop => 0,
            Direction::Up => 1,
        }
    }

    /// Signed unit value as a float, for kinematics.
    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i32())
    }

    /// Wire encoding: `0x01` up, `0x00` stop, `0xFF` (-1 as `i8`) down.
    pub fn to_wire(self) -> u8 {
        self.as_i32() as i8 as u8
    }

    /// Decode the wire encoding.
    pub fn from_wire(byte: u8) -> Option<Self> {
        Self::from_i32(i32::from(byte as i8))
    }
}

/// Order button kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Hall call, going up.
    HallUp,
    /// Hall call, going down.
    HallDown,
    /// Call from inside the cabin.
    Cab,
}

impl Button {
    /// All button kinds in index order.
    pub const ALL: [Button; BUTTON_KINDS] = [Button::HallUp, Button::HallDown, Button::Cab];

    /// Map the `0/1/2` convention onto a button.
    pub fn from_index(value: i32) -> Option<Self> {
        match value {
            0 => Some(Button::HallUp),
            1 => Some(Button::HallDown),
            2 => Some(Button::Cab),
            _ => None,
        }
    }

    /// Index of the button (`0/1/2`).
    pub fn index(self) -> usize {
        match self {
            Button::HallUp => 0,
            Button::HallDown => 1,
            Button::Cab => 2,
        }
    }
}

/// Floor sensor reading.
///
/// The floor is only meaningful while the car is inside an in-floor band,
/// so it is carried as an `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloorSensor {
    floor: Option<u8>,
}

impl FloorSensor {
    /// Car is inside the band of `floor`.
    pub fn at(floor: u8) -> Self {
        Self { floor: Some(floor) }
    }

    /// Car is between floors.
    pub fn between() -> Self {
        Self { floor: None }
    }

    /// Whether any floor sensor is active.
    pub fn in_floor(&self) -> bool {
        self.floor.is_some()
    }

    /// Active floor, if any.
    pub fn floor(&self) -> Option<u8> {
        self.floor
    }
}

/// Result of a fire-class operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command was accepted and forwarded.
    Applied,
    /// The arguments were out of range; nothing was done.
    Ignored,
}

impl CommandOutcome {
    /// Whether the command was forwarded.
    pub fn is_applied(self) -> bool {
        self == CommandOutcome::Applied
    }
}

/// Validate a floor index against the floor count.
pub fn checked_floor(floor: i32, num_floors: u8) -> Option<u8> {
    u8::try_from(floor).ok().filter(|f| *f < num_floors)
}
