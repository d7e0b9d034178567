//! Physical lift backend.
//!
//! The lab lift is wired to a digital/analog I/O card. `HardwareLift` maps
//! every `Lifter` operation onto bit and analog channel accesses of an
//! [`IoBinding`]; the binding itself (the card driver) lives outside this
//! crate.
//!
//! # Channel map
//!
//! | Function | Channel |
//! |----------|---------|
//! | Motor speed (analog) | `0x100` |
//! | Motor direction (set = down) | `0x30F` |
//! | Stop lamp | `0x30E` |
//! | Door open lamp | `0x303` |
//! | Floor indicator (binary, 2 LEDs) | `0x300`, `0x301` |
//! | Floor sensors 1..4 | `0x204`..`0x207` |
//! | Stop button | `0x316` |
//! | Obstruction switch | `0x317` |

use lift_common::hal::driver::{LiftError, Lifter};
use lift_common::hal::types::{Button, CommandOutcome, Direction, FloorSensor, checked_floor};
use tracing::{debug, info};

/// Floors served by the lab lift.
pub const HW_FLOORS: u8 = 4;

/// Analog motor value while moving.
pub const MOTOR_SPEED: i32 = 2800;

pub const MOTOR: u16 = 0x100;
pub const MOTORDIR: u16 = 0x30F;
pub const LIGHT_STOP: u16 = 0x30E;
pub const LIGHT_DOOR_OPEN: u16 = 0x303;
pub const LIGHT_FLOOR_IND1: u16 = 0x300;
pub const LIGHT_FLOOR_IND2: u16 = 0x301;
pub const STOP: u16 = 0x316;
pub const OBSTRUCTION: u16 = 0x317;

/// Floor sensor channels, bottom to top.
pub const SENSOR_FLOOR: [u16; HW_FLOORS as usize] = [0x204, 0x205, 0x206, 0x207];

/// Order lamp channels, `[floor][button]`. No hall down lamp at the bottom,
/// no hall up lamp at the top.
pub const LAMP_CHANNELS: [[Option<u16>; 3]; HW_FLOORS as usize] = [
    [Some(0x309), None, Some(0x30D)],
    [Some(0x308), Some(0x307), Some(0x30C)],
    [Some(0x306), Some(0x305), Some(0x30B)],
    [None, Some(0x304), Some(0x30A)],
];

/// Order button channels, `[floor][button]`.
pub const BUTTON_CHANNELS: [[Option<u16>; 3]; HW_FLOORS as usize] = [
    [Some(0x311), None, Some(0x315)],
    [Some(0x310), Some(0x200), Some(0x314)],
    [Some(0x201), Some(0x202), Some(0x313)],
    [None, Some(0x203), Some(0x312)],
];

/// Access to the I/O card.
pub trait IoBinding: Send + Sync {
    /// Open the card.
    fn init(&mut self) -> Result<(), LiftError>;

    fn set_bit(&self, channel: u16) -> Result<(), LiftError>;

    fn clear_bit(&self, channel: u16) -> Result<(), LiftError>;

    fn read_bit(&self, channel: u16) -> Result<bool, LiftError>;

    fn write_analog(&self, channel: u16, value: i32) -> Result<(), LiftError>;
}

/// Lift driven through an [`IoBinding`].
#[derive(Debug)]
pub struct HardwareLift<B> {
    binding: B,
    initialized: bool,
}

impl<B: IoBinding> HardwareLift<B> {
    pub fn new(binding: B) -> Self {
        Self {
            binding,
            initialized: false,
        }
    }

    /// The underlying binding.
    pub fn binding(&self) -> &B {
        &self.binding
    }

    fn io(&self) -> Result<&B, LiftError> {
        if self.initialized {
            Ok(&self.binding)
        } else {
            Err(LiftError::Disconnected)
        }
    }

    fn write_bit(&self, channel: u16, on: bool) -> Result<(), LiftError> {
        if on {
            self.io()?.set_bit(channel)
        } else {
            self.io()?.clear_bit(channel)
        }
    }
}

impl<B: IoBinding> Lifter for HardwareLift<B> {
    fn init(&mut self) -> Result<(), LiftError> {
        info!("Initializing hardware lift ({} floors)", HW_FLOORS);
        self.binding.init()?;
        self.initialized = true;
        Ok(())
    }

    fn set_motor_direction(&self, direction: i32) -> Result<CommandOutcome, LiftError> {
        let Some(direction) = Direction::from_i32(direction) else {
            debug!("Ignoring motor direction {}", direction);
            return Ok(CommandOutcome::Ignored);
        };
        let io = self.io()?;
        match direction {
            Direction::Stop => io.write_analog(MOTOR, 0)?,
            Direction::Up => {
                io.clear_bit(MOTORDIR)?;
                io.write_analog(MOTOR, MOTOR_SPEED)?;
            }
            Direction::Down => {
                io.set_bit(MOTORDIR)?;
                io.write_analog(MOTOR, MOTOR_SPEED)?;
            }
        }
        Ok(CommandOutcome::Applied)
    }

    fn order_button_light(
        &self,
        button: i32,
        floor: i32,
        on: bool,
    ) -> Result<CommandOutcome, LiftError> {
        let channel = Button::from_index(button)
            .zip(checked_floor(floor, HW_FLOORS))
            .and_then(|(b, f)| LAMP_CHANNELS[usize::from(f)][b.index()]);
        let Some(channel) = channel else {
            debug!("Ignoring order button light {} at floor {}", button, floor);
            return Ok(CommandOutcome::Ignored);
        };
        self.write_bit(channel, on)?;
        Ok(CommandOutcome::Applied)
    }

    fn floor_indicator(&self, floor: i32) -> Result<CommandOutcome, LiftError> {
        let Some(floor) = checked_floor(floor, HW_FLOORS) else {
            debug!("Ignoring floor indicator {}", floor);
            return Ok(CommandOutcome::Ignored);
        };
        // Binary encoding; one LED pattern per floor.
        self.write_bit(LIGHT_FLOOR_IND1, floor & 0x02 != 0)?;
        self.write_bit(LIGHT_FLOOR_IND2, floor & 0x01 != 0)?;
        Ok(CommandOutcome::Applied)
    }

    fn door_light(&self, on: bool) -> Result<CommandOutcome, LiftError> {
        self.write_bit(LIGHT_DOOR_OPEN, on)?;
        Ok(CommandOutcome::Applied)
    }

    fn stop_light(&self, on: bool) -> Result<CommandOutcome, LiftError> {
        self.write_bit(LIGHT_STOP, on)?;
        Ok(CommandOutcome::Applied)
    }

    fn order_button(&self, button: i32, floor: i32) -> Result<bool, LiftError> {
        let Some(kind) = Button::from_index(button) else {
            return Err(LiftError::InvalidArgument(format!("button {button}")));
        };
        let Some(floor) = checked_floor(floor, HW_FLOORS) else {
            return Err(LiftError::InvalidArgument(format!(
                "floor {floor} (lift has {HW_FLOORS} floors)"
            )));
        };
        match BUTTON_CHANNELS[usize::from(floor)][kind.index()] {
            Some(channel) => self.io()?.read_bit(channel),
            // Buttons that do not exist are never pressed.
            None => Ok(false),
        }
    }

    fn floor_sensor(&self) -> Result<FloorSensor, LiftError> {
        let io = self.io()?;
        for (floor, channel) in SENSOR_FLOOR.iter().enumerate() {
            if io.read_bit(*channel)? {
                return Ok(FloorSensor::at(floor as u8));
            }
        }
        Ok(FloorSensor::between())
    }

    fn stop_button(&self) -> Result<bool, LiftError> {
        self.io()?.read_bit(STOP)
    }

    fn obstruction(&self) -> Result<bool, LiftError> {
        self.io()?.read_bit(OBSTRUCTION)
    }
}
