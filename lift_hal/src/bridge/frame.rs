//! Wire frames of the simulator protocol.
//!
//! Every message is exactly four bytes, in both directions:
//!
//! ```text
//! ┌────────┬──────────┬──────────┬──────────┐
//! │ opcode │ payload0 │ payload1 │ payload2 │
//! └────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Unused payload bytes are zero. Only query frames are answered; a reply
//! echoes the query opcode in byte 0.

use lift_common::consts::FRAME_LEN;
use lift_common::hal::driver::ProtocolError;
use lift_common::hal::types::{Button, Direction, FloorSensor};

/// Whether a frame expects a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// One-way command, never answered.
    Fire,
    /// Request followed by exactly one 4-byte reply.
    Query,
}

/// Protocol opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    MotorDirection = 1,
    OrderButtonLight = 2,
    FloorIndicator = 3,
    DoorLight = 4,
    StopLight = 5,
    OrderButton = 6,
    FloorSensor = 7,
    StopButton = 8,
    Obstruction = 9,
}

impl Opcode {
    /// Decode an opcode byte.
    pub fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        Ok(match byte {
            1 => Opcode::MotorDirection,
            2 => Opcode::OrderButtonLight,
            3 => Opcode::FloorIndicator,
            4 => Opcode::DoorLight,
            5 => Opcode::StopLight,
            6 => Opcode::OrderButton,
            7 => Opcode::FloorSensor,
            8 => Opcode::StopButton,
            9 => Opcode::Obstruction,
            other => return Err(ProtocolError::UnknownOpcode(other)),
        })
    }

    /// Opcode byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Fire or query.
    pub fn class(self) -> FrameClass {
        match self {
            Opcode::MotorDirection
            | Opcode::OrderButtonLight
            | Opcode::FloorIndicator
            | Opcode::DoorLight
            | Opcode::StopLight => FrameClass::Fire,
            Opcode::OrderButton
            | Opcode::FloorSensor
            | Opcode::StopButton
            | Opcode::Obstruction => FrameClass::Query,
        }
    }
}

/// One request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub opcode: Opcode,
    pub payload: [u8; 3],
}

impl Frame {
    pub fn new(opcode: Opcode, payload: [u8; 3]) -> Self {
        Self { opcode, payload }
    }

    pub fn motor_direction(direction: Direction) -> Self {
        Self::new(Opcode::MotorDirection, [direction.to_wire(), 0, 0])
    }

    pub fn order_button_light(button: Button, floor: u8, on: bool) -> Self {
        Self::new(
            Opcode::OrderButtonLight,
            [button.index() as u8, floor, u8::from(on)],
        )
    }

    pub fn floor_indicator(floor: u8) -> Self {
        Self::new(Opcode::FloorIndicator, [floor, 0, 0])
    }

    pub fn door_light(on: bool) -> Self {
        Self::new(Opcode::DoorLight, [u8::from(on), 0, 0])
    }

    pub fn stop_light(on: bool) -> Self {
        Self::new(Opcode::StopLight, [u8::from(on), 0, 0])
    }

    pub fn order_button(button: Button, floor: u8) -> Self {
        Self::new(Opcode::OrderButton, [button.index() as u8, floor, 0])
    }

    pub fn floor_sensor() -> Self {
        Self::new(Opcode::FloorSensor, [0; 3])
    }

    pub fn stop_button() -> Self {
        Self::new(Opcode::StopButton, [0; 3])
    }

    pub fn obstruction() -> Self {
        Self::new(Opcode::Obstruction, [0; 3])
    }

    /// Fire or query.
    pub fn class(&self) -> FrameClass {
        self.opcode.class()
    }

    /// Serialize to the 4 wire bytes.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let [a, b, c] = self.payload;
        [self.opcode.as_u8(), a, b, c]
    }

    /// Parse 4 wire bytes.
    ///
    /// Rejects any length other than [`FRAME_LEN`] and unknown opcodes.
    /// Payload bytes are not interpreted here.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| ProtocolError::ShortFrame {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self {
            opcode: Opcode::from_u8(bytes[0])?,
            payload: [bytes[1], bytes[2], bytes[3]],
        })
    }

    /// Direction carried by a motor direction frame.
    pub fn direction(&self) -> Result<Direction, ProtocolError> {
        Direction::from_wire(self.payload[0]).ok_or_else(|| ProtocolError::InvalidPayload {
            opcode: self.opcode.as_u8(),
            reason: format!("direction byte {:#04x}", self.payload[0]),
        })
    }

    /// Button carried in payload byte 0.
    pub fn button(&self) -> Result<Button, ProtocolError> {
        Button::from_index(i32::from(self.payload[0])).ok_or_else(|| {
            ProtocolError::InvalidPayload {
                opcode: self.opcode.as_u8(),
                reason: format!("button index {}", self.payload[0]),
            }
        })
    }
}

/// One reply to a query frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    bytes: [u8; FRAME_LEN],
}

impl Reply {
    /// Build a reply echoing `opcode`.
    pub fn new(opcode: Opcode, payload: [u8; 3]) -> Self {
        let [a, b, c] = payload;
        Self {
            bytes: [opcode.as_u8(), a, b, c],
        }
    }

    /// Boolean reply (`1` / `0` in byte 1).
    pub fn flag(opcode: Opcode, value: bool) -> Self {
        Self::new(opcode, [u8::from(value), 0, 0])
    }

    /// Floor sensor reply: byte 1 in-floor flag, byte 2 floor.
    pub fn sensor(sensor: FloorSensor) -> Self {
        match sensor.floor() {
            Some(floor) => Self::new(Opcode::FloorSensor, [1, floor, 0]),
            None => Self::new(Opcode::FloorSensor, [0; 3]),
        }
    }

    /// Take exactly [`FRAME_LEN`] received bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| ProtocolError::ShortFrame {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Opcode byte echoed by the peer.
    pub fn opcode_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Verify the reply answers a query with `expected` opcode.
    pub fn check_echo(&self, expected: Opcode) -> Result<(), ProtocolError> {
        if self.bytes[0] != expected.as_u8() {
            return Err(ProtocolError::OpcodeMismatch {
                expected: expected.as_u8(),
                actual: self.bytes[0],
            });
        }
        Ok(())
    }

    /// Byte 1 equals 1.
    pub fn pressed(&self) -> bool {
        self.bytes[1] == 1
    }

    /// Byte 1 non-zero means in floor, byte 2 carries the floor.
    pub fn floor_sensor(&self) -> FloorSensor {
        if self.bytes[1] != 0 {
            FloorSensor::at(self.bytes[2])
        } else {
            FloorSensor::between()
        }
    }
}
