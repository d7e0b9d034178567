//! Simulated lift backend.
//!
//! `SimLift` talks to a lift simulator over the bridge. Arguments are
//! checked before anything goes on the wire: an invalid fire command is
//! reported as [`CommandOutcome::Ignored`] and sends nothing, an invalid
//! query fails with [`LiftError::InvalidArgument`].

use crate::bridge::{BridgeClient, Frame, Opcode};
use lift_common::hal::config::SimConfig;
use lift_common::hal::driver::{LiftError, Lifter, ProtocolError};
use lift_common::hal::types::{Button, CommandOutcome, Direction, FloorSensor, checked_floor};
use tracing::{debug, info};

/// Lift backed by the simulator.
#[derive(Debug)]
pub struct SimLift {
    config: SimConfig,
    client: Option<BridgeClient>,
}

impl SimLift {
    /// Create an unconnected lift; call [`Lifter::init`] to dial.
    pub fn new(config: SimConfig) -> Result<Self, LiftError> {
        config.validate()?;
        Ok(Self {
            config,
            client: None,
        })
    }

    /// Create and dial in one step.
    pub fn connect(config: SimConfig) -> Result<Self, LiftError> {
        let mut lift = Self::new(config)?;
        lift.init()?;
        Ok(lift)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(BridgeClient::is_connected)
    }

    fn client(&self) -> Result<&BridgeClient, LiftError> {
        self.client.as_ref().ok_or(LiftError::Disconnected)
    }

    fn fire(&self, frame: Frame) -> Result<CommandOutcome, LiftError> {
        self.client()?.fire(frame)?;
        Ok(CommandOutcome::Applied)
    }

    fn query_flag(&self, frame: Frame) -> Result<bool, LiftError> {
        Ok(self.client()?.query(frame)?.pressed())
    }

    fn floor(&self, floor: i32) -> Option<u8> {
        checked_floor(floor, self.config.num_floors)
    }
}

impl Lifter for SimLift {
    fn init(&mut self) -> Result<(), LiftError> {
        if self.is_connected() {
            debug!("Simulated lift already connected");
            return Ok(());
        }
        if self.client.take().is_some() {
            info!("Previous simulator connection is closed, dialing again");
        }
        let endpoint = self.config.endpoint();
        info!(
            "Initializing simulated lift ({} floors) at {}",
            self.config.num_floors, endpoint
        );
        self.client = Some(BridgeClient::connect(&endpoint, self.config.query_timeout)?);
        Ok(())
    }

    fn set_motor_direction(&self, direction: i32) -> Result<CommandOutcome, LiftError> {
        let Some(direction) = Direction::from_i32(direction) else {
            debug!("Ignoring motor direction {}", direction);
            return Ok(CommandOutcome::Ignored);
        };
        self.fire(Frame::motor_direction(direction))
    }

    fn order_button_light(
        &self,
        button: i32,
        floor: i32,
        on: bool,
    ) -> Result<CommandOutcome, LiftError> {
        let (Some(button), Some(floor)) = (Button::from_index(button), self.floor(floor)) else {
            debug!("Ignoring order button light {} at floor {}", button, floor);
            return Ok(CommandOutcome::Ignored);
        };
        self.fire(Frame::order_button_light(button, floor, on))
    }

    fn floor_indicator(&self, floor: i32) -> Result<CommandOutcome, LiftError> {
        let Some(floor) = self.floor(floor) else {
            debug!("Ignoring floor indicator {}", floor);
            return Ok(CommandOutcome::Ignored);
        };
        self.fire(Frame::floor_indicator(floor))
    }

    fn door_light(&self, on: bool) -> Result<CommandOutcome, LiftError> {
        self.fire(Frame::door_light(on))
    }

    fn stop_light(&self, on: bool) -> Result<CommandOutcome, LiftError> {
        self.fire(Frame::stop_light(on))
    }

    fn order_button(&self, button: i32, floor: i32) -> Result<bool, LiftError> {
        let Some(kind) = Button::from_index(button) else {
            return Err(LiftError::InvalidArgument(format!("button {button}")));
        };
        let Some(floor) = self.floor(floor) else {
            return Err(LiftError::InvalidArgument(format!(
                "floor {floor} (lift has {} floors)",
                self.config.num_floors
            )));
        };
        self.query_flag(Frame::order_button(kind, floor))
    }

    fn floor_sensor(&self) -> Result<FloorSensor, LiftError> {
        let sensor = self.client()?.query(Frame::floor_sensor())?.floor_sensor();
        match sensor.floor() {
            Some(floor) if floor >= self.config.num_floors => {
                Err(ProtocolError::InvalidPayload {
                    opcode: Opcode::FloorSensor.as_u8(),
                    reason: format!(
                        "floor {floor} reported by a lift with {} floors",
                        self.config.num_floors
                    ),
                }
                .into())
            }
            _ => Ok(sensor),
        }
    }

    fn stop_button(&self) -> Result<bool, LiftError> {
        self.query_flag(Frame::stop_button())
    }

    fn obstruction(&self) -> Result<bool, LiftError> {
        self.query_flag(Frame::obstruction())
    }
}
