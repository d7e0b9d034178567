//! Simulated operator panel.
//!
//! The `Panel` holds everything on the simulator side that is not the car
//! itself:
//! - Lamps (order lamps per floor and button, floor indicator, door, stop)
//! - Order button presses, visible for `btn_depressed_time` after the press
//! - Stop button and obstruction switch

use lift_common::consts::BUTTON_KINDS;
use lift_common::hal::config::SimConfig;
use lift_common::hal::types::Button;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Point-in-time copy of the panel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    /// Order lamps, indexed `[floor][button]`
    pub order_lamps: Vec<[bool; BUTTON_KINDS]>,
    /// Floor shown on the indicator
    pub floor_indicator: u8,
    /// Door open lamp
    pub door_light: bool,
    /// Stop button lamp
    pub stop_light: bool,
    /// Stop button held
    pub stop_button: bool,
    /// Obstruction switch active
    pub obstruction: bool,
}

#[derive(Debug)]
struct PanelState {
    order_lamps: Vec<[bool; BUTTON_KINDS]>,
    /// Release time of the last press, per floor and button
    pressed_until: Vec<[Option<Instant>; BUTTON_KINDS]>,
    floor_indicator: u8,
    door_light: bool,
    stop_light: bool,
    stop_button: bool,
    obstruction: bool,
}

/// Lamp and button state shared by all connections.
#[derive(Debug)]
pub struct Panel {
    num_floors: u8,
    btn_depressed_time: Duration,
    state: Mutex<PanelState>,
}

impl Panel {
    /// Create a dark panel with nothing pressed.
    pub fn new(config: &SimConfig) -> Self {
        let floors = usize::from(config.num_floors);
        Self {
            num_floors: config.num_floors,
            btn_depressed_time: config.btn_depressed_time,
            state: Mutex::new(PanelState {
                order_lamps: vec![[false; BUTTON_KINDS]; floors],
                pressed_until: vec![[None; BUTTON_KINDS]; floors],
                floor_indicator: config.start_floor,
                door_light: false,
                stop_light: false,
                stop_button: false,
                obstruction: false,
            }),
        }
    }

    /// Number of floors served.
    pub fn num_floors(&self) -> u8 {
        self.num_floors
    }

    /// Switch an order lamp. Out of range floors are ignored.
    pub fn set_order_lamp(&self, button: Button, floor: u8, on: bool) {
        if floor >= self.num_floors {
            return;
        }
        self.state.lock().order_lamps[usize::from(floor)][button.index()] = on;
    }

    /// State of an order lamp.
    pub fn order_lamp(&self, button: Button, floor: u8) -> bool {
        if floor >= self.num_floors {
            return false;
        }
        self.state.lock().order_lamps[usize::from(floor)][button.index()]
    }

    /// Show a floor on the indicator. Out of range floors are ignored.
    pub fn set_floor_indicator(&self, floor: u8) {
        if floor >= self.num_floors {
            return;
        }
        self.state.lock().floor_indicator = floor;
    }

    pub fn floor_indicator(&self) -> u8 {
        self.state.lock().floor_indicator
    }

    pub fn set_door_light(&self, on: bool) {
        self.state.lock().door_light = on;
    }

    pub fn door_light(&self) -> bool {
        self.state.lock().door_light
    }

    pub fn set_stop_light(&self, on: bool) {
        self.state.lock().stop_light = on;
    }

    pub fn stop_light(&self) -> bool {
        self.state.lock().stop_light
    }

    /// Press an order button now.
    ///
    /// The button reads as pressed for `btn_depressed_time`. Pressing again
    /// restarts the window.
    pub fn press_order_button(&self, button: Button, floor: u8) {
        self.press_order_button_at(button, floor, Instant::now());
    }

    /// Press an order button at a given instant.
    pub fn press_order_button_at(&self, button: Button, floor: u8, now: Instant) {
        if floor >= self.num_floors {
            return;
        }
        debug!("Order button {:?} pressed at floor {}", button, floor);
        self.state.lock().pressed_until[usize::from(floor)][button.index()] =
            Some(now + self.btn_depressed_time);
    }

    /// Whether an order button currently reads as pressed.
    pub fn order_button(&self, button: Button, floor: u8) -> bool {
        self.order_button_at(button, floor, Instant::now())
    }

    /// Whether an order button reads as pressed at `now`.
    pub fn order_button_at(&self, button: Button, floor: u8, now: Instant) -> bool {
        if floor >= self.num_floors {
            return false;
        }
        let state = self.state.lock();
        state.pressed_until[usize::from(floor)][button.index()]
            .is_some_and(|until| now < until)
    }

    /// Hold or release the stop button.
    pub fn set_stop_button(&self, pressed: bool) {
        debug!("Stop button {}", if pressed { "pressed" } else { "released" });
        self.state.lock().stop_button = pressed;
    }

    pub fn stop_button(&self) -> bool {
        self.state.lock().stop_button
    }

    /// Toggle the obstruction switch.
    pub fn set_obstruction(&self, active: bool) {
        debug!("Obstruction {}", if active { "on" } else { "off" });
        self.state.lock().obstruction = active;
    }

    pub fn obstruction(&self) -> bool {
        self.state.lock().obstruction
    }

    /// Copy the whole panel state.
    pub fn snapshot(&self) -> PanelSnapshot {
        let state = self.state.lock();
        PanelSnapshot {
            order_lamps: state.order_lamps.clone(),
            floor_indicator: state.floor_indicator,
            door_light: state.door_light,
            stop_light: state.stop_light,
            stop_button: state.stop_button,
            obstruction: state.obstruction,
        }
    }
}
