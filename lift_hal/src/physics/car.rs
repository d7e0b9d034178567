//! Car kinematics and floor sensor model.
//!
//! The `CarModel` integrates the vertical position of the car at constant
//! speed and derives the discrete floor sensor reading from it:
//!
//! ```text
//!  position
//!     ▲
//!  3s ┤ ── top of shaft (num_floors × spacing) ──
//!     │   ▒▒▒ band
//!     │                floor 2 cell [2s, 3s)
//!     │   ▒▒▒ band
//!  2s ┤ ─────────────
//!     │   ▒▒▒ band
//!     │                floor 1 cell [s, 2s)
//!     │   ▒▒▒ band
//!   s ┤ ─────────────
//!     │   ...
//!   0 ┤ ── floor 0 ──
//! ```
//!
//! The band reaches `in_floor_threshold` into the cell from both of its
//! edges. Leaving the shaft by more than `slack_margin` latches a fault.

use lift_common::hal::config::SimConfig;
use lift_common::hal::driver::SimulationFault;
use lift_common::hal::types::{CommandOutcome, Direction, FloorSensor};
use std::time::Duration;
use tracing::{debug, trace};

/// State of the simulated car.
#[derive(Debug, Clone)]
pub struct CarModel {
    /// Height above floor 0
    position: f64,
    /// Current motor direction
    direction: Direction,
    /// Number of floors
    floor_count: u8,
    /// Distance between floors
    floor_spacing: f64,
    /// Travel speed, distance per second
    speed: f64,
    /// Half-width of the in-floor band
    in_floor_threshold: f64,
    /// Overshoot allowed past the shaft ends
    slack_margin: f64,
    /// Latched once a shaft violation was reported
    faulted: bool,
}

impl CarModel {
    /// Create a car resting at the configured start floor.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            position: f64::from(config.start_floor) * config.floor_spacing,
            direction: Direction::Stop,
            floor_count: config.num_floors,
            floor_spacing: config.floor_spacing,
            speed: config.speed(),
            in_floor_threshold: config.in_floor_threshold(),
            slack_margin: config.slack_margin,
            faulted: false,
        }
    }

    /// Set the motor direction from the `-1/0/1` convention.
    ///
    /// Any other value leaves the direction untouched and returns
    /// [`CommandOutcome::Ignored`]. The new direction is applied by the
    /// next `tick`.
    pub fn set_direction(&mut self, direction: i32) -> CommandOutcome {
        let Some(direction) = Direction::from_i32(direction) else {
            debug!("Ignoring invalid motor direction {}", direction);
            return CommandOutcome::Ignored;
        };
        if direction != self.direction {
            debug!("Motor direction {:?} -> {:?}", self.direction, direction);
        }
        self.direction = direction;
        CommandOutcome::Applied
    }

    /// Advance the car by `dt`.
    ///
    /// Returns the shaft violation exactly once; afterwards the model is
    /// frozen and further ticks do nothing.
    pub fn tick(&mut self, dt: Duration) -> Result<(), SimulationFault> {
        if self.faulted {
            return Ok(());
        }

        self.position += self.direction.as_f64() * self.speed * dt.as_secs_f64();
        trace!("Car: pos={:.4}, dir={:?}", self.position, self.direction);

        let (lower, upper) = self.bounds();
        if self.position > upper || self.position < lower {
            self.faulted = true;
            return Err(SimulationFault::ShaftBoundViolation {
                position: self.position,
                lower,
                upper,
            });
        }
        Ok(())
    }

    /// Read the floor sensors.
    ///
    /// In floor when the distance into the current cell lies within
    /// `in_floor_threshold` of either cell edge, both edges inclusive. The
    /// floor is the cell index, `floor(position / spacing)`.
    pub fn floor_sensor(&self) -> FloorSensor {
        let distance = self.position.rem_euclid(self.floor_spacing);
        let in_band = distance <= self.in_floor_threshold
            || distance >= self.floor_spacing - self.in_floor_threshold;
        if !in_band {
            return FloorSensor::between();
        }

        let cell = (self.position / self.floor_spacing).floor();
        if cell < 0.0 || cell >= f64::from(self.floor_count) {
            // Only reachable inside the slack window past a shaft end.
            return FloorSensor::between();
        }
        FloorSensor::at(cell as u8)
    }

    /// Lowest and highest position allowed before a fault.
    pub fn bounds(&self) -> (f64, f64) {
        (-self.slack_margin, self.shaft_height() + self.slack_margin)
    }

    /// Height of the shaft.
    pub fn shaft_height(&self) -> f64 {
        f64::from(self.floor_count) * self.floor_spacing
    }

    /// Current position.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Place the car (start floor placement, tests).
    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    /// Current motor direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Travel speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether a shaft violation has been reported.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4 floors, spacing 1.0, speed 1.0/s, band ±0.25.
    fn make_config() -> SimConfig {
        SimConfig::builder()
            .num_floors(4)
            .unwrap()
            .floor_spacing(1.0)
            .unwrap()
            .travel_time_between_floors(Duration::from_secs(1))
            .unwrap()
            .travel_time_passing_floors(Duration::from_millis(500))
            .unwrap()
            .slack_margin(0.5)
            .unwrap()
            .build()
            .unwrap()
    }

    fn car_at(position: f64) -> CarModel {
        let mut car = CarModel::new(&make_config());
        car.set_position(position);
        car
    }

    #[test]
    fn test_starts_at_start_floor() {
        let config = make_config()
            .into_builder()
            .start_floor(2)
            .unwrap()
            .build()
            .unwrap();
        let car = CarModel::new(&config);
        assert!((car.position() - 2.0).abs() < 1e-12);
        assert_eq!(car.direction(), Direction::Stop);
        assert_eq!(car.floor_sensor(), FloorSensor::at(2));
    }

    #[test]
    fn test_tick_moves_by_direction_speed_dt() {
        let dt = Duration::from_millis(10);
        for d in [-1, 0, 1] {
            let mut car = car_at(1.5);
            assert_eq!(car.set_direction(d), CommandOutcome::Applied);
            car.tick(dt).unwrap();
            let expected = 1.5 + f64::from(d) * car.speed() * dt.as_secs_f64();
            assert!((car.position() - expected).abs() < 1e-12, "direction {d}");
        }
    }

    #[test]
    fn test_invalid_direction_is_noop() {
        let mut car = car_at(1.5);
        car.set_direction(1);
        for d in [2, -2, 100, i32::MIN] {
            assert_eq!(car.set_direction(d), CommandOutcome::Ignored);
            assert_eq!(car.direction(), Direction::Up);
        }

        let mut idle = car_at(1.5);
        assert_eq!(idle.set_direction(7), CommandOutcome::Ignored);
        idle.tick(Duration::from_millis(10)).unwrap();
        assert!((idle.position() - 1.5).abs() < 1e-12);
        assert_eq!(idle.direction(), Direction::Stop);
    }

    #[test]
    fn test_direction_applies_on_next_tick() {
        let mut car = car_at(1.5);
        car.set_direction(1);
        // No implicit motion until tick.
        assert!((car.position() - 1.5).abs() < 1e-12);
        car.tick(Duration::from_millis(100)).unwrap();
        assert!(car.position() > 1.5);
    }

    #[test]
    fn test_floor_sensor_band_edges_are_closed() {
        // Exactly on the band edges: in floor.
        assert_eq!(car_at(1.25).floor_sensor(), FloorSensor::at(1));
        assert_eq!(car_at(1.75).floor_sensor(), FloorSensor::at(1));
        // Just inside the gap: between floors.
        assert_eq!(car_at(1.2501).floor_sensor(), FloorSensor::between());
        assert_eq!(car_at(1.7499).floor_sensor(), FloorSensor::between());
    }

    #[test]
    fn test_floor_sensor_matches_cell_index() {
        // Sweep the shaft and check the sensor against the band definition.
        let mut p = 0.0;
        while p < 4.0 {
            let car = car_at(p);
            let distance = p.rem_euclid(1.0);
            let expected_in = distance <= 0.25 || distance >= 0.75;
            let sensor = car.floor_sensor();
            assert_eq!(sensor.in_floor(), expected_in, "position {p}");
            if sensor.in_floor() {
                assert_eq!(sensor.floor(), Some(p.floor() as u8), "position {p}");
            }
            p += 0.01;
        }
    }

    #[test]
    fn test_floor_sensor_floor_divides_negative_positions() {
        // -0.1 lies in cell -1; truncation would alias it onto floor 0.
        assert_eq!(car_at(-0.1).floor_sensor(), FloorSensor::between());
        assert_eq!(car_at(0.0).floor_sensor(), FloorSensor::at(0));
    }

    #[test]
    fn test_floor_sensor_above_top_cell() {
        assert_eq!(car_at(3.9).floor_sensor(), FloorSensor::at(3));
        assert_eq!(car_at(4.1).floor_sensor(), FloorSensor::between());
    }

    #[test]
    fn test_shaft_violation_below_raised_once() {
        let mut car = car_at(0.0);
        car.set_direction(-1);
        let dt = Duration::from_millis(10);

        let mut faults = 0;
        for _ in 0..200 {
            if car.tick(dt).is_err() {
                faults += 1;
            }
        }
        assert_eq!(faults, 1);
        assert!(car.is_faulted());
        assert!(car.position() < -0.5);
    }

    #[test]
    fn test_shaft_violation_above_raised_once() {
        let mut car = car_at(3.0);
        car.set_direction(1);
        let dt = Duration::from_millis(10);

        let mut faults = Vec::new();
        for _ in 0..400 {
            if let Err(fault) = car.tick(dt) {
                faults.push(fault);
            }
        }
        assert_eq!(faults.len(), 1);
        let SimulationFault::ShaftBoundViolation { position, upper, .. } = faults[0];
        assert!(position > upper);
        assert!((upper - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_within_slack_is_not_a_fault() {
        let mut car = car_at(0.0);
        car.set_direction(-1);
        // 0.4 below floor 0, inside the 0.5 slack.
        for _ in 0..40 {
            car.tick(Duration::from_millis(10)).unwrap();
        }
        assert!(!car.is_faulted());
    }
}
