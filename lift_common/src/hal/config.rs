//! Simulator configuration.
//!
//! This module contains:
//! - `SimConfig` - validated, immutable parameters of one simulated lift
//! - `SimConfigBuilder` - validating setters, applied before construction
//! - `SimSection` / `SimFileConfig` - the TOML representation
//!
//! Every setter validates its own argument and returns the error
//! immediately. Cross-field rules (start floor below floor count, passing
//! time shorter than travel time) are checked by `build()`.

use crate::config::{ConfigError, ConfigLoader, SharedConfig};
use crate::consts::{
    DEFAULT_BTN_DEPRESSED_TIME_MS, DEFAULT_COM_PORT, DEFAULT_FLOORS, DEFAULT_FLOOR_SPACING,
    DEFAULT_QUERY_TIMEOUT_MS, DEFAULT_SLACK_MARGIN, DEFAULT_START_FLOOR, DEFAULT_TICK_PERIOD_MS,
    DEFAULT_TRAVEL_TIME_BETWEEN_FLOORS_MS, DEFAULT_TRAVEL_TIME_PASSING_FLOORS_MS, MAX_FLOORS,
    MIN_COM_PORT, MIN_FLOORS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Parameters of one simulated lift.
///
/// Obtain through [`SimConfig::builder`] or [`SimSection::into_config`];
/// both validate before handing out a value.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of floors (2..=9).
    pub num_floors: u8,
    /// Floor the car starts at.
    pub start_floor: u8,
    /// TCP port of the simulator. `0` lets the OS pick (tests only).
    pub com_port: u16,
    /// Distance between two adjacent floors.
    pub floor_spacing: f64,
    /// Time to travel from one floor to the next.
    pub travel_time_between_floors: Duration,
    /// Time spent inside the floor sensor range while passing a floor.
    pub travel_time_passing_floors: Duration,
    /// How long an order button reads as pressed after a press event.
    pub btn_depressed_time: Duration,
    /// Physics tick period.
    pub tick_period: Duration,
    /// Overshoot allowed past either shaft end before a fault.
    pub slack_margin: f64,
    /// Upper bound on waiting for a query reply.
    pub query_timeout: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_floors: DEFAULT_FLOORS,
            start_floor: DEFAULT_START_FLOOR,
            com_port: DEFAULT_COM_PORT,
            floor_spacing: DEFAULT_FLOOR_SPACING,
            travel_time_between_floors: Duration::from_millis(
                DEFAULT_TRAVEL_TIME_BETWEEN_FLOORS_MS,
            ),
            travel_time_passing_floors: Duration::from_millis(
                DEFAULT_TRAVEL_TIME_PASSING_FLOORS_MS,
            ),
            btn_depressed_time: Duration::from_millis(DEFAULT_BTN_DEPRESSED_TIME_MS),
            tick_period: Duration::from_millis(DEFAULT_TICK_PERIOD_MS),
            slack_margin: DEFAULT_SLACK_MARGIN,
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }
}

impl SimConfig {
    /// Start a builder from the defaults.
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Car speed in distance units per second.
    pub fn speed(&self) -> f64 {
        self.floor_spacing / self.travel_time_between_floors.as_secs_f64()
    }

    /// Half-width of the in-floor band around each floor boundary.
    ///
    /// The car spends `travel_time_passing_floors` inside the band, so the
    /// band is that distance wide, centred on the boundary.
    pub fn in_floor_threshold(&self) -> f64 {
        self.speed() * self.travel_time_passing_floors.as_secs_f64() / 2.0
    }

    /// Height of the shaft (`num_floors × floor_spacing`).
    pub fn shaft_height(&self) -> f64 {
        f64::from(self.num_floors) * self.floor_spacing
    }

    /// Reopen the configuration for changes through the validating setters.
    pub fn into_builder(self) -> SimConfigBuilder {
        SimConfigBuilder { config: self }
    }

    /// Endpoint the simulator listens on and the bridge dials.
    pub fn endpoint(&self) -> String {
        format!("127.0.0.1:{}", self.com_port)
    }

    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `num_floors` in `MIN_FLOORS..=MAX_FLOORS`
    /// 2. `start_floor < num_floors`
    /// 3. `com_port` is `0` or `>= MIN_COM_PORT`
    /// 4. `floor_spacing` and `slack_margin` finite and > 0
    /// 5. all durations > 0
    /// 6. `travel_time_passing_floors < travel_time_between_floors`
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_floors(self.num_floors)?;

        if self.start_floor >= self.num_floors {
            return Err(ConfigError::ValidationError(format!(
                "start floor {} must be below the number of floors ({})",
                self.start_floor, self.num_floors
            )));
        }

        if self.com_port != 0 {
            check_port(self.com_port)?;
        }

        check_distance("floor_spacing", self.floor_spacing)?;
        check_distance("slack_margin", self.slack_margin)?;

        check_duration("travel_time_between_floors", self.travel_time_between_floors)?;
        check_duration("travel_time_passing_floors", self.travel_time_passing_floors)?;
        check_duration("btn_depressed_time", self.btn_depressed_time)?;
        check_duration("tick_period", self.tick_period)?;
        check_duration("query_timeout", self.query_timeout)?;

        if self.travel_time_passing_floors >= self.travel_time_between_floors {
            return Err(ConfigError::ValidationError(format!(
                "travel_time_passing_floors ({:?}) must be shorter than travel_time_between_floors ({:?})",
                self.travel_time_passing_floors, self.travel_time_between_floors
            )));
        }

        Ok(())
    }
}

fn check_floors(floors: u8) -> Result<(), ConfigError> {
    if !(MIN_FLOORS..=MAX_FLOORS).contains(&floors) {
        return Err(ConfigError::ValidationError(format!(
            "number of floors must be between {MIN_FLOORS} and {MAX_FLOORS}, got {floors}"
        )));
    }
    Ok(())
}

fn check_port(port: u16) -> Result<(), ConfigError> {
    if port < MIN_COM_PORT {
        return Err(ConfigError::ValidationError(format!("illegal port: {port}")));
    }
    Ok(())
}

fn check_distance(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be a positive distance, got {value}"
        )));
    }
    Ok(())
}

fn check_duration(name: &str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(())
}

/// Builder for [`SimConfig`].
///
/// ```rust
/// use lift_common::hal::config::SimConfig;
/// use std::time::Duration;
///
/// let config = SimConfig::builder()
///     .num_floors(6)?
///     .travel_time_between_floors(Duration::from_millis(1500))?
///     .build()?;
/// assert_eq!(config.num_floors, 6);
/// # Ok::<(), lift_common::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Number of floors, `2..=9`.
    pub fn num_floors(mut self, floors: u8) -> Result<Self, ConfigError> {
        check_floors(floors)?;
        self.config.num_floors = floors;
        Ok(self)
    }

    /// Floor the car starts at. Checked against the floor count in `build()`.
    pub fn start_floor(mut self, floor: u8) -> Result<Self, ConfigError> {
        if floor >= MAX_FLOORS {
            return Err(ConfigError::ValidationError(format!(
                "start floor {floor} out of range"
            )));
        }
        self.config.start_floor = floor;
        Ok(self)
    }

    /// Port the simulator listens on, `1024..=65535`. Must be unique per
    /// simulator instance.
    pub fn com_port(mut self, port: u16) -> Result<Self, ConfigError> {
        check_port(port)?;
        self.config.com_port = port;
        Ok(self)
    }

    /// Let the OS pick the port when the simulator binds.
    pub fn ephemeral_port(mut self) -> Self {
        self.config.com_port = 0;
        self
    }

    /// Distance between two adjacent floors.
    pub fn floor_spacing(mut self, spacing: f64) -> Result<Self, ConfigError> {
        check_distance("floor_spacing", spacing)?;
        self.config.floor_spacing = spacing;
        Ok(self)
    }

    /// Travel time between each floor.
    pub fn travel_time_between_floors(mut self, d: Duration) -> Result<Self, ConfigError> {
        check_duration("travel_time_between_floors", d)?;
        self.config.travel_time_between_floors = d;
        Ok(self)
    }

    /// Time spent within the sensor range when passing a floor.
    pub fn travel_time_passing_floors(mut self, d: Duration) -> Result<Self, ConfigError> {
        check_duration("travel_time_passing_floors", d)?;
        self.config.travel_time_passing_floors = d;
        Ok(self)
    }

    /// Duration a button reads as pressed after the press event.
    pub fn btn_depressed_time(mut self, d: Duration) -> Result<Self, ConfigError> {
        check_duration("btn_depressed_time", d)?;
        self.config.btn_depressed_time = d;
        Ok(self)
    }

    /// Physics tick period.
    pub fn tick_period(mut self, d: Duration) -> Result<Self, ConfigError> {
        check_duration("tick_period", d)?;
        self.config.tick_period = d;
        Ok(self)
    }

    /// Overshoot allowed past the shaft ends.
    pub fn slack_margin(mut self, margin: f64) -> Result<Self, ConfigError> {
        check_distance("slack_margin", margin)?;
        self.config.slack_margin = margin;
        Ok(self)
    }

    /// Upper bound on waiting for a query reply.
    pub fn query_timeout(mut self, d: Duration) -> Result<Self, ConfigError> {
        check_duration("query_timeout", d)?;
        self.config.query_timeout = d;
        Ok(self)
    }

    /// Validate cross-field rules and produce the configuration.
    pub fn build(self) -> Result<SimConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// `[sim]` section of the simulator TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimSection {
    /// Number of floors.
    #[serde(default = "default_num_floors")]
    pub num_floors: u8,
    /// Start floor.
    #[serde(default)]
    pub start_floor: u8,
    /// Listen port.
    #[serde(default = "default_com_port")]
    pub com_port: u16,
    /// Distance between floors.
    #[serde(default = "default_floor_spacing")]
    pub floor_spacing: f64,
    /// Travel time between floors, milliseconds.
    #[serde(default = "default_between_ms")]
    pub travel_time_between_floors_ms: u64,
    /// Time inside the sensor range, milliseconds.
    #[serde(default = "default_passing_ms")]
    pub travel_time_passing_floors_ms: u64,
    /// Button press hold time, milliseconds.
    #[serde(default = "default_btn_ms")]
    pub btn_depressed_time_ms: u64,
    /// Physics tick period, milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_period_ms: u64,
    /// Overshoot allowed past the shaft ends.
    #[serde(default = "default_slack_margin")]
    pub slack_margin: f64,
    /// Query timeout, milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_num_floors() -> u8 {
    DEFAULT_FLOORS
}

fn default_com_port() -> u16 {
    DEFAULT_COM_PORT
}

fn default_floor_spacing() -> f64 {
    DEFAULT_FLOOR_SPACING
}

fn default_between_ms() -> u64 {
    DEFAULT_TRAVEL_TIME_BETWEEN_FLOORS_MS
}

fn default_passing_ms() -> u64 {
    DEFAULT_TRAVEL_TIME_PASSING_FLOORS_MS
}

fn default_btn_ms() -> u64 {
    DEFAULT_BTN_DEPRESSED_TIME_MS
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_PERIOD_MS
}

fn default_slack_margin() -> f64 {
    DEFAULT_SLACK_MARGIN
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT_MS
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            num_floors: DEFAULT_FLOORS,
            start_floor: DEFAULT_START_FLOOR,
            com_port: DEFAULT_COM_PORT,
            floor_spacing: DEFAULT_FLOOR_SPACING,
            travel_time_between_floors_ms: DEFAULT_TRAVEL_TIME_BETWEEN_FLOORS_MS,
            travel_time_passing_floors_ms: DEFAULT_TRAVEL_TIME_PASSING_FLOORS_MS,
            btn_depressed_time_ms: DEFAULT_BTN_DEPRESSED_TIME_MS,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            slack_margin: DEFAULT_SLACK_MARGIN,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        }
    }
}

impl SimSection {
    /// Run every value through the builder.
    pub fn into_config(self) -> Result<SimConfig, ConfigError> {
        SimConfig::builder()
            .num_floors(self.num_floors)?
            .start_floor(self.start_floor)?
            .com_port(self.com_port)?
            .floor_spacing(self.floor_spacing)?
            .travel_time_between_floors(Duration::from_millis(self.travel_time_between_floors_ms))?
            .travel_time_passing_floors(Duration::from_millis(self.travel_time_passing_floors_ms))?
            .btn_depressed_time(Duration::from_millis(self.btn_depressed_time_ms))?
            .tick_period(Duration::from_millis(self.tick_period_ms))?
            .slack_margin(self.slack_margin)?
            .query_timeout(Duration::from_millis(self.query_timeout_ms))?
            .build()
    }
}

/// Complete simulator configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimFileConfig {
    /// Logging and instance name.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Simulator parameters.
    #[serde(default)]
    pub sim: SimSection,
}

impl SimFileConfig {
    /// Load a TOML file and validate both sections.
    pub fn load_validated(path: &Path) -> Result<(SharedConfig, SimConfig), ConfigError> {
        let file = Self::load(path)?;
        file.shared.validate()?;
        let sim = file.sim.into_config()?;
        Ok((file.shared, sim))
    }
}
