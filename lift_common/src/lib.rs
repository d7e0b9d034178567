//! Lift Common Library
//!
//! Shared types, constants and configuration for the lift HAL workspace.
//! Everything both sides of the simulator connection agree on lives here:
//! the `Lifter` capability trait, the direction and button conventions,
//! the validated simulator configuration and the error taxonomy.
//!
//! # Module Structure
//!
//! - [`hal`] - `Lifter` trait, lift types, simulator configuration, errors
//! - [`config`] - TOML configuration loading traits and types
//! - [`consts`] - Limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use lift_common::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .num_floors(6)?
//!     .com_port(9999)?
//!     .build()?;
//! assert_eq!(config.num_floors, 6);
//! # Ok::<(), lift_common::config::ConfigError>(())
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
