//! # GardenMap Core
//!
//! Core types, constants, and error handling shared by the GardenMap crates.
//! Provides the coordinate pair type used by both the storage and display
//! coordinate spaces, plus the unified error hierarchy.

pub mod constants;
pub mod error;
pub mod point;

pub use error::{ConfigError, Error, GeometryError, PersistenceError, RegionIdError, Result};
pub use point::{round_coord, round_points, Point};
