//! GardenMap Settings Crate
//!
//! Handles editor configuration: which coordinate space the map uses, the
//! reference image projection, geometry and drag thresholds, and palettes.

pub mod config;

pub use config::{
    default_config_path, DragSettings, EditorConfig, GeoBounds, GeometrySettings, MapSettings,
    MapType, PathStyle, StyleSettings,
};
