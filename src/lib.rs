//! # GardenMap
//!
//! Region polygon editor for botanical garden maps.
//!
//! ## Architecture
//!
//! GardenMap is organized as a workspace with multiple crates:
//!
//! 1. **gardenmap-core** - Point type, constants, error hierarchy
//! 2. **gardenmap-settings** - Editor configuration (JSON/TOML)
//! 3. **gardenmap-regions** - Coordinate spaces, geometry, rendering, dragging,
//!    the drawing session, and region persistence
//! 4. **gardenmap** - Logging setup and the headless demo binary
//!
//! ## Features
//!
//! - **Two Coordinate Spaces**: geographic maps and schematic reference images
//! - **Optimistic Editing**: local changes are shown at once and saved in the background
//! - **Whole-Shape Drag**: move a region by grabbing anywhere inside it
//! - **Robust Loading**: corrupted polygons degrade to a placeholder shape

pub mod demo;
pub mod types;

pub use gardenmap_core::{Error, Point, Result};
pub use gardenmap_regions::{
    Area, AreaId, Confirmation, DrawingSession, InMemoryRegionGateway, InteractionMode, Region,
    RegionGateway, SessionEvent,
};
pub use gardenmap_settings::{default_config_path, EditorConfig, MapType};

pub use demo::run_demo;
pub use types::{AreaSummary, SessionSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
/// - JSON lines instead when `GARDENMAP_LOG_FORMAT=json`
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let json = std::env::var("GARDENMAP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
