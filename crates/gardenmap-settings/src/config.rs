//! Configuration and settings management for GardenMap
//!
//! Provides configuration file handling and validation for the region editor.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Map settings (coordinate space, reference image projection)
//! - Geometry settings (simplification)
//! - Drag settings (jitter threshold)
//! - Style settings (default, selected, and hover palettes)

use gardenmap_core::constants::{
    DEFAULT_FILL_COLOR, DEFAULT_FILL_OPACITY, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WEIGHT,
    DRAG_THRESHOLD_PX, SIMPLIFY_THRESHOLD, SIMPLIFY_TOLERANCE,
};
use gardenmap_core::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which coordinate space the map renders in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    /// Latitude/longitude over a tiled base map
    #[default]
    Geographic,
    /// Pixel-like units over a schematic reference image
    Planar,
}

impl std::fmt::Display for MapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geographic => write!(f, "geographic"),
            Self::Planar => write!(f, "planar"),
        }
    }
}

/// Geographic extent covered by the schematic reference image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::new(51.4750, -0.3000, 51.4850, -0.2850)
    }
}

/// Map settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSettings {
    /// Active map type
    #[serde(default)]
    pub map_type: MapType,
    /// Reference image width in planar units
    pub image_width: f64,
    /// Reference image height in planar units
    pub image_height: f64,
    /// Geographic extent the reference image covers
    #[serde(default)]
    pub bounds: GeoBounds,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            map_type: MapType::Geographic,
            image_width: 2048.0,
            image_height: 1536.0,
            bounds: GeoBounds::default(),
        }
    }
}

/// Geometry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometrySettings {
    /// Vertex count above which polygons are simplified for rendering
    pub simplify_threshold: usize,
    /// Simplification tolerance in display units
    pub simplify_tolerance: f64,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            simplify_threshold: SIMPLIFY_THRESHOLD,
            simplify_tolerance: SIMPLIFY_TOLERANCE,
        }
    }
}

/// Whole-shape drag settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragSettings {
    /// Per-step pointer movement (container pixels) ignored as jitter
    pub threshold_px: f64,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            threshold_px: DRAG_THRESHOLD_PX,
        }
    }
}

/// Resolved stroke/fill style of a polygon outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub stroke_color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_weight: f64,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            fill_color: DEFAULT_FILL_COLOR.to_string(),
            fill_opacity: DEFAULT_FILL_OPACITY,
            stroke_weight: DEFAULT_STROKE_WEIGHT,
        }
    }
}

/// Palettes applied by the render factory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSettings {
    /// Style of regions that carry no colours of their own
    #[serde(default)]
    pub default: PathStyle,
    /// Palette that replaces every style field while selected
    pub selected: PathStyle,
    /// Palette shown while the pointer hovers a shape
    pub hover: PathStyle,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            default: PathStyle::default(),
            selected: PathStyle {
                stroke_color: "#1565c0".to_string(),
                fill_color: "#42a5f5".to_string(),
                fill_opacity: 0.4,
                stroke_weight: 3.0,
            },
            hover: PathStyle {
                stroke_color: "#f9a825".to_string(),
                fill_color: "#fff176".to_string(),
                fill_opacity: 0.35,
                stroke_weight: 3.0,
            },
        }
    }
}

/// Complete editor configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditorConfig {
    /// Map settings
    #[serde(default)]
    pub map: MapSettings,
    /// Geometry settings
    #[serde(default)]
    pub geometry: GeometrySettings,
    /// Drag settings
    #[serde(default)]
    pub drag: DragSettings,
    /// Palettes
    #[serde(default)]
    pub styles: StyleSettings,
}

impl EditorConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("Invalid JSON config: {}", e),
            })?,
            Format::Toml => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("Invalid TOML config: {}", e),
            })?,
        };

        config.validate()?;
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?,
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.map.image_width > 0.0 && self.map.image_height > 0.0) {
            return Err(invalid("map.image_size", "image dimensions must be > 0"));
        }

        let bounds = &self.map.bounds;
        if !(bounds.lat_span() > 0.0 && bounds.lng_span() > 0.0) {
            return Err(invalid(
                "map.bounds",
                "north must exceed south and east must exceed west",
            ));
        }

        if self.geometry.simplify_threshold < gardenmap_core::constants::MIN_POLYGON_POINTS {
            return Err(invalid(
                "geometry.simplify_threshold",
                "threshold must be at least 3",
            ));
        }

        if !(self.geometry.simplify_tolerance > 0.0) {
            return Err(invalid(
                "geometry.simplify_tolerance",
                "tolerance must be > 0",
            ));
        }

        if !(self.drag.threshold_px >= 0.0) {
            return Err(invalid("drag.threshold_px", "threshold must be >= 0"));
        }

        for (name, style) in [
            ("styles.default", &self.styles.default),
            ("styles.selected", &self.styles.selected),
            ("styles.hover", &self.styles.hover),
        ] {
            if !(0.0..=1.0).contains(&style.fill_opacity) {
                return Err(invalid(name, "fill opacity must be within 0..=1"));
            }
            if style.stroke_weight < 0.0 {
                return Err(invalid(name, "stroke weight must be >= 0"));
            }
        }

        Ok(())
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into()),
        }
    }
}

fn invalid(setting: &str, reason: &str) -> Error {
    ConfigError::InvalidValue {
        setting: setting.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Platform config location, e.g. `~/.config/gardenmap/editor.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gardenmap")
        .join("editor.toml")
}
