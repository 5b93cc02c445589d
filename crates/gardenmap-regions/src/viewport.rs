//! Viewport and pixel transformation for the map container.
//!
//! Handles conversion between container pixel coordinates (screen space) and
//! display coordinates (geographic or planar). The map shell owns pan and zoom;
//! the editor mirrors them here so pointer deltas can be re-projected.

use std::fmt;

use gardenmap_core::Point;

const MIN_SCALE: f64 = 1e-6;
const MAX_SCALE: f64 = 1e9;

/// Represents the viewport transformation state (scale and pan).
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewport {
    /// Container pixels per display unit.
    scale: f64,
    pan_x: f64,
    pan_y: f64,
    container_width: f64,
    container_height: f64,
}

impl MapViewport {
    /// Creates a viewport at 1:1 scale with the display origin at the
    /// bottom-left corner of the container.
    pub fn new(container_width: f64, container_height: f64) -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            container_width,
            container_height,
        }
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    /// Container pixels per display unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Sets the scale; values outside the supported range are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale > MIN_SCALE && scale < MAX_SCALE {
            self.scale = scale;
        }
    }

    pub fn pan_x(&self) -> f64 {
        self.pan_x
    }

    pub fn pan_y(&self) -> f64 {
        self.pan_y
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.pan_x = x;
        self.pan_y = y;
    }

    /// Converts container pixel coordinates to display coordinates.
    ///
    /// Formula:
    /// ```text
    /// display_x = (pixel_x - pan_x) / scale
    /// display_y = (container_height - pixel_y - pan_y) / scale  // Flip Y-axis
    /// ```
    pub fn pixel_to_display(&self, pixel_x: f64, pixel_y: f64) -> Point {
        let x = (pixel_x - self.pan_x) / self.scale;
        // Flip Y-axis: lower pixel Y (top of container) maps to higher display Y
        let y = (self.container_height - pixel_y - self.pan_y) / self.scale;
        Point::new(y, x)
    }

    /// Converts display coordinates to container pixel coordinates.
    ///
    /// Formula:
    /// ```text
    /// pixel_x = display_x * scale + pan_x
    /// pixel_y = container_height - (display_y * scale + pan_y)  // Flip Y-axis
    /// ```
    pub fn display_to_pixel(&self, point: &Point) -> (f64, f64) {
        let pixel_x = point.x * self.scale + self.pan_x;
        let pixel_y = self.container_height - (point.y * self.scale + self.pan_y);
        (pixel_x, pixel_y)
    }

    /// Translates a pixel delta that starts at `origin_px` into a display delta
    /// `(dy, dx)` under the current pan and scale.
    pub fn pixel_delta_to_display(
        &self,
        origin_px: (f64, f64),
        delta_px: (f64, f64),
    ) -> (f64, f64) {
        let start = self.pixel_to_display(origin_px.0, origin_px.1);
        let end = self.pixel_to_display(origin_px.0 + delta_px.0, origin_px.1 + delta_px.1);
        (end.y - start.y, end.x - start.x)
    }
}

impl fmt::Display for MapViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scale: {:.4} px/unit | Pan: ({:.1}, {:.1})",
            self.scale, self.pan_x, self.pan_y
        )
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}
