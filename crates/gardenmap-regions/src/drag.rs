//! Whole-shape dragging.
//!
//! The drawing toolkit only edits individual vertices. This controller adds a
//! second interaction layer: press inside a shape, move, release, and the
//! whole polygon follows the pointer.
//!
//! ```text
//! Idle --(down inside shape)--> Dragging --(move)*--> --(up)--> Idle
//! ```
//!
//! The state is a plain value ([`DragState`]) so the machine can be driven
//! with synthetic events and inspected without a rendering surface.

use gardenmap_core::Point;

use crate::geometry;
use crate::input::{ContainerId, PointerEvent, PointerKind};
use crate::viewport::MapViewport;

/// Interaction state of one draggable shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        pointer_id: u32,
        /// Container pixel position of the initial press.
        origin_px: (f64, f64),
        /// Last pointer position that was applied (not jitter).
        last_px: (f64, f64),
        /// Shape geometry when the press happened.
        original_points: Vec<Point>,
        /// Geometry following the pointer.
        current_points: Vec<Point>,
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}

/// What the controller did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSignal {
    /// Not for this controller, or nothing to do.
    Ignored,
    /// A drag began; the event was consumed.
    Started,
    /// Step below the jitter threshold; geometry untouched.
    Jitter,
    /// Shape moved; carries the live geometry for preview.
    Preview(Vec<Point>),
    /// Drag finished with a net change; carries the final geometry.
    DragEnd(Vec<Point>),
    /// Drag finished without moving the shape.
    Released,
    /// Drag aborted; the shape returns to its original geometry.
    Cancelled,
}

/// Drag controller bound to one shape in one container.
#[derive(Debug, Clone)]
pub struct DraggablePolygonController {
    container: ContainerId,
    threshold_px: f64,
    attached: bool,
    state: DragState,
}

impl DraggablePolygonController {
    pub fn new(container: ContainerId, threshold_px: f64) -> Self {
        Self {
            container,
            threshold_px,
            attached: true,
            state: DragState::Idle,
        }
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Starts listening on the container again.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stops listening and drops any drag in progress.
    pub fn detach(&mut self) {
        self.attached = false;
        self.state = DragState::Idle;
    }

    /// Feeds one pointer event. `shape_points` are the shape's current
    /// display-space vertices; `viewport` is the shell's current pan/zoom.
    pub fn handle(
        &mut self,
        event: &mut PointerEvent,
        viewport: &MapViewport,
        shape_points: &[Point],
    ) -> DragSignal {
        if !self.attached || event.container != self.container {
            return DragSignal::Ignored;
        }

        match event.kind {
            PointerKind::Down => self.press(event, viewport, shape_points),
            PointerKind::Move => self.step(event, viewport),
            PointerKind::Up => self.release(event, viewport),
            PointerKind::Cancel => self.cancel(event),
        }
    }

    fn press(
        &mut self,
        event: &mut PointerEvent,
        viewport: &MapViewport,
        shape_points: &[Point],
    ) -> DragSignal {
        if self.state.is_dragging() {
            return DragSignal::Ignored;
        }

        let at = viewport.pixel_to_display(event.x, event.y);
        if !geometry::contains(shape_points, &at) {
            return DragSignal::Ignored;
        }

        event.stop_propagation();
        self.state = DragState::Dragging {
            pointer_id: event.pointer_id,
            origin_px: event.position(),
            last_px: event.position(),
            original_points: shape_points.to_vec(),
            current_points: shape_points.to_vec(),
        };
        tracing::trace!("Drag started at ({:.1}, {:.1})", event.x, event.y);
        DragSignal::Started
    }

    fn step(&mut self, event: &mut PointerEvent, viewport: &MapViewport) -> DragSignal {
        let threshold = self.threshold_px;
        let DragState::Dragging {
            pointer_id,
            origin_px,
            last_px,
            original_points,
            current_points,
        } = &mut self.state
        else {
            return DragSignal::Ignored;
        };
        if *pointer_id != event.pointer_id {
            return DragSignal::Ignored;
        }
        event.stop_propagation();

        let (x, y) = event.position();
        let step = ((x - last_px.0).powi(2) + (y - last_px.1).powi(2)).sqrt();
        if step < threshold {
            return DragSignal::Jitter;
        }
        *last_px = (x, y);

        // Re-project the whole delta each step so pan/zoom during the drag
        // is honoured.
        let delta_px = (x - origin_px.0, y - origin_px.1);
        let (dy, dx) = viewport.pixel_delta_to_display(*origin_px, delta_px);
        *current_points = geometry::translate(original_points, dy, dx);
        DragSignal::Preview(current_points.clone())
    }

    fn release(&mut self, event: &mut PointerEvent, viewport: &MapViewport) -> DragSignal {
        match &self.state {
            DragState::Dragging { pointer_id, .. } if *pointer_id == event.pointer_id => {}
            _ => return DragSignal::Ignored,
        }

        // The release position counts as a final step.
        self.step(event, viewport);

        let DragState::Dragging {
            original_points,
            current_points,
            ..
        } = std::mem::take(&mut self.state)
        else {
            return DragSignal::Ignored;
        };

        if current_points != original_points {
            tracing::debug!("Drag ended with {} points moved", current_points.len());
            DragSignal::DragEnd(current_points)
        } else {
            DragSignal::Released
        }
    }

    fn cancel(&mut self, event: &mut PointerEvent) -> DragSignal {
        if !self.state.is_dragging() {
            return DragSignal::Ignored;
        }
        event.stop_propagation();
        self.state = DragState::Idle;
        DragSignal::Cancelled
    }
}
