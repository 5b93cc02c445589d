//! Pointer events delivered by the map shell.

/// Identifies the canvas container a shape is mounted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// A pointer event in container pixel coordinates (origin top-left).
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub container: ContainerId,
    pub pointer_id: u32,
    pub x: f64,
    pub y: f64,
    /// Set by a handler that consumed the event; the shell must not pan the
    /// map or forward the event further.
    pub propagation_stopped: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, container: ContainerId, x: f64, y: f64) -> Self {
        Self {
            kind,
            container,
            pointer_id: 0,
            x,
            y,
            propagation_stopped: false,
        }
    }

    pub fn down(container: ContainerId, x: f64, y: f64) -> Self {
        Self::new(PointerKind::Down, container, x, y)
    }

    pub fn moved(container: ContainerId, x: f64, y: f64) -> Self {
        Self::new(PointerKind::Move, container, x, y)
    }

    pub fn up(container: ContainerId, x: f64, y: f64) -> Self {
        Self::new(PointerKind::Up, container, x, y)
    }

    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}
