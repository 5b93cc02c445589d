//! Drawing session: the interaction state machine over the map's areas.
//!
//! The session owns the editor's working set of [`Area`]s and keeps three
//! things in step with it: the rendered handles, one drag controller per
//! shape, and background persistence. Toolkit events and pointer events come
//! in through the `on_*` and [`DrawingSession::handle_pointer`] methods; every
//! local change is applied before the matching backend call is dispatched.
//!
//! Backend results are applied when the host calls
//! [`DrawingSession::drain_completions`] (non-blocking) or awaits
//! [`DrawingSession::settle`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use gardenmap_core::{round_points, PersistenceError, Point};
use gardenmap_settings::{EditorConfig, PathStyle};

use crate::bridge;
use crate::coords::CoordinateTransformer;
use crate::drag::{DragSignal, DraggablePolygonController};
use crate::gateway::{PersistOutcome, PersistenceQueue, RegionGateway};
use crate::geometry;
use crate::input::{ContainerId, PointerEvent, PointerKind};
use crate::model::{
    Area, AreaId, PendingKind, PendingOperation, PendingStatus, Region, RegionDto,
};
use crate::render::{PolygonHandle, PolygonRenderFactory, StyleOptions};
use crate::viewport::MapViewport;

/// Interaction mode chosen by the map shell's toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    View,
    Drawing,
    Editing,
    Deleting,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Drawing => write!(f, "drawing"),
            Self::Editing => write!(f, "editing"),
            Self::Deleting => write!(f, "deleting"),
        }
    }
}

/// Answer to the name/description prompt for a freshly drawn shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Save { name: String, description: String },
    Cancel,
}

/// A shape the drawing toolkit reports as edited, in display space.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedShape {
    pub id: AreaId,
    pub points: Vec<Point>,
}

/// Notifications for the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A drawn shape awaits a name and description.
    ConfirmationRequested(AreaId),
    /// An unsaved area was persisted and renamed in place.
    Reconciled { ephemeral_id: AreaId, area_id: AreaId },
    /// The backend acknowledged an update.
    Saved(AreaId),
    /// An area left the working set.
    Removed(AreaId),
    SelectionChanged(Option<AreaId>),
    PersistFailed { area_id: AreaId, reason: String },
}

/// Editor state for one map container.
pub struct DrawingSession {
    mode: InteractionMode,
    container: ContainerId,
    transformer: CoordinateTransformer,
    viewport: MapViewport,
    drag_threshold_px: f64,
    default_style: PathStyle,
    factory: PolygonRenderFactory,
    /// Render order; later areas are drawn on top.
    areas: Vec<Area>,
    handles: HashMap<AreaId, PolygonHandle>,
    controllers: HashMap<AreaId, DraggablePolygonController>,
    pending_confirmation: Option<AreaId>,
    drawing_unsaved: bool,
    queue: PersistenceQueue,
    /// Unsaved areas edited while their create was in flight.
    edited_in_flight: HashSet<AreaId>,
    /// Grows until the host calls [`DrawingSession::take_events`].
    events: Vec<SessionEvent>,
}

impl DrawingSession {
    pub fn new(
        config: &EditorConfig,
        gateway: Arc<dyn RegionGateway>,
        container: ContainerId,
    ) -> Self {
        Self {
            mode: InteractionMode::View,
            container,
            transformer: CoordinateTransformer::for_map(&config.map),
            viewport: MapViewport::default(),
            drag_threshold_px: config.drag.threshold_px,
            default_style: config.styles.default.clone(),
            factory: PolygonRenderFactory::new(config.styles.clone(), &config.geometry),
            areas: Vec::new(),
            handles: HashMap::new(),
            controllers: HashMap::new(),
            pending_confirmation: None,
            drawing_unsaved: false,
            queue: PersistenceQueue::new(gateway),
            edited_in_flight: HashSet::new(),
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Switches mode. Leaving drawing clears the unsaved-drawing flag; a
    /// confirmation that is still open stays answerable.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if mode == self.mode {
            return;
        }
        if self.mode == InteractionMode::Drawing {
            self.drawing_unsaved = false;
        }
        if self.mode == InteractionMode::Editing {
            // Abandon any drag in progress and put its shape back.
            let abandoned: Vec<AreaId> = self
                .controllers
                .iter_mut()
                .filter_map(|(id, controller)| {
                    let dragging = controller.state().is_dragging();
                    controller.detach();
                    controller.attach();
                    dragging.then_some(*id)
                })
                .collect();
            for id in abandoned {
                self.render(id);
            }
        }
        tracing::debug!("Interaction mode {} -> {}", self.mode, mode);
        self.mode = mode;
    }

    /// A shape was completed but not yet named.
    pub fn drawing_unsaved(&self) -> bool {
        self.drawing_unsaved
    }

    pub fn pending_confirmation(&self) -> Option<AreaId> {
        self.pending_confirmation
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, id: &AreaId) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == *id)
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn selected(&self) -> Option<AreaId> {
        self.areas.iter().find(|a| a.selected).map(|a| a.id)
    }

    pub fn handle(&self, id: &AreaId) -> Option<&PolygonHandle> {
        self.handles.get(id)
    }

    /// For hover and per-instance style overrides.
    pub fn handle_mut(&mut self, id: &AreaId) -> Option<&mut PolygonHandle> {
        self.handles.get_mut(id)
    }

    pub fn controller(&self, id: &AreaId) -> Option<&DraggablePolygonController> {
        self.controllers.get(id)
    }

    pub fn factory(&self) -> &PolygonRenderFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut PolygonRenderFactory {
        &mut self.factory
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn viewport(&self) -> &MapViewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: MapViewport) {
        self.viewport = viewport;
    }

    pub fn viewport_mut(&mut self) -> &mut MapViewport {
        &mut self.viewport
    }

    /// Backend calls whose result has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }

    /// Hands over the notifications raised since the last call. The host is
    /// expected to drain them after each batch of input or completions.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replaces the persisted areas with `regions`. Unsaved areas are kept.
    pub fn load_regions(&mut self, regions: &[Region]) {
        let stale: Vec<AreaId> = self
            .areas
            .iter()
            .filter(|a| a.id.is_persisted())
            .map(|a| a.id)
            .collect();
        for id in stale {
            self.discard(id);
        }

        for region in regions {
            let area = bridge::to_area(region, self.transformer.space());
            self.insert_area(area);
        }
        tracing::info!("Loaded {} regions", regions.len());
    }

    /// Moves every area into a new display space (map type changed).
    pub fn set_display_space(&mut self, transformer: CoordinateTransformer) {
        for area in &mut self.areas {
            let stored = self.transformer.to_storage(&area.points);
            area.points = transformer.to_display(&stored);
        }
        tracing::info!(
            "Display space {} -> {}",
            self.transformer.kind(),
            transformer.kind()
        );
        self.transformer = transformer;

        self.factory.clear_cache();
        let ids: Vec<AreaId> = self.areas.iter().map(|a| a.id).collect();
        for id in ids {
            let controller =
                DraggablePolygonController::new(self.container, self.drag_threshold_px);
            self.controllers.insert(id, controller);
            self.render(id);
        }
    }

    /// Toolkit finished drawing a shape. Only honoured while drawing;
    /// degenerate shapes are dropped without a trace.
    pub fn on_shape_created(&mut self, points: Vec<Point>) -> Option<AreaId> {
        if self.mode != InteractionMode::Drawing {
            tracing::debug!("Ignoring created shape in {} mode", self.mode);
            return None;
        }

        let points = round_points(&points);
        if let Err(err) = geometry::check(&points) {
            tracing::debug!("Discarding drawn shape: {}", err);
            return None;
        }

        // Only one shape waits for a name at a time.
        if let Some(previous) = self.pending_confirmation.take() {
            tracing::debug!("Dropping unconfirmed shape {}", previous);
            self.discard(previous);
            self.events.push(SessionEvent::Removed(previous));
        }

        let id = AreaId::ephemeral();
        let area = Area::new(id, points).with_style(&self.default_style);
        self.insert_area(area);

        self.pending_confirmation = Some(id);
        self.drawing_unsaved = true;
        self.events.push(SessionEvent::ConfirmationRequested(id));
        tracing::debug!("Shape {} drawn, awaiting confirmation", id);
        Some(id)
    }

    /// Answers the open confirmation. Returns the area it applied to.
    pub fn confirm(&mut self, confirmation: Confirmation) -> Option<AreaId> {
        let Some(id) = self.pending_confirmation.take() else {
            tracing::warn!("Confirmation received with no shape waiting");
            return None;
        };
        self.drawing_unsaved = false;

        match confirmation {
            Confirmation::Cancel => {
                self.discard(id);
                self.events.push(SessionEvent::Removed(id));
                tracing::debug!("Shape {} cancelled", id);
            }
            Confirmation::Save { name, description } => {
                let area = self.areas.iter_mut().find(|a| a.id == id)?;
                area.name = name;
                area.description = description;

                let dto = storage_dto(&self.transformer, area);
                tracing::info!("Saving new region '{}' ({})", dto.name, id);
                let seq = self.queue.submit_create(id, dto);
                area.pending = Some(PendingOperation::create(id, seq));
            }
        }
        Some(id)
    }

    /// Toolkit edited one or more shapes. Returns how many were applied.
    pub fn on_shapes_edited(&mut self, shapes: Vec<EditedShape>) -> usize {
        shapes
            .into_iter()
            .filter(|shape| self.apply_edit(shape.id, &shape.points))
            .count()
    }

    /// Toolkit deleted shapes. Returns how many areas were removed.
    pub fn on_shapes_deleted(&mut self, ids: &[AreaId]) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.discard(*id).is_none() {
                tracing::debug!("Deleted shape {} is not in the session", id);
                continue;
            }
            removed += 1;
            self.events.push(SessionEvent::Removed(*id));

            if let AreaId::Region(region_id) = id {
                tracing::info!("Deleting region {}", region_id);
                self.queue.submit_delete(*region_id);
            }
        }
        removed
    }

    /// Routes a pointer event on the container to the shapes' drag
    /// controllers. Whole-shape dragging is active in editing mode only.
    pub fn handle_pointer(&mut self, event: &mut PointerEvent) -> DragSignal {
        if self.mode != InteractionMode::Editing {
            return DragSignal::Ignored;
        }

        let dragging = self
            .controllers
            .iter()
            .find(|(_, c)| c.state().is_dragging())
            .map(|(id, _)| *id);

        let (id, signal) = match dragging {
            Some(id) => (id, self.route_pointer(id, event)),
            None if event.kind == PointerKind::Down => {
                // Topmost shape gets the first chance.
                let ids: Vec<AreaId> = self.areas.iter().rev().map(|a| a.id).collect();
                let hit = ids.into_iter().find_map(|id| match self.route_pointer(id, event) {
                    DragSignal::Ignored => None,
                    signal => Some((id, signal)),
                });
                match hit {
                    Some(hit) => hit,
                    None => return DragSignal::Ignored,
                }
            }
            None => return DragSignal::Ignored,
        };

        match &signal {
            DragSignal::Preview(points) => {
                if let Some(handle) = self.handles.get_mut(&id) {
                    handle.set_points(points.clone());
                }
            }
            DragSignal::DragEnd(points) => {
                self.apply_edit(id, points);
            }
            DragSignal::Released | DragSignal::Cancelled => self.render(id),
            _ => {}
        }
        signal
    }

    /// Click on a rendered shape: toggles selection, single-select.
    pub fn click(&mut self, id: &AreaId, event: &mut PointerEvent) -> Option<AreaId> {
        self.handles.get(id)?.click(event);
        let was_selected = self.area(id)?.selected;

        let mut restyle = Vec::new();
        for area in &mut self.areas {
            let selected = area.id == *id && !was_selected;
            if area.selected != selected {
                area.selected = selected;
                restyle.push(area.id);
            }
        }
        for changed in restyle {
            self.render(changed);
        }

        let selection = (!was_selected).then_some(*id);
        self.events.push(SessionEvent::SelectionChanged(selection));
        selection
    }

    /// Applies whatever backend results have arrived, without waiting.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.queue.try_next() {
            self.apply_outcome(outcome);
            applied += 1;
        }
        applied
    }

    /// Waits for every dispatched call and applies the results.
    pub async fn settle(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.queue.next().await {
            self.apply_outcome(outcome);
            applied += 1;
        }
        applied
    }

    fn insert_area(&mut self, area: Area) {
        let id = area.id;
        self.areas.push(area);
        let controller = DraggablePolygonController::new(self.container, self.drag_threshold_px);
        self.controllers.insert(id, controller);
        self.render(id);
    }

    /// Removes an area and everything built for it.
    fn discard(&mut self, id: AreaId) -> Option<Area> {
        let index = self.areas.iter().position(|a| a.id == id)?;
        let area = self.areas.remove(index);

        self.handles.remove(&id);
        if let Some(mut controller) = self.controllers.remove(&id) {
            controller.detach();
        }
        self.factory.cache_mut().evict(&id);
        self.edited_in_flight.remove(&id);

        if self.pending_confirmation == Some(id) {
            self.pending_confirmation = None;
            self.drawing_unsaved = false;
        }
        Some(area)
    }

    /// Rebuilds the handle for `id`, keeping its hover state and any
    /// instance style override.
    fn render(&mut self, id: AreaId) {
        let Some(area) = self.areas.iter().find(|a| a.id == id) else {
            return;
        };
        let mut handle = self.factory.create(id, &area.points, &StyleOptions::from_area(area));
        if let Some(previous) = self.handles.get(&id) {
            handle.inherit(previous);
        }
        self.handles.insert(id, handle);
    }

    fn route_pointer(&mut self, id: AreaId, event: &mut PointerEvent) -> DragSignal {
        let Some(area) = self.areas.iter().find(|a| a.id == id) else {
            return DragSignal::Ignored;
        };
        let Some(controller) = self.controllers.get_mut(&id) else {
            return DragSignal::Ignored;
        };
        controller.handle(event, &self.viewport, &area.points)
    }

    /// Local geometry first, then an update for persisted areas.
    fn apply_edit(&mut self, id: AreaId, points: &[Point]) -> bool {
        let points = round_points(points);
        if let Err(err) = geometry::check(&points) {
            tracing::debug!("Ignoring edit of {}: {}", id, err);
            self.render(id);
            return false;
        }

        let Some(area) = self.areas.iter_mut().find(|a| a.id == id) else {
            tracing::debug!("Edited shape {} is not in the session", id);
            return false;
        };
        area.points = points;

        match id {
            AreaId::Region(region_id) => {
                let dto = storage_dto(&self.transformer, area);
                tracing::debug!("Saving edit of region {}", region_id);
                let seq = self.queue.submit_update(region_id, dto);
                area.pending = Some(PendingOperation::update(seq));
            }
            AreaId::Ephemeral(_) => {
                let creating = matches!(
                    &area.pending,
                    Some(PendingOperation {
                        kind: PendingKind::Create,
                        status: PendingStatus::InFlight,
                        ..
                    })
                );
                if creating {
                    // Sent as an update once the server id is known.
                    self.edited_in_flight.insert(id);
                }
            }
        }

        self.render(id);
        true
    }

    fn apply_outcome(&mut self, outcome: PersistOutcome) {
        match outcome {
            PersistOutcome::Created {
                ephemeral_id,
                result: Ok(region),
                ..
            } => self.reconcile(ephemeral_id, region.id),
            PersistOutcome::Created {
                ephemeral_id,
                seq,
                result: Err(err),
            } => {
                tracing::error!("Failed to create region for {}: {}", ephemeral_id, err);
                self.edited_in_flight.remove(&ephemeral_id);
                self.mark_failed(ephemeral_id, seq, &err);
            }
            PersistOutcome::Updated {
                region_id,
                seq,
                result: Ok(_),
            } => {
                let id = bridge::region_id_to_area_id(region_id);
                if !self.is_current(&id, seq) {
                    tracing::debug!("Ignoring superseded save #{} of region {}", seq, region_id);
                    return;
                }
                if let Some(area) = self.areas.iter_mut().find(|a| a.id == id) {
                    area.pending = None;
                }
                self.events.push(SessionEvent::Saved(id));
            }
            PersistOutcome::Updated {
                region_id,
                seq,
                result: Err(err),
            } => {
                let id = bridge::region_id_to_area_id(region_id);
                if !self.is_current(&id, seq) {
                    tracing::warn!(
                        "Save #{} of region {} failed after a newer save: {}",
                        seq,
                        region_id,
                        err
                    );
                    return;
                }
                tracing::error!("Failed to update region {}: {}", region_id, err);
                self.mark_failed(id, seq, &err);
            }
            PersistOutcome::Deleted {
                region_id,
                result: Ok(found),
            } => {
                if !found {
                    tracing::warn!("Region {} was already gone on the server", region_id);
                }
            }
            PersistOutcome::Deleted {
                region_id,
                result: Err(err),
            } => {
                tracing::error!("Failed to delete region {}: {}", region_id, err);
                self.events.push(SessionEvent::PersistFailed {
                    area_id: bridge::region_id_to_area_id(region_id),
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Whether `seq` is the newest save dispatched for `id`.
    fn is_current(&self, id: &AreaId, seq: u64) -> bool {
        self.area(id)
            .and_then(|a| a.pending.as_ref())
            .is_some_and(|pending| pending.seq == seq)
    }

    /// Renames an unsaved area to its server id, keeping its handle. Edits
    /// made while the create was in flight go out as an update.
    fn reconcile(&mut self, ephemeral_id: AreaId, region_id: i64) {
        let area_id = bridge::region_id_to_area_id(region_id);
        let Some(area) = self.areas.iter_mut().find(|a| a.id == ephemeral_id) else {
            tracing::warn!(
                "{} was removed before its create finished; deleting region {}",
                ephemeral_id,
                region_id
            );
            self.queue.submit_delete(region_id);
            return;
        };
        area.id = area_id;
        area.pending = None;

        if self.edited_in_flight.remove(&ephemeral_id) {
            let dto = storage_dto(&self.transformer, area);
            tracing::info!("Sending edits made to {} while it was saving", ephemeral_id);
            let seq = self.queue.submit_update(region_id, dto);
            area.pending = Some(PendingOperation {
                ephemeral_id: Some(ephemeral_id),
                ..PendingOperation::update(seq)
            });
        }

        if let Some(mut handle) = self.handles.remove(&ephemeral_id) {
            handle.rekey(area_id);
            self.handles.insert(area_id, handle);
        }
        if let Some(controller) = self.controllers.remove(&ephemeral_id) {
            self.controllers.insert(area_id, controller);
        }
        self.factory.cache_mut().rekey(&ephemeral_id, area_id);

        tracing::info!("{} persisted as {}", ephemeral_id, area_id);
        self.events.push(SessionEvent::Reconciled {
            ephemeral_id,
            area_id,
        });
    }

    fn mark_failed(&mut self, id: AreaId, seq: u64, err: &PersistenceError) {
        if let Some(area) = self.areas.iter_mut().find(|a| a.id == id) {
            let pending = area.pending.get_or_insert_with(|| {
                if id.is_persisted() {
                    PendingOperation::update(seq)
                } else {
                    PendingOperation::create(id, seq)
                }
            });
            pending.status = PendingStatus::Failed(err.to_string());
        }
        self.events.push(SessionEvent::PersistFailed {
            area_id: id,
            reason: err.to_string(),
        });
    }
}

/// Persist payload for an area whose points are in display space.
fn storage_dto(transformer: &CoordinateTransformer, area: &Area) -> RegionDto {
    let stored = Area {
        points: transformer.to_storage(&area.points),
        ..area.clone()
    };
    bridge::to_region_dto(&stored)
}

impl fmt::Debug for DrawingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingSession")
            .field("mode", &self.mode)
            .field("container", &self.container)
            .field("space", &self.transformer.kind())
            .field("areas", &self.areas.len())
            .field("pending_confirmation", &self.pending_confirmation)
            .field("drawing_unsaved", &self.drawing_unsaved)
            .field("queue", &self.queue)
            .finish()
    }
}
