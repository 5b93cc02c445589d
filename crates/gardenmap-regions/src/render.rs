//! Polygon render handles and the factory that builds them.
//!
//! A [`PolygonHandle`] is the editor's view of one shape on the map: its
//! render points, resolved style, hover state, and click routing. The
//! [`PolygonRenderFactory`] owns a [`RenderCache`] so re-rendering an area with
//! unchanged inputs hands back the same handle.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use gardenmap_core::Point;
use gardenmap_settings::{GeometrySettings, PathStyle, StyleSettings};

use crate::geometry;
use crate::input::PointerEvent;
use crate::model::{Area, AreaId};

/// Invoked with the clicked area's id.
pub type ClickCallback = Rc<dyn Fn(&AreaId)>;

/// Inputs that decide a handle's appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleOptions {
    pub stroke_color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_weight: f64,
    pub selected: bool,
}

impl StyleOptions {
    pub fn from_area(area: &Area) -> Self {
        Self {
            stroke_color: area.stroke_color.clone(),
            fill_color: area.fill_color.clone(),
            fill_opacity: area.fill_opacity,
            stroke_weight: area.stroke_weight,
            selected: area.selected,
        }
    }

    pub fn from_style(style: &PathStyle, selected: bool) -> Self {
        Self {
            stroke_color: style.stroke_color.clone(),
            fill_color: style.fill_color.clone(),
            fill_opacity: style.fill_opacity,
            stroke_weight: style.stroke_weight,
            selected,
        }
    }
}

/// Stable identity of a rendered shape, independent of its area id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

/// An interactive polygon on the map.
#[derive(Clone)]
pub struct PolygonHandle {
    handle_id: HandleId,
    area_id: AreaId,
    points: Vec<Point>,
    selected: bool,
    style: PathStyle,
    hover_palette: PathStyle,
    /// Style to put back on pointer leave; `Some` while hovered.
    restore_style: Option<PathStyle>,
    /// Last style set through [`PolygonHandle::set_style`].
    style_override: Option<PathStyle>,
    on_click: Option<ClickCallback>,
}

impl PolygonHandle {
    pub fn handle_id(&self) -> HandleId {
        self.handle_id
    }

    pub fn area_id(&self) -> AreaId {
        self.area_id
    }

    /// Points as drawn (possibly simplified).
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Style currently shown.
    pub fn style(&self) -> &PathStyle {
        &self.style
    }

    pub fn is_hovered(&self) -> bool {
        self.restore_style.is_some()
    }

    /// Consumes a click on the shape: stops propagation so the map does not
    /// also react, then notifies the click callback.
    pub fn click(&self, event: &mut PointerEvent) -> AreaId {
        event.stop_propagation();
        if let Some(on_click) = &self.on_click {
            on_click(&self.area_id);
        }
        self.area_id
    }

    pub fn pointer_enter(&mut self) {
        if self.restore_style.is_none() {
            let prior = std::mem::replace(&mut self.style, self.hover_palette.clone());
            self.restore_style = Some(prior);
        }
    }

    /// Restores the exact style the handle had before the pointer entered.
    pub fn pointer_leave(&mut self) {
        if let Some(prior) = self.restore_style.take() {
            self.style = prior;
        }
    }

    /// Overrides this instance's style. While hovered the override becomes
    /// the style restored on leave.
    pub fn set_style(&mut self, style: PathStyle) {
        self.style_override = Some(style.clone());
        match &mut self.restore_style {
            Some(restore) => *restore = style,
            None => self.style = style,
        }
    }

    /// Replaces the drawn points (live drag preview).
    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
    }

    pub(crate) fn rekey(&mut self, area_id: AreaId) {
        self.area_id = area_id;
    }

    /// Takes over the interaction state of the handle this one replaces.
    /// A style override survives unless the selection changed, since the
    /// selected palette replaces every style field.
    pub(crate) fn inherit(&mut self, previous: &PolygonHandle) {
        if previous.selected == self.selected {
            if let Some(style) = &previous.style_override {
                self.set_style(style.clone());
            }
        }
        if previous.is_hovered() {
            self.pointer_enter();
        }
    }
}

impl fmt::Debug for PolygonHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonHandle")
            .field("handle_id", &self.handle_id)
            .field("area_id", &self.area_id)
            .field("points", &self.points.len())
            .field("style", &self.style)
            .field("hovered", &self.is_hovered())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    points: Vec<Point>,
    options: StyleOptions,
    handle: PolygonHandle,
}

/// Per-factory cache of built handles keyed by area id.
///
/// An entry is reused only while both the points and style options match
/// exactly; any difference replaces it.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    entries: HashMap<AreaId, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(
        &mut self,
        area_id: &AreaId,
        points: &[Point],
        options: &StyleOptions,
    ) -> Option<PolygonHandle> {
        match self.entries.get(area_id) {
            Some(entry) if entry.points == points && &entry.options == options => {
                self.hits += 1;
                Some(entry.handle.clone())
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    fn store(&mut self, points: Vec<Point>, options: StyleOptions, handle: PolygonHandle) {
        self.entries.insert(
            handle.area_id(),
            CacheEntry {
                points,
                options,
                handle,
            },
        );
    }

    pub fn contains(&self, area_id: &AreaId) -> bool {
        self.entries.contains_key(area_id)
    }

    /// Drops the entry for one area.
    pub fn evict(&mut self, area_id: &AreaId) -> bool {
        self.entries.remove(area_id).is_some()
    }

    /// Moves an entry to a new area id, keeping its handle.
    pub fn rekey(&mut self, from: &AreaId, to: AreaId) {
        if let Some(mut entry) = self.entries.remove(from) {
            entry.handle.rekey(to);
            self.entries.insert(to, entry);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Builds styled, interactive polygon handles.
pub struct PolygonRenderFactory {
    styles: StyleSettings,
    simplify_threshold: usize,
    simplify_tolerance: f64,
    cache: RenderCache,
    on_click: Option<ClickCallback>,
    next_handle: u64,
}

impl PolygonRenderFactory {
    pub fn new(styles: StyleSettings, geometry: &GeometrySettings) -> Self {
        Self {
            styles,
            simplify_threshold: geometry.simplify_threshold,
            simplify_tolerance: geometry.simplify_tolerance,
            cache: RenderCache::new(),
            on_click: None,
            next_handle: 1,
        }
    }

    /// Callback attached to every handle built from now on.
    pub fn set_on_click(&mut self, on_click: ClickCallback) {
        self.on_click = Some(on_click);
    }

    /// Resolves the shown style. Selection replaces every field with the
    /// selected palette.
    pub fn resolve_style(&self, options: &StyleOptions) -> PathStyle {
        if options.selected {
            return self.styles.selected.clone();
        }
        PathStyle {
            stroke_color: options.stroke_color.clone(),
            fill_color: options.fill_color.clone(),
            fill_opacity: options.fill_opacity,
            stroke_weight: options.stroke_weight,
        }
    }

    /// Returns a handle for `area_id`, reusing the cached one when `points`
    /// and `options` are unchanged.
    pub fn create(
        &mut self,
        area_id: AreaId,
        points: &[Point],
        options: &StyleOptions,
    ) -> PolygonHandle {
        if let Some(handle) = self.cache.lookup(&area_id, points, options) {
            return handle;
        }

        let handle = PolygonHandle {
            handle_id: HandleId(self.next_handle),
            area_id,
            points: geometry::simplify_with_threshold(
                points,
                self.simplify_tolerance,
                self.simplify_threshold,
            ),
            selected: options.selected,
            style: self.resolve_style(options),
            hover_palette: self.styles.hover.clone(),
            restore_style: None,
            style_override: None,
            on_click: self.on_click.clone(),
        };
        self.next_handle += 1;

        self.cache.store(points.to_vec(), options.clone(), handle.clone());
        handle
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut RenderCache {
        &mut self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl fmt::Debug for PolygonRenderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonRenderFactory")
            .field("styles", &self.styles)
            .field("simplify_threshold", &self.simplify_threshold)
            .field("cache", &self.cache)
            .finish()
    }
}
