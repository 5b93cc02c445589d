use std::sync::Arc;

use gardenmap_core::Point;
use gardenmap_regions::{
    geometry, AreaId, ContainerId, DragSignal, DrawingSession, GatewayCall, InMemoryRegionGateway,
    InteractionMode, MapViewport, PointerEvent, Region,
};
use gardenmap_settings::EditorConfig;

const CONTAINER: ContainerId = ContainerId(3);

fn square() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 10.0),
        Point::new(10.0, 10.0),
        Point::new(10.0, 0.0),
    ]
}

fn region(id: i64, points: &[Point]) -> Region {
    Region {
        id,
        name: format!("Bed {id}"),
        description: None,
        polygon: Some(geometry::serialize(points)),
        center_lat: 0.0,
        center_lng: 0.0,
        boundary: None,
        sector: None,
        fill_color: None,
        stroke_color: None,
        fill_opacity: None,
        stroke_weight: None,
        specimen_count: 0,
        created_at: None,
        updated_at: None,
    }
}

/// Session in editing mode with region 5 (a 10x10 square) at 10 px/unit.
fn editing_session(gateway: Arc<InMemoryRegionGateway>) -> DrawingSession {
    gateway.insert(region(5, &square()));
    let mut session = DrawingSession::new(&EditorConfig::default(), gateway.clone(), CONTAINER);
    session.load_regions(&gateway.regions());

    let mut viewport = MapViewport::new(400.0, 400.0);
    viewport.set_scale(10.0);
    session.set_viewport(viewport);
    session.set_mode(InteractionMode::Editing);
    session
}

#[tokio::test]
async fn test_drag_beyond_threshold_moves_and_saves_once() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = editing_session(gateway.clone());
    let id = AreaId::Region(5);

    let mut down = PointerEvent::down(CONTAINER, 50.0, 350.0);
    assert_eq!(session.handle_pointer(&mut down), DragSignal::Started);
    assert!(down.propagation_stopped);

    let preview = session.handle_pointer(&mut PointerEvent::moved(CONTAINER, 70.0, 340.0));
    assert!(matches!(preview, DragSignal::Preview(_)));
    // Only the rendered handle follows the pointer until release.
    assert_eq!(session.area(&id).unwrap().points, square());
    assert_eq!(
        session.handle(&id).unwrap().points(),
        geometry::translate(&square(), 1.0, 2.0).as_slice()
    );
    assert_eq!(session.in_flight(), 0);

    let end = session.handle_pointer(&mut PointerEvent::up(CONTAINER, 80.0, 330.0));
    let expected = geometry::translate(&square(), 2.0, 3.0);
    assert_eq!(end, DragSignal::DragEnd(expected.clone()));
    assert_eq!(session.area(&id).unwrap().points, expected);
    assert_eq!(session.in_flight(), 1);

    session.settle().await;
    assert_eq!(gateway.calls(), vec![GatewayCall::Update(5)]);
    assert_eq!(
        gateway.get(5).unwrap().polygon,
        Some(geometry::serialize(&expected))
    );
}

#[tokio::test]
async fn test_jitter_drag_changes_nothing() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = editing_session(gateway.clone());

    session.handle_pointer(&mut PointerEvent::down(CONTAINER, 50.0, 350.0));
    session.handle_pointer(&mut PointerEvent::moved(CONTAINER, 51.0, 349.0));
    let end = session.handle_pointer(&mut PointerEvent::up(CONTAINER, 51.5, 349.5));

    assert_eq!(end, DragSignal::Released);
    assert_eq!(session.area(&AreaId::Region(5)).unwrap().points, square());
    assert_eq!(session.in_flight(), 0);
    session.settle().await;
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_drag_ignored_outside_editing_mode() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = editing_session(gateway);
    session.set_mode(InteractionMode::View);

    let mut down = PointerEvent::down(CONTAINER, 50.0, 350.0);
    assert_eq!(session.handle_pointer(&mut down), DragSignal::Ignored);
    assert!(!down.propagation_stopped);
}

#[tokio::test]
async fn test_press_on_empty_map_not_consumed() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = editing_session(gateway);

    let mut down = PointerEvent::down(CONTAINER, 300.0, 50.0);
    assert_eq!(session.handle_pointer(&mut down), DragSignal::Ignored);
    assert!(!down.propagation_stopped);
}

#[tokio::test]
async fn test_events_from_another_container_ignored() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = editing_session(gateway);

    let mut down = PointerEvent::down(ContainerId(4), 50.0, 350.0);
    assert_eq!(session.handle_pointer(&mut down), DragSignal::Ignored);
}

#[tokio::test]
async fn test_topmost_overlapping_shape_is_dragged() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(region(6, &geometry::translate(&square(), 2.0, 2.0)));
    let mut session = editing_session(gateway);

    // (6, 6) lies in both squares; region 6 was loaded last.
    session.handle_pointer(&mut PointerEvent::down(CONTAINER, 60.0, 340.0));
    assert!(session
        .controller(&AreaId::Region(6))
        .unwrap()
        .state()
        .is_dragging());
    assert!(!session
        .controller(&AreaId::Region(5))
        .unwrap()
        .state()
        .is_dragging());
}

#[tokio::test]
async fn test_leaving_editing_abandons_drag() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = editing_session(gateway);

    session.handle_pointer(&mut PointerEvent::down(CONTAINER, 50.0, 350.0));
    session.handle_pointer(&mut PointerEvent::moved(CONTAINER, 90.0, 350.0));
    session.set_mode(InteractionMode::View);

    let controller = session.controller(&AreaId::Region(5)).unwrap();
    assert!(!controller.state().is_dragging());
    assert!(controller.is_attached());
    assert_eq!(session.area(&AreaId::Region(5)).unwrap().points, square());
    assert_eq!(session.handle(&AreaId::Region(5)).unwrap().points(), square().as_slice());
}
