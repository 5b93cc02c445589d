use std::sync::Arc;

use gardenmap_core::constants::COORD_EPSILON;
use gardenmap_core::{PersistenceError, Point};
use gardenmap_regions::{
    geometry, AreaId, Confirmation, ContainerId, DrawingSession, EditedShape, GatewayCall,
    InMemoryRegionGateway, InteractionMode, LinearProjection, PendingKind, PendingStatus, Region,
    SessionEvent,
};
use gardenmap_settings::{EditorConfig, MapType};

const CONTAINER: ContainerId = ContainerId(1);

fn rectangle() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 10.0),
        Point::new(10.0, 10.0),
        Point::new(10.0, 0.0),
    ]
}

fn save(name: &str) -> Confirmation {
    Confirmation::Save {
        name: name.to_string(),
        description: String::new(),
    }
}

fn stored_region(id: i64, name: &str) -> Region {
    Region {
        id,
        name: name.to_string(),
        description: None,
        polygon: Some(geometry::serialize(&rectangle())),
        center_lat: 5.0,
        center_lng: 5.0,
        boundary: Some(geometry::serialize_wkt(&rectangle())),
        sector: None,
        fill_color: None,
        stroke_color: None,
        fill_opacity: None,
        stroke_weight: None,
        specimen_count: 3,
        created_at: None,
        updated_at: None,
    }
}

fn session_with(gateway: Arc<InMemoryRegionGateway>) -> DrawingSession {
    DrawingSession::new(&EditorConfig::default(), gateway, CONTAINER)
}

#[tokio::test]
async fn test_draw_name_and_persist_rectangle() {
    let gateway = Arc::new(InMemoryRegionGateway::with_next_id(17));
    let mut session = session_with(gateway.clone());
    session.set_mode(InteractionMode::Drawing);

    let eph = session.on_shape_created(rectangle()).unwrap();
    let handle_id = session.handle(&eph).unwrap().handle_id();
    assert!(eph.to_string().starts_with("area-"));

    assert_eq!(session.confirm(save("Sector A")), Some(eph));
    let area = session.area(&eph).unwrap();
    assert_eq!(area.name, "Sector A");
    assert_eq!(area.points, rectangle());
    assert_eq!(area.pending.as_ref().unwrap().kind, PendingKind::Create);
    assert!(!session.drawing_unsaved());

    assert_eq!(session.settle().await, 1);

    let id = AreaId::Region(17);
    assert!(session.area(&eph).is_none());
    assert_eq!(session.area_count(), 1);

    let area = session.area(&id).unwrap();
    assert_eq!(area.id.to_string(), "region-17");
    assert_eq!(area.name, "Sector A");
    assert!(area.pending.is_none());

    // Renamed in place, not rebuilt.
    let handle = session.handle(&id).unwrap();
    assert_eq!(handle.handle_id(), handle_id);
    assert_eq!(handle.area_id(), id);
    assert!(session.factory().cache().contains(&id));
    assert!(!session.factory().cache().contains(&eph));
    assert!(session.controller(&id).is_some());

    let stored = gateway.get(17).unwrap();
    assert_eq!(stored.name, "Sector A");
    assert_eq!(stored.description, None);
    assert_eq!(
        stored.polygon.as_deref(),
        Some("[[0.0,0.0],[0.0,10.0],[10.0,10.0],[10.0,0.0]]")
    );
    assert_eq!(
        stored.boundary.as_deref(),
        Some("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))")
    );
    assert_eq!((stored.center_lat, stored.center_lng), (5.0, 5.0));

    let events = session.take_events();
    assert!(events.contains(&SessionEvent::Reconciled {
        ephemeral_id: eph,
        area_id: id
    }));
}

#[tokio::test]
async fn test_create_then_cancel_restores_state() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = session_with(gateway.clone());
    session.load_regions(&[stored_region(1, "Rockery")]);
    session.set_mode(InteractionMode::Drawing);

    let before = session.area_count();
    let eph = session.on_shape_created(rectangle()).unwrap();
    assert_eq!(session.area_count(), before + 1);

    session.confirm(Confirmation::Cancel);
    assert_eq!(session.area_count(), before);
    assert!(session.handle(&eph).is_none());
    assert!(!session.factory().cache().contains(&eph));
    assert!(!session.drawing_unsaved());

    assert_eq!(session.settle().await, 0);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_failed_create_stays_ephemeral() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.fail_next(PersistenceError::Transport {
        reason: "connection refused".to_string(),
    });
    let mut session = session_with(gateway.clone());
    session.set_mode(InteractionMode::Drawing);

    let eph = session.on_shape_created(rectangle()).unwrap();
    session.confirm(save("Bog Garden"));
    session.settle().await;

    let area = session.area(&eph).unwrap();
    let pending = area.pending.as_ref().unwrap();
    assert_eq!(pending.kind, PendingKind::Create);
    assert_eq!(pending.ephemeral_id, Some(eph));
    assert!(matches!(
        &pending.status,
        PendingStatus::Failed(reason) if reason.contains("connection refused")
    ));
    assert!(session.handle(&eph).is_some());
    assert!(gateway.regions().is_empty());

    assert!(session
        .take_events()
        .iter()
        .any(|e| matches!(e, SessionEvent::PersistFailed { area_id, .. } if *area_id == eph)));
}

#[tokio::test]
async fn test_edit_saves_persisted_area_immediately() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(stored_region(5, "Herb Garden"));
    let mut session = session_with(gateway.clone());
    session.load_regions(&gateway.regions());
    session.set_mode(InteractionMode::Editing);

    let moved: Vec<Point> = rectangle().iter().map(|p| p.offset(1.0, 0.0)).collect();
    let applied = session.on_shapes_edited(vec![EditedShape {
        id: AreaId::Region(5),
        points: moved.clone(),
    }]);
    assert_eq!(applied, 1);

    // Local state first.
    assert_eq!(session.area(&AreaId::Region(5)).unwrap().points, moved);
    assert_eq!(session.in_flight(), 1);

    session.settle().await;
    assert_eq!(gateway.calls(), vec![GatewayCall::Update(5)]);
    assert_eq!(
        gateway.get(5).unwrap().polygon,
        Some(geometry::serialize(&moved))
    );
    assert_eq!(gateway.get(5).unwrap().center_lat, 6.0);
    assert!(session.area(&AreaId::Region(5)).unwrap().pending.is_none());
    assert!(session
        .take_events()
        .contains(&SessionEvent::Saved(AreaId::Region(5))));
}

#[tokio::test]
async fn test_failed_update_is_not_rolled_back() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(stored_region(5, "Herb Garden"));
    gateway.fail_next(PersistenceError::Rejected {
        reason: "stale".to_string(),
    });
    let mut session = session_with(gateway.clone());
    session.load_regions(&gateway.regions());

    let moved: Vec<Point> = rectangle().iter().map(|p| p.offset(0.0, 2.0)).collect();
    session.on_shapes_edited(vec![EditedShape {
        id: AreaId::Region(5),
        points: moved.clone(),
    }]);
    session.settle().await;

    let area = session.area(&AreaId::Region(5)).unwrap();
    assert_eq!(area.points, moved);
    assert!(area.pending.as_ref().unwrap().is_failed());
}

#[tokio::test]
async fn test_edit_during_create_is_sent_after_reconcile() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = session_with(gateway.clone());
    session.set_mode(InteractionMode::Drawing);

    let eph = session.on_shape_created(rectangle()).unwrap();
    session.confirm(save("Bog Garden"));

    let moved: Vec<Point> = rectangle().iter().map(|p| p.offset(3.0, 3.0)).collect();
    session.on_shapes_edited(vec![EditedShape {
        id: eph,
        points: moved.clone(),
    }]);
    // Nothing to update until the server id is known.
    assert_eq!(session.in_flight(), 1);

    assert_eq!(session.settle().await, 2);
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Create("Bog Garden".to_string()), GatewayCall::Update(1)]
    );
    assert_eq!(gateway.get(1).unwrap().polygon, Some(geometry::serialize(&moved)));

    let area = session.area(&AreaId::Region(1)).unwrap();
    assert_eq!(area.points, moved);
    assert!(area.pending.is_none());
}

#[tokio::test]
async fn test_degenerate_edit_ignored() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = session_with(gateway.clone());
    session.load_regions(&[stored_region(5, "Herb Garden")]);

    let collapsed = vec![Point::new(1.0, 1.0); 4];
    let applied = session.on_shapes_edited(vec![EditedShape {
        id: AreaId::Region(5),
        points: collapsed,
    }]);
    assert_eq!(applied, 0);
    assert_eq!(session.area(&AreaId::Region(5)).unwrap().points, rectangle());
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn test_edit_of_unsaved_area_stays_local() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = session_with(gateway.clone());
    session.set_mode(InteractionMode::Drawing);
    let eph = session.on_shape_created(rectangle()).unwrap();

    let moved: Vec<Point> = rectangle().iter().map(|p| p.offset(3.0, 3.0)).collect();
    assert_eq!(
        session.on_shapes_edited(vec![EditedShape { id: eph, points: moved.clone() }]),
        1
    );
    assert_eq!(session.area(&eph).unwrap().points, moved);
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn test_delete_calls_backend_only_for_persisted_ids() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(stored_region(8, "Alpine House"));
    let mut session = session_with(gateway.clone());
    session.load_regions(&gateway.regions());
    session.set_mode(InteractionMode::Drawing);
    let eph = session.on_shape_created(rectangle()).unwrap();

    session.set_mode(InteractionMode::Deleting);
    let removed = session.on_shapes_deleted(&[AreaId::Region(8), eph, AreaId::Region(99)]);
    assert_eq!(removed, 2);
    assert_eq!(session.area_count(), 0);
    assert_eq!(session.pending_confirmation(), None);

    session.settle().await;
    assert_eq!(gateway.calls(), vec![GatewayCall::Delete(8)]);
    assert!(gateway.get(8).is_none());
}

#[tokio::test]
async fn test_area_deleted_while_create_in_flight_is_removed_on_server() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = session_with(gateway.clone());
    session.set_mode(InteractionMode::Drawing);

    let eph = session.on_shape_created(rectangle()).unwrap();
    session.confirm(save("Short-lived"));
    session.on_shapes_deleted(&[eph]);

    assert_eq!(session.settle().await, 2);
    assert_eq!(
        gateway.calls(),
        vec![
            GatewayCall::Create("Short-lived".to_string()),
            GatewayCall::Delete(1)
        ]
    );
    assert!(gateway.regions().is_empty());
    assert_eq!(session.area_count(), 0);
}

#[tokio::test]
async fn test_planar_session_stores_geographic_polygon() {
    let mut config = EditorConfig::default();
    config.map.map_type = MapType::Planar;
    let projection = LinearProjection::from_settings(&config.map);

    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = DrawingSession::new(&config, gateway.clone(), CONTAINER);
    session.set_mode(InteractionMode::Drawing);

    let drawn = vec![
        Point::new(384.0, 512.0),
        Point::new(384.0, 1536.0),
        Point::new(1152.0, 1536.0),
        Point::new(1152.0, 512.0),
    ];
    let eph = session.on_shape_created(drawn.clone()).unwrap();
    session.confirm(save("Schematic Bed"));
    session.settle().await;

    let stored = gateway.get(1).unwrap();
    let stored_points = geometry::try_parse(stored.polygon.as_deref().unwrap()).unwrap();
    for (stored, shown) in stored_points.iter().zip(&drawn) {
        assert!(stored.y > 51.0 && stored.y < 52.0);
        // Six-decimal storage is coarser than an image pixel fraction.
        assert!(projection.project(stored.y, stored.x).approx_eq(shown, 0.1));
    }

    // Display points are untouched by the save.
    assert!(session.area(&eph).is_none());
    assert_eq!(session.area(&AreaId::Region(1)).unwrap().points, drawn);
}

#[tokio::test]
async fn test_switching_display_space_reprojects_areas() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    let mut session = session_with(gateway);

    let mut garden = stored_region(4, "Walled Garden");
    let corners = vec![
        Point::new(51.4775, -0.2950),
        Point::new(51.4775, -0.2900),
        Point::new(51.4825, -0.2900),
        Point::new(51.4825, -0.2950),
    ];
    garden.polygon = Some(geometry::serialize(&corners));
    session.load_regions(&[garden]);

    let mut config = EditorConfig::default();
    config.map.map_type = MapType::Planar;
    let projection = LinearProjection::from_settings(&config.map);
    session.set_display_space(gardenmap_regions::CoordinateTransformer::for_map(&config.map));

    let area = session.area(&AreaId::Region(4)).unwrap();
    assert_eq!(area.points[0], projection.marker_position(51.4775, -0.2950));
    assert_eq!(session.transformer().kind(), MapType::Planar);

    session.set_display_space(gardenmap_regions::CoordinateTransformer::geographic());
    let back = &session.area(&AreaId::Region(4)).unwrap().points;
    for (p, q) in back.iter().zip(&corners) {
        assert!(p.approx_eq(q, COORD_EPSILON));
    }
}
