use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gardenmap_core::{PersistenceError, Point};
use gardenmap_regions::{
    geometry, AreaId, Confirmation, ContainerId, DrawingSession, EditedShape,
    InMemoryRegionGateway, InteractionMode, PendingStatus, PersistOutcome, PersistenceQueue,
    Region, RegionDto, RegionGateway, SessionEvent,
};
use gardenmap_settings::EditorConfig;
use parking_lot::Mutex;

/// Wraps the in-memory gateway with a fixed delay per call.
struct SlowGateway {
    inner: InMemoryRegionGateway,
    delay: Duration,
    started: Mutex<usize>,
}

#[async_trait]
impl RegionGateway for SlowGateway {
    async fn create(&self, dto: &RegionDto) -> Result<Region, PersistenceError> {
        *self.started.lock() += 1;
        tokio::time::sleep(self.delay).await;
        self.inner.create(dto).await
    }

    async fn update(&self, id: i64, dto: &RegionDto) -> Result<Region, PersistenceError> {
        *self.started.lock() += 1;
        tokio::time::sleep(self.delay).await;
        self.inner.update(id, dto).await
    }

    async fn delete(&self, id: i64) -> Result<bool, PersistenceError> {
        *self.started.lock() += 1;
        tokio::time::sleep(self.delay).await;
        self.inner.delete(id).await
    }
}

/// Fails every update that stores `rejected_polygon`.
struct PickyGateway {
    inner: InMemoryRegionGateway,
    rejected_polygon: String,
}

#[async_trait]
impl RegionGateway for PickyGateway {
    async fn create(&self, dto: &RegionDto) -> Result<Region, PersistenceError> {
        self.inner.create(dto).await
    }

    async fn update(&self, id: i64, dto: &RegionDto) -> Result<Region, PersistenceError> {
        if dto.polygon == self.rejected_polygon {
            return Err(PersistenceError::Transport {
                reason: "blip".to_string(),
            });
        }
        self.inner.update(id, dto).await
    }

    async fn delete(&self, id: i64) -> Result<bool, PersistenceError> {
        self.inner.delete(id).await
    }
}

struct PanickingGateway;

#[async_trait]
impl RegionGateway for PanickingGateway {
    async fn create(&self, _dto: &RegionDto) -> Result<Region, PersistenceError> {
        panic!("backend client bug");
    }

    async fn update(&self, _id: i64, _dto: &RegionDto) -> Result<Region, PersistenceError> {
        panic!("backend client bug");
    }

    async fn delete(&self, _id: i64) -> Result<bool, PersistenceError> {
        panic!("backend client bug");
    }
}

fn picky_session(rejected: &[Point]) -> (Arc<PickyGateway>, DrawingSession) {
    let inner = InMemoryRegionGateway::new();
    inner.insert(region(2));
    let gateway = Arc::new(PickyGateway {
        inner,
        rejected_polygon: geometry::serialize(rejected),
    });
    let mut session =
        DrawingSession::new(&EditorConfig::default(), gateway.clone(), ContainerId(1));
    session.load_regions(&gateway.inner.regions());
    (gateway, session)
}

fn edit(session: &mut DrawingSession, points: Vec<Point>) {
    session.on_shapes_edited(vec![EditedShape {
        id: AreaId::Region(2),
        points,
    }]);
}

fn square(offset: f64) -> Vec<Point> {
    geometry::translate(
        &[
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ],
        offset,
        offset,
    )
}

fn region(id: i64) -> Region {
    Region {
        id,
        name: "Fernery".to_string(),
        description: Some("Shade house".to_string()),
        polygon: Some(geometry::serialize(&square(0.0))),
        center_lat: 5.0,
        center_lng: 5.0,
        boundary: None,
        sector: Some("East".to_string()),
        fill_color: Some("#336633".to_string()),
        stroke_color: Some("#112211".to_string()),
        fill_opacity: Some(0.3),
        stroke_weight: Some(1.5),
        specimen_count: 40,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn test_handlers_do_not_wait_for_backend() {
    let inner = InMemoryRegionGateway::new();
    inner.insert(region(2));
    let gateway = Arc::new(SlowGateway {
        inner,
        delay: Duration::from_millis(20),
        started: Mutex::new(0),
    });

    let mut session =
        DrawingSession::new(&EditorConfig::default(), gateway.clone(), ContainerId(1));
    session.load_regions(&gateway.inner.regions());

    // Two quick edits: both are dispatched, neither is merged.
    for offset in [1.0, 2.0] {
        session.on_shapes_edited(vec![EditedShape {
            id: AreaId::Region(2),
            points: square(offset),
        }]);
    }
    assert_eq!(session.in_flight(), 2);
    assert_eq!(session.drain_completions(), 0);
    assert_eq!(session.area(&AreaId::Region(2)).unwrap().points, square(2.0));

    assert_eq!(session.settle().await, 2);
    assert_eq!(*gateway.started.lock(), 2);
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn test_update_carries_area_fields() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(region(2));
    let mut session =
        DrawingSession::new(&EditorConfig::default(), gateway.clone(), ContainerId(1));
    session.load_regions(&gateway.regions());

    session.on_shapes_edited(vec![EditedShape {
        id: AreaId::Region(2),
        points: square(1.0),
    }]);
    session.settle().await;

    let stored = gateway.get(2).unwrap();
    assert_eq!(stored.description.as_deref(), Some("Shade house"));
    assert_eq!(stored.sector.as_deref(), Some("East"));
    assert_eq!(stored.fill_color.as_deref(), Some("#336633"));
    assert_eq!(stored.stroke_weight, Some(1.5));
    assert_eq!(stored.specimen_count, 40);
    assert_eq!(stored.boundary.as_deref(), Some("POLYGON((1 1, 11 1, 11 11, 1 11, 1 1))"));
    assert!(stored.updated_at.is_some());
}

#[tokio::test]
async fn test_queue_collects_each_outcome_once() {
    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(region(2));
    let mut queue = PersistenceQueue::new(gateway.clone());

    queue.submit_delete(2);
    queue.submit_delete(3);

    let mut outcomes = Vec::new();
    while let Some(outcome) = queue.next().await {
        outcomes.push(outcome);
    }
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&PersistOutcome::Deleted {
        region_id: 2,
        result: Ok(true)
    }));
    assert!(outcomes.contains(&PersistOutcome::Deleted {
        region_id: 3,
        result: Ok(false)
    }));
    assert!(queue.try_next().is_none());
}

#[tokio::test]
async fn test_failure_of_superseded_edit_is_ignored() {
    let (gateway, mut session) = picky_session(&square(1.0));

    edit(&mut session, square(1.0));
    edit(&mut session, square(2.0));
    assert_eq!(session.settle().await, 2);

    assert_eq!(
        gateway.inner.get(2).unwrap().polygon,
        Some(geometry::serialize(&square(2.0)))
    );
    assert!(session.area(&AreaId::Region(2)).unwrap().pending.is_none());

    let events = session.take_events();
    assert!(events.contains(&SessionEvent::Saved(AreaId::Region(2))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::PersistFailed { .. })));
}

#[tokio::test]
async fn test_ack_of_superseded_edit_keeps_newer_failure() {
    let (_gateway, mut session) = picky_session(&square(2.0));

    edit(&mut session, square(1.0));
    edit(&mut session, square(2.0));
    session.settle().await;

    let area = session.area(&AreaId::Region(2)).unwrap();
    assert_eq!(area.points, square(2.0));
    assert!(matches!(
        &area.pending.as_ref().unwrap().status,
        PendingStatus::Failed(reason) if reason.contains("blip")
    ));
    assert!(!session
        .take_events()
        .contains(&SessionEvent::Saved(AreaId::Region(2))));
}

#[tokio::test]
async fn test_panicking_gateway_still_reports_outcome() {
    let mut session =
        DrawingSession::new(&EditorConfig::default(), Arc::new(PanickingGateway), ContainerId(1));
    session.set_mode(InteractionMode::Drawing);
    let eph = session.on_shape_created(square(0.0)).unwrap();
    session.confirm(Confirmation::Save {
        name: "Cactus House".to_string(),
        description: String::new(),
    });

    let settled = tokio::time::timeout(Duration::from_secs(2), session.settle()).await;
    assert_eq!(settled.ok(), Some(1));
    assert_eq!(session.in_flight(), 0);

    let pending = session.area(&eph).unwrap().pending.clone().unwrap();
    assert!(matches!(
        pending.status,
        PendingStatus::Failed(reason) if reason.contains("panicked")
    ));
}
