//! Region persistence: the backend contract and background dispatch.
//!
//! Handlers never await the backend. They hand requests to a
//! [`PersistenceQueue`], which runs each call on the tokio runtime and posts
//! a [`PersistOutcome`] back for the session to apply on its own thread.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use gardenmap_core::PersistenceError;

use crate::model::{AreaId, Region, RegionDto};

/// Backend for region records. Every call may fail.
#[async_trait]
pub trait RegionGateway: Send + Sync {
    async fn create(&self, dto: &RegionDto) -> Result<Region, PersistenceError>;

    async fn update(&self, id: i64, dto: &RegionDto) -> Result<Region, PersistenceError>;

    async fn delete(&self, id: i64) -> Result<bool, PersistenceError>;
}

/// A call recorded by [`InMemoryRegionGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Create(String),
    Update(i64),
    Delete(i64),
}

/// Process-local gateway used by tests and the demo binary.
#[derive(Debug)]
pub struct InMemoryRegionGateway {
    regions: Mutex<BTreeMap<i64, Region>>,
    next_id: Mutex<i64>,
    fail_next: Mutex<Option<PersistenceError>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl InMemoryRegionGateway {
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    /// Gateway whose first assigned id is `next_id`.
    pub fn with_next_id(next_id: i64) -> Self {
        Self {
            regions: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(next_id),
            fail_next: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: PersistenceError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Seeds a stored region, e.g. one loaded at startup.
    pub fn insert(&self, region: Region) {
        let mut next_id = self.next_id.lock();
        *next_id = (*next_id).max(region.id + 1);
        self.regions.lock().insert(region.id, region);
    }

    pub fn get(&self, id: i64) -> Option<Region> {
        self.regions.lock().get(&id).cloned()
    }

    pub fn regions(&self) -> Vec<Region> {
        self.regions.lock().values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    fn take_failure(&self) -> Result<(), PersistenceError> {
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn apply(region: &mut Region, dto: &RegionDto) {
        region.name = dto.name.clone();
        region.description = dto.description.clone();
        region.polygon = Some(dto.polygon.clone());
        region.center_lat = dto.center_lat;
        region.center_lng = dto.center_lng;
        region.boundary = Some(dto.boundary.clone());
        region.sector = dto.sector.clone();
        region.fill_color = Some(dto.fill_color.clone());
        region.stroke_color = Some(dto.stroke_color.clone());
        region.fill_opacity = Some(dto.fill_opacity);
        region.stroke_weight = Some(dto.stroke_weight);
        region.updated_at = Some(Utc::now());
    }
}

impl Default for InMemoryRegionGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegionGateway for InMemoryRegionGateway {
    async fn create(&self, dto: &RegionDto) -> Result<Region, PersistenceError> {
        self.calls.lock().push(GatewayCall::Create(dto.name.clone()));
        self.take_failure()?;

        if dto.name.trim().is_empty() {
            return Err(PersistenceError::Rejected {
                reason: "name is required".to_string(),
            });
        }

        let id = {
            let mut next_id = self.next_id.lock();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let mut region = Region {
            id,
            name: String::new(),
            description: None,
            polygon: None,
            center_lat: 0.0,
            center_lng: 0.0,
            boundary: None,
            sector: None,
            fill_color: None,
            stroke_color: None,
            fill_opacity: None,
            stroke_weight: None,
            specimen_count: 0,
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        Self::apply(&mut region, dto);
        self.regions.lock().insert(id, region.clone());
        Ok(region)
    }

    async fn update(&self, id: i64, dto: &RegionDto) -> Result<Region, PersistenceError> {
        self.calls.lock().push(GatewayCall::Update(id));
        self.take_failure()?;

        let mut regions = self.regions.lock();
        let region = regions
            .get_mut(&id)
            .ok_or(PersistenceError::NotFound { id })?;
        Self::apply(region, dto);
        Ok(region.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, PersistenceError> {
        self.calls.lock().push(GatewayCall::Delete(id));
        self.take_failure()?;
        Ok(self.regions.lock().remove(&id).is_some())
    }
}

/// Result of a background persistence call.
///
/// Creates and updates carry the sequence number [`PersistenceQueue`]
/// returned when they were submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Created {
        ephemeral_id: AreaId,
        seq: u64,
        result: Result<Region, PersistenceError>,
    },
    Updated {
        region_id: i64,
        seq: u64,
        result: Result<Region, PersistenceError>,
    },
    Deleted {
        region_id: i64,
        result: Result<bool, PersistenceError>,
    },
}

/// Runs gateway calls in the background and collects their outcomes.
///
/// Calls for the same region are neither ordered nor merged: two quick edits
/// race, and whichever update lands last wins on the server. Every submitted
/// call yields exactly one outcome, including calls whose task panicked.
pub struct PersistenceQueue {
    gateway: Arc<dyn RegionGateway>,
    tx: mpsc::UnboundedSender<PersistOutcome>,
    rx: mpsc::UnboundedReceiver<PersistOutcome>,
    in_flight: usize,
    next_seq: u64,
}

impl PersistenceQueue {
    pub fn new(gateway: Arc<dyn RegionGateway>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            tx,
            rx,
            in_flight: 0,
            next_seq: 1,
        }
    }

    /// Calls dispatched whose outcome has not been collected yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Dispatches a create and returns its sequence number.
    pub fn submit_create(&mut self, ephemeral_id: AreaId, dto: RegionDto) -> u64 {
        let seq = self.take_seq();
        let gateway = self.gateway.clone();
        self.spawn(
            async move {
                let result = gateway.create(&dto).await;
                PersistOutcome::Created {
                    ephemeral_id,
                    seq,
                    result,
                }
            },
            move |err| PersistOutcome::Created {
                ephemeral_id,
                seq,
                result: Err(err),
            },
        );
        seq
    }

    /// Dispatches an update and returns its sequence number.
    pub fn submit_update(&mut self, region_id: i64, dto: RegionDto) -> u64 {
        let seq = self.take_seq();
        let gateway = self.gateway.clone();
        self.spawn(
            async move {
                let result = gateway.update(region_id, &dto).await;
                PersistOutcome::Updated {
                    region_id,
                    seq,
                    result,
                }
            },
            move |err| PersistOutcome::Updated {
                region_id,
                seq,
                result: Err(err),
            },
        );
        seq
    }

    pub fn submit_delete(&mut self, region_id: i64) {
        let gateway = self.gateway.clone();
        self.spawn(
            async move {
                let result = gateway.delete(region_id).await;
                PersistOutcome::Deleted { region_id, result }
            },
            move |err| PersistOutcome::Deleted {
                region_id,
                result: Err(err),
            },
        );
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Runs `call` on the current runtime. If the call cannot run, or its
    /// task panics or is cancelled, `on_abort` builds the outcome instead.
    fn spawn<F, E>(&mut self, call: F, on_abort: E)
    where
        F: std::future::Future<Output = PersistOutcome> + Send + 'static,
        E: FnOnce(PersistenceError) -> PersistOutcome + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn(call);
                handle.spawn(async move {
                    let outcome = match task.await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            tracing::error!("Persistence task aborted: {}", err);
                            let reason = if err.is_panic() {
                                "gateway call panicked".to_string()
                            } else {
                                err.to_string()
                            };
                            on_abort(PersistenceError::Aborted { reason })
                        }
                    };
                    // Receiver gone means the session was dropped; nothing to report to.
                    let _ = tx.send(outcome);
                });
            }
            Err(err) => {
                tracing::error!("No async runtime for persistence call: {}", err);
                let _ = tx.send(on_abort(PersistenceError::Aborted {
                    reason: err.to_string(),
                }));
            }
        }
    }

    /// Returns a finished outcome without waiting.
    pub fn try_next(&mut self) -> Option<PersistOutcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Waits for the next outcome; `None` once nothing is in flight.
    pub async fn next(&mut self) -> Option<PersistOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.rx.recv().await?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }
}

impl std::fmt::Debug for PersistenceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceQueue")
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
