use blockcensus_common::{CHUNK_SIZE, ChunkCuboid, ChunkLocation, ChunkPart, ScanOptions};
use blockcensus_kernel::{BlockId, RegionSnapshot};
use glam::IVec3;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::classify::{Classifier, RawSample};
use crate::error::ScanError;
use crate::snapshot::sample_at;
use crate::storage::AggregateStorage;
use crate::world_access::{RegionHandle, WorldAccess};

/// Outcome of scanning one region.
pub type RegionResult = Result<AggregateStorage, ScanError>;

/// Handle to one in-flight region scan.
///
/// Resolves exactly once. Poll it without blocking through [`try_take`], or
/// await it as a future.
///
/// [`try_take`]: RegionScan::try_take
#[derive(Debug)]
pub struct RegionScan {
    location: ChunkLocation,
    rx: oneshot::Receiver<RegionResult>,
}

impl RegionScan {
    /// A pending scan plus the sender that resolves it.
    pub fn channel(location: ChunkLocation) -> (oneshot::Sender<RegionResult>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { location, rx })
    }

    /// A scan that is already resolved.
    pub fn ready(location: ChunkLocation, result: RegionResult) -> Self {
        let (tx, scan) = Self::channel(location);
        // The receiver is alive in `scan`, so the send cannot fail.
        let _ = tx.send(result);
        scan
    }

    pub fn location(&self) -> ChunkLocation {
        self.location
    }

    /// The result if it has arrived, `None` while still pending.
    ///
    /// A producer that went away without answering counts as a worker fault.
    pub fn try_take(&mut self) -> Option<RegionResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(abandoned(self.location))),
        }
    }
}

impl Future for RegionScan {
    type Output = RegionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let location = self.location;
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(abandoned(location))))
    }
}

fn abandoned(location: ChunkLocation) -> ScanError {
    ScanError::WorkerFault {
        location,
        reason: "worker dropped the region without a result".into(),
    }
}

fn load_failure(location: ChunkLocation, reason: impl ToString) -> ScanError {
    ScanError::RegionLoadFailure {
        location,
        reason: reason.to_string(),
    }
}

/// Dispatches one region scan and hands back its pending result.
pub trait RegionExecutor: Send + Sync {
    fn submit(&self, part: &ChunkPart, options: &ScanOptions) -> RegionScan;
}

/// Classify every voxel of `cuboid` and every entity standing in it.
///
/// Blocks are tallied by raw id first and classified once per distinct id.
pub fn scan_snapshot(
    snapshot: &RegionSnapshot,
    cuboid: &ChunkCuboid,
    options: &ScanOptions,
    classifier: &Classifier,
) -> AggregateStorage {
    let mut storage = AggregateStorage::new();

    if options.materials {
        let bounds = ChunkCuboid::full(snapshot.min_y(), snapshot.min_y() + snapshot.height() - 1);
        if let Some(area) = cuboid.intersect(&bounds) {
            let mut tallies: HashMap<BlockId, u64> = HashMap::new();
            for y in area.min.y..=area.max.y {
                for z in area.min.z..=area.max.z {
                    for x in area.min.x..=area.max.x {
                        if let Some(id) = sample_at(snapshot, x, y, z) {
                            *tallies.entry(id).or_insert(0) += 1;
                        }
                    }
                }
            }
            for (id, n) in tallies {
                if let Some(object) = classifier.classify(RawSample::Block(id)) {
                    if options.includes(&object) {
                        storage.increment_by(object, n);
                    }
                }
            }
        }
    }

    if options.entities {
        let (rx, rz) = snapshot.coord();
        let origin = IVec3::new(rx * CHUNK_SIZE, 0, rz * CHUNK_SIZE);
        for entity in snapshot.entities() {
            if !cuboid.contains(entity.block_position() - origin) {
                continue;
            }
            if let Some(object) = classifier.classify(RawSample::Entity(entity)) {
                if options.includes(&object) {
                    storage.increment(object);
                }
            }
        }
    }

    storage
}

/// Scans regions on a tokio runtime.
///
/// Resident regions are snapshotted on the submitting thread, so the copy
/// reflects the world at submission time. Regions that are not resident are
/// loaded through [`WorldAccess::load_region`] first. Classification always
/// runs on the blocking pool.
pub struct ChunkExecutor {
    runtime: Handle,
    world: Arc<dyn WorldAccess>,
    classifier: Classifier,
}

impl ChunkExecutor {
    pub fn new(runtime: Handle, world: Arc<dyn WorldAccess>, classifier: Classifier) -> Self {
        Self {
            runtime,
            world,
            classifier,
        }
    }

    /// Scan a region that is currently resident.
    pub fn submit_resident(
        &self,
        handle: RegionHandle,
        cuboid: ChunkCuboid,
        options: &ScanOptions,
    ) -> RegionScan {
        let location = handle.location;
        let Some(snapshot) = self.world.snapshot(&handle) else {
            // Unloaded between the residency check and now.
            return self.submit_unloaded(location, cuboid, options);
        };

        let (tx, scan) = RegionScan::channel(location);
        let classifier = self.classifier.clone();
        let options = options.clone();
        tracing::debug!(%location, "dispatching resident region");
        self.runtime.spawn(async move {
            let result = classify_on_worker(location, snapshot, cuboid, options, classifier).await;
            let _ = tx.send(result);
        });
        scan
    }

    /// Load a region, then scan it.
    pub fn submit_unloaded(
        &self,
        location: ChunkLocation,
        cuboid: ChunkCuboid,
        options: &ScanOptions,
    ) -> RegionScan {
        let (tx, scan) = RegionScan::channel(location);
        let load = self.world.load_region(&location);
        let world = Arc::clone(&self.world);
        let classifier = self.classifier.clone();
        let options = options.clone();
        tracing::debug!(%location, "dispatching region load");
        self.runtime.spawn(async move {
            let result = match load.await {
                Ok(handle) => match world.snapshot(&handle) {
                    Some(snapshot) => {
                        classify_on_worker(location, snapshot, cuboid, options, classifier).await
                    }
                    None => Err(load_failure(location, "region unloaded before snapshot")),
                },
                Err(e) => Err(load_failure(location, e)),
            };
            let _ = tx.send(result);
        });
        scan
    }
}

impl RegionExecutor for ChunkExecutor {
    fn submit(&self, part: &ChunkPart, options: &ScanOptions) -> RegionScan {
        match self.world.get_resident_region(&part.location) {
            Some(handle) => self.submit_resident(handle, part.cuboid, options),
            None => self.submit_unloaded(part.location, part.cuboid, options),
        }
    }
}

async fn classify_on_worker(
    location: ChunkLocation,
    snapshot: RegionSnapshot,
    cuboid: ChunkCuboid,
    options: ScanOptions,
    classifier: Classifier,
) -> RegionResult {
    tokio::task::spawn_blocking(move || scan_snapshot(&snapshot, &cuboid, &options, &classifier))
        .await
        .map_err(|e| ScanError::WorkerFault {
            location,
            reason: e.to_string(),
        })
}

/// Scans each region on the calling thread and returns it already resolved.
///
/// Loads block the caller. Meant for tests and small offline scans.
pub struct InlineExecutor {
    world: Arc<dyn WorldAccess>,
    classifier: Classifier,
}

impl InlineExecutor {
    pub fn new(world: Arc<dyn WorldAccess>, classifier: Classifier) -> Self {
        Self { world, classifier }
    }

    fn scan_now(&self, part: &ChunkPart, options: &ScanOptions) -> RegionResult {
        let location = part.location;
        let handle = match self.world.get_resident_region(&location) {
            Some(handle) => handle,
            None => futures::executor::block_on(self.world.load_region(&location))
                .map_err(|e| load_failure(location, e))?,
        };
        let snapshot = self
            .world
            .snapshot(&handle)
            .ok_or_else(|| load_failure(location, "region unloaded before snapshot"))?;
        std::panic::catch_unwind(AssertUnwindSafe(|| {
            scan_snapshot(&snapshot, &part.cuboid, options, &self.classifier)
        }))
        .map_err(|_| ScanError::WorkerFault {
            location,
            reason: "classification panicked".into(),
        })
    }
}

impl RegionExecutor for InlineExecutor {
    fn submit(&self, part: &ChunkPart, options: &ScanOptions) -> RegionScan {
        RegionScan::ready(part.location, self.scan_now(part, options))
    }
}
