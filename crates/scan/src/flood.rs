//! Breadth-first count of one block type within a connected region.
//!
//! The search only spreads through non-empty voxels: an air voxel (or one
//! below the floor) is visited but never expanded, so the count covers a
//! single connected body of content rather than the whole snapshot array.

use blockcensus_common::ScanObject;
use glam::IVec3;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::classify::Classifier;
use crate::error::ScanError;
use crate::snapshot::SnapshotGrid;

const NEIGHBOURS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Z,
    IVec3::NEG_Z,
    IVec3::Y,
    IVec3::NEG_Y,
];

/// Number of dequeued voxels between two clock reads.
const CLOCK_STRIDE: u64 = 1024;

/// One bit per voxel of the snapshot array.
struct VisitedMarkers {
    extent: IVec3,
    bits: Vec<u64>,
}

impl VisitedMarkers {
    fn new(extent: IVec3) -> Self {
        let voxels = extent.max(IVec3::ZERO).as_i64vec3();
        let len = (voxels.x * voxels.y * voxels.z) as usize;
        Self {
            extent,
            bits: vec![0; len.div_ceil(64)],
        }
    }

    /// Mark a voxel. False when out of bounds or already marked.
    fn mark(&mut self, pos: IVec3) -> bool {
        if pos.cmplt(IVec3::ZERO).any() || pos.cmpge(self.extent).any() {
            return false;
        }
        let i = ((pos.y as usize * self.extent.z as usize) + pos.z as usize) * self.extent.x as usize
            + pos.x as usize;
        let (word, bit) = (i / 64, 1u64 << (i % 64));
        if self.bits[word] & bit != 0 {
            return false;
        }
        self.bits[word] |= bit;
        true
    }
}

/// Result of a finished flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodFillOutcome {
    /// Voxels matching the target.
    pub count: u64,
    /// Voxels taken off the frontier, matching or not.
    pub visited: u64,
}

/// A single-pass flood fill over a [`SnapshotGrid`].
pub struct FloodFill<'a> {
    grid: &'a SnapshotGrid,
    classifier: &'a Classifier,
    target: ScanObject,
    floor: i32,
    progress_interval: Duration,
}

impl<'a> FloodFill<'a> {
    /// Only voxels are searched, so `target` must be a block type.
    pub fn new(
        grid: &'a SnapshotGrid,
        classifier: &'a Classifier,
        target: ScanObject,
    ) -> Result<Self, ScanError> {
        if !target.is_block() {
            return Err(ScanError::NonBlockTarget(target));
        }
        Ok(Self {
            grid,
            classifier,
            target,
            floor: grid.min_y(),
            progress_interval: Duration::from_secs(10),
        })
    }

    /// Stop expanding below this world height.
    pub fn with_floor(mut self, floor: i32) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Run to exhaustion from `seed` (grid x/z, world y).
    ///
    /// `on_progress` receives the running count at most once per progress
    /// interval. A seed outside the grid visits nothing.
    pub fn run(&self, seed: IVec3, mut on_progress: impl FnMut(u64)) -> FloodFillOutcome {
        let _span = tracing::debug_span!("flood_fill", target = %self.target).entered();
        let y_offset = IVec3::new(0, self.grid.min_y(), 0);
        let mut markers = VisitedMarkers::new(self.grid.extent());
        let mut frontier = VecDeque::new();
        if markers.mark(seed - y_offset) {
            frontier.push_back(seed);
        }

        let mut outcome = FloodFillOutcome {
            count: 0,
            visited: 0,
        };
        let mut last_report = Instant::now();

        while let Some(pos) = frontier.pop_front() {
            outcome.visited += 1;
            if outcome.visited % CLOCK_STRIDE == 0 && last_report.elapsed() >= self.progress_interval {
                last_report = Instant::now();
                on_progress(outcome.count);
            }

            let Some(object) = self
                .grid
                .sample_at(pos)
                .and_then(|id| self.classifier.classify_block(id))
            else {
                continue;
            };
            if pos.y < self.floor {
                continue;
            }

            for offset in NEIGHBOURS {
                let next = pos + offset;
                if markers.mark(next - y_offset) {
                    frontier.push_back(next);
                }
            }

            if object == self.target {
                outcome.count += 1;
            }
        }

        tracing::debug!(count = outcome.count, visited = outcome.visited, "flood fill finished");
        outcome
    }
}

/// Everything a background flood fill needs, owned.
#[derive(Debug, Clone)]
pub struct FloodFillRequest {
    pub grid: SnapshotGrid,
    pub classifier: Classifier,
    pub seed: IVec3,
    pub target: ScanObject,
    pub floor: Option<i32>,
    pub progress_interval: Duration,
}

/// Run a flood fill on the runtime's blocking pool.
///
/// `on_progress` gets the running count on the progress cadence and
/// `on_complete` the final count, both from the worker thread. The handle
/// resolves to the same final count. A non-block target is rejected before
/// anything is spawned.
pub fn submit_flood_fill(
    runtime: &Handle,
    request: FloodFillRequest,
    on_progress: impl FnMut(u64) + Send + 'static,
    on_complete: impl FnOnce(u64) + Send + 'static,
) -> Result<JoinHandle<u64>, ScanError> {
    if !request.target.is_block() {
        return Err(ScanError::NonBlockTarget(request.target));
    }
    Ok(runtime.spawn_blocking(move || {
        let FloodFillRequest {
            grid,
            classifier,
            seed,
            target,
            floor,
            progress_interval,
        } = request;
        // target was checked above
        let fill = FloodFill {
            grid: &grid,
            classifier: &classifier,
            target,
            floor: floor.unwrap_or(grid.min_y()),
            progress_interval,
        };
        let outcome = fill.run(seed, on_progress);
        on_complete(outcome.count);
        outcome.count
    }))
}
