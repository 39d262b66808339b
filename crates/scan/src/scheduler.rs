//! Incremental bulk scans driven by the host's tick loop.
//!
//! # Invariants
//! - A tick never blocks: it only drains finished region scans, reports, and
//!   dispatches new ones.
//! - In-flight region scans per bulk scan never exceed `chunks_per_iteration`.
//! - The completion callback fires exactly once per accepted submission.

use blockcensus_common::{ChunkLocation, ChunkPart, ScanOptions, ScannerId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ScanConfig;
use crate::error::{ConfigError, ScanError};
use crate::executor::{RegionExecutor, RegionResult, RegionScan};
use crate::registry::{ScannerGuard, ScannerRegistry};
use crate::storage::AggregateStorage;

/// Progress snapshot of one bulk scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub chunks_done: usize,
    pub chunks_total: usize,
    /// Regions counted as done with no contribution after a load or worker failure.
    pub failed: usize,
}

impl ScanProgress {
    /// Completed fraction in `0.0..=1.0`. An empty scan is complete.
    pub fn fraction(&self) -> f64 {
        if self.chunks_total == 0 {
            return 1.0;
        }
        (self.chunks_done as f64 / self.chunks_total as f64).clamp(0.0, 1.0)
    }
}

/// What the completion callback receives.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub storage: AggregateStorage,
    pub progress: ScanProgress,
    pub elapsed: Duration,
    /// True when `max_scan_duration` cut the scan short.
    pub forced: bool,
}

/// Lifecycle of one bulk scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Accepted, not ticked yet.
    Idle,
    Running,
    Completing,
    Done,
}

pub type ProgressCallback = Box<dyn FnMut(ScanProgress) + Send>;
pub type CompletionCallback = Box<dyn FnOnce(ScanOutcome) + Send>;

/// Per-scan mutable state, touched only from the scheduling context.
struct ScanTaskState {
    queue: VecDeque<ChunkPart>,
    in_flight: Vec<RegionScan>,
    chunks_done: usize,
    chunks_total: usize,
    failed: usize,
    /// Dispatch capacity handed back by resolved region scans.
    recovered: usize,
    storage: AggregateStorage,
    started: Instant,
    last_progress: Option<Instant>,
    phase: ScanPhase,
}

impl ScanTaskState {
    fn progress(&self) -> ScanProgress {
        ScanProgress {
            chunks_done: self.chunks_done,
            chunks_total: self.chunks_total,
            failed: self.failed,
        }
    }
}

struct ScanTask {
    state: ScanTaskState,
    options: ScanOptions,
    on_progress: ProgressCallback,
    on_complete: Option<CompletionCallback>,
    guard: Option<ScannerGuard>,
}

impl ScanTask {
    /// Fold every resolved region scan into the running aggregate.
    fn drain_resolved(&mut self) {
        let mut i = 0;
        while i < self.state.in_flight.len() {
            match self.state.in_flight[i].try_take() {
                None => i += 1,
                Some(result) => {
                    let scan = self.state.in_flight.swap_remove(i);
                    self.absorb(scan.location(), result);
                }
            }
        }
    }

    fn absorb(&mut self, location: ChunkLocation, result: RegionResult) {
        match result {
            Ok(storage) => {
                tracing::trace!(%location, objects = storage.len(), "region merged");
                self.state.storage.merge_right(storage);
            }
            Err(e) => {
                tracing::warn!(%location, error = %e, "region skipped");
                self.state.failed += 1;
            }
        }
        self.state.chunks_done += 1;
        self.state.recovered += 1;
    }

    fn report_progress(&mut self, now: Instant) {
        self.state.last_progress = Some(now);
        (self.on_progress)(self.state.progress());
    }

    fn complete(&mut self, now: Instant, forced: bool) {
        self.state.phase = ScanPhase::Completing;
        self.report_progress(now);
        // Release the identifier first so the callback may start a new scan.
        self.guard = None;
        self.state.in_flight.clear();
        let outcome = ScanOutcome {
            storage: std::mem::take(&mut self.state.storage),
            progress: self.state.progress(),
            elapsed: now.duration_since(self.state.started),
            forced,
        };
        tracing::info!(
            done = outcome.progress.chunks_done,
            total = outcome.progress.chunks_total,
            failed = outcome.progress.failed,
            forced,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "scan complete"
        );
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(outcome);
        }
        self.state.phase = ScanPhase::Done;
    }

    /// Advance one scheduling step.
    fn tick(&mut self, executor: &dyn RegionExecutor, config: &ScanConfig, now: Instant) {
        if self.state.phase == ScanPhase::Done {
            return;
        }
        self.state.phase = ScanPhase::Running;
        self.drain_resolved();

        let due = self
            .state
            .last_progress
            .is_none_or(|last| now.duration_since(last) >= config.progress_interval());
        if due {
            self.report_progress(now);
        }

        if self.state.chunks_done == self.state.chunks_total {
            self.complete(now, false);
            return;
        }

        if let Some(limit) = config.max_scan_duration() {
            if now.duration_since(self.state.started) >= limit {
                tracing::warn!(
                    done = self.state.chunks_done,
                    total = self.state.chunks_total,
                    "scan exceeded its maximum duration, completing with partial results"
                );
                self.complete(now, true);
                return;
            }
        }

        let budget = self.state.recovered.min(config.chunks_per_iteration);
        if budget == 0 {
            return;
        }
        self.state.recovered -= budget;

        let mut dispatched = 0;
        while dispatched < budget {
            let Some(part) = self.state.queue.pop_front() else {
                break;
            };
            self.state.in_flight.push(executor.submit(&part, &self.options));
            dispatched += 1;
        }
        self.state.recovered += budget - dispatched;
        tracing::trace!(
            budget,
            dispatched,
            in_flight = self.state.in_flight.len(),
            queued = self.state.queue.len(),
            "scan tick"
        );
    }
}

/// Owns every active bulk scan and advances them on each host tick.
pub struct ScanScheduler {
    executor: Arc<dyn RegionExecutor>,
    registry: ScannerRegistry,
    config: ScanConfig,
    tasks: HashMap<ScannerId, ScanTask>,
}

impl ScanScheduler {
    /// Fails when `config` does not pass [`ScanConfig::validate`].
    pub fn new(
        executor: Arc<dyn RegionExecutor>,
        registry: ScannerRegistry,
        config: ScanConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            executor,
            registry,
            config,
            tasks: HashMap::new(),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn registry(&self) -> &ScannerRegistry {
        &self.registry
    }

    /// Queue a bulk scan for `id`.
    ///
    /// Fails with [`ScanError::AlreadyScanning`] if `id` already has a scan in
    /// progress; nothing is created in that case. An empty collection of
    /// parts completes before this returns.
    pub fn submit_scan(
        &mut self,
        id: ScannerId,
        parts: impl IntoIterator<Item = ChunkPart>,
        options: ScanOptions,
        on_progress: impl FnMut(ScanProgress) + Send + 'static,
        on_complete: impl FnOnce(ScanOutcome) + Send + 'static,
    ) -> Result<(), ScanError> {
        let guard = self.registry.try_acquire(id)?;
        let queue: VecDeque<ChunkPart> = parts.into_iter().collect();
        let now = Instant::now();

        let mut task = ScanTask {
            state: ScanTaskState {
                chunks_total: queue.len(),
                queue,
                in_flight: Vec::new(),
                chunks_done: 0,
                failed: 0,
                recovered: self.config.chunks_per_iteration,
                storage: AggregateStorage::new(),
                started: now,
                last_progress: None,
                phase: ScanPhase::Idle,
            },
            options,
            on_progress: Box::new(on_progress),
            on_complete: Some(Box::new(on_complete)),
            guard: Some(guard),
        };

        if task.state.chunks_total == 0 {
            task.complete(now, false);
            return Ok(());
        }

        tracing::info!(%id, chunks = task.state.chunks_total, "scan submitted");
        self.tasks.insert(id, task);
        Ok(())
    }

    /// Advance every active scan by one step. Call once per host tick.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// [`tick`](Self::tick) with an explicit clock reading.
    pub fn tick_at(&mut self, now: Instant) {
        let _span = tracing::debug_span!("scan_tick", active = self.tasks.len()).entered();
        let executor = self.executor.as_ref();
        for task in self.tasks.values_mut() {
            task.tick(executor, &self.config, now);
        }
        self.tasks.retain(|_, task| task.state.phase != ScanPhase::Done);
    }

    /// Drop a scan without completing it.
    ///
    /// In-flight region results are discarded as they arrive and the
    /// completion callback never fires. Returns false if `id` had no scan.
    pub fn cancel(&mut self, id: ScannerId) -> bool {
        match self.tasks.remove(&id) {
            Some(task) => {
                tracing::info!(
                    %id,
                    done = task.state.chunks_done,
                    total = task.state.chunks_total,
                    "scan cancelled"
                );
                true
            }
            None => false,
        }
    }

    pub fn is_scanning(&self, id: ScannerId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn active_scans(&self) -> usize {
        self.tasks.len()
    }

    /// Completed fraction of `id`'s scan, clamped to `0.0..=1.0`.
    pub fn progress(&self, id: ScannerId) -> Option<f64> {
        self.tasks.get(&id).map(|task| task.state.progress().fraction())
    }

    pub fn scan_progress(&self, id: ScannerId) -> Option<ScanProgress> {
        self.tasks.get(&id).map(|task| task.state.progress())
    }

    pub fn elapsed(&self, id: ScannerId) -> Option<Duration> {
        self.tasks.get(&id).map(|task| task.state.started.elapsed())
    }

    pub fn phase(&self, id: ScannerId) -> Option<ScanPhase> {
        self.tasks.get(&id).map(|task| task.state.phase)
    }

    /// Region scans of `id` dispatched but not yet merged.
    pub fn in_flight(&self, id: ScannerId) -> Option<usize> {
        self.tasks.get(&id).map(|task| task.state.in_flight.len())
    }
}
