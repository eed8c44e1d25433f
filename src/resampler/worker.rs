use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, error, info, warn};
use crate::resampler::{
    Clock, Delivery, HistoryBuffer, HistorySnapshot, LanczosKernel, OutputStream, RawSample,
    ResampledPoint, ResamplerConfig, SampleSource,
};
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Draining = 1,
    Merging = 2,
    Advancing = 3,
    Stopped = 4,
}
impl WorkerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => WorkerState::Draining,
            2 => WorkerState::Merging,
            3 => WorkerState::Advancing,
            4 => WorkerState::Stopped,
            _ => WorkerState::Idle,
        }
    }
}
/// Counters published by the worker for monitoring.
#[derive(Debug, Default)]
pub struct WorkerStats {
    samples_ingested: AtomicU64,
    samples_discarded: AtomicU64,
    samples_pruned: AtomicU64,
    points_emitted: AtomicU64,
    points_dropped: AtomicU64,
    fallbacks: AtomicU64,
    cycles: AtomicU64,
    cycle_panics: AtomicU64,
    lag_micros: AtomicI64,
    state: AtomicU8,
}
/// Point-in-time copy of [`WorkerStats`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsSnapshot {
    pub samples_ingested: u64,
    pub samples_discarded: u64,
    pub samples_pruned: u64,
    pub points_emitted: u64,
    pub points_dropped: u64,
    pub fallbacks: u64,
    pub cycles: u64,
    pub cycle_panics: u64,
    /// Distance between the latency horizon and the newest emitted grid point.
    pub lag_secs: f64,
    pub state: WorkerState,
}
impl WorkerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            samples_discarded: self.samples_discarded.load(Ordering::Relaxed),
            samples_pruned: self.samples_pruned.load(Ordering::Relaxed),
            points_emitted: self.points_emitted.load(Ordering::Relaxed),
            points_dropped: self.points_dropped.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
            cycle_panics: self.cycle_panics.load(Ordering::Relaxed),
            lag_secs: self.lag_micros.load(Ordering::Relaxed) as f64 * 1e-6,
            state: self.state(),
        }
    }
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }
    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }
    fn add(counter: &AtomicU64, n: usize) {
        if n > 0 {
            counter.fetch_add(n as u64, Ordering::Relaxed);
        }
    }
}
/// Result of a single [`ResamplingWorker::run_cycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was pending; buffer and cursor untouched.
    Idle,
    Advanced {
        merged: usize,
        pruned: usize,
        emitted: usize,
    },
}
/// Single writer of the history buffer and the resampling cursor.
pub struct ResamplingWorker<S: SampleSource> {
    source: S,
    history: HistoryBuffer,
    kernel: LanczosKernel,
    output: OutputStream,
    clock: Arc<dyn Clock>,
    grid_period: f64,
    latency_margin: f64,
    retention: f64,
    idle_backoff: Duration,
    // Grid index of the last emitted point; `None` until the first data.
    cursor: Option<i64>,
    last_value: Option<f64>,
    scratch: Vec<RawSample>,
    stats: Arc<WorkerStats>,
    consumers_gone: bool,
}
impl<S: SampleSource> ResamplingWorker<S> {
    pub fn new(
        config: &ResamplerConfig,
        source: S,
        output: OutputStream,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            history: HistoryBuffer::new(config.retention_secs),
            kernel: LanczosKernel::from_config(config),
            output,
            clock,
            grid_period: config.grid_period_secs(),
            latency_margin: config.latency_margin_secs,
            retention: config.retention_secs,
            idle_backoff: config.idle_backoff(),
            cursor: None,
            last_value: None,
            scratch: Vec::new(),
            stats: Arc::new(WorkerStats::default()),
            consumers_gone: false,
        }
    }
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }
    /// Timestamp of the last emitted grid point.
    pub fn last_resample_time(&self) -> Option<f64> {
        self.cursor.map(|k| self.grid_time(k))
    }
    /// Drain, merge, then advance the cursor up to `now - latency_margin`.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.cycles.fetch_add(1, Ordering::Relaxed);
        self.stats.set_state(WorkerState::Draining);
        self.scratch.clear();
        let drained = self.source.drain_into(&mut self.scratch);
        if drained == 0 {
            self.stats.set_state(WorkerState::Idle);
            return CycleOutcome::Idle;
        }
        WorkerStats::add(&self.stats.samples_ingested, drained);
        self.stats.set_state(WorkerState::Merging);
        let now = self.clock.now();
        let report = self.history.merge(self.scratch.drain(..), now);
        WorkerStats::add(&self.stats.samples_discarded, report.discarded);
        WorkerStats::add(&self.stats.samples_pruned, report.pruned);
        if report.discarded > 0 {
            warn!("discarded {} non-finite raw samples", report.discarded);
        }
        self.stats.set_state(WorkerState::Advancing);
        let emitted = self.advance(now);
        self.stats.set_state(WorkerState::Idle);
        debug!(
            "cycle: merged {} pruned {} emitted {} (history {})",
            report.accepted,
            report.pruned,
            emitted,
            self.history.len()
        );
        CycleOutcome::Advanced {
            merged: report.accepted,
            pruned: report.pruned,
            emitted,
        }
    }
    /// Runs cycles until `stop` receives a message or is disconnected.
    ///
    /// A panicking cycle is logged and skipped; the loop keeps going.
    pub fn run(mut self, stop: Receiver<()>) {
        info!(
            "resampling worker started: {:.1} Hz grid, {:.1} Hz cutoff, {:.0} ms half-width",
            1.0 / self.grid_period,
            self.kernel.cutoff_hz(),
            self.kernel.half_width_secs() * 1e3
        );
        loop {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle()));
            let idle = match outcome {
                Ok(CycleOutcome::Idle) => true,
                Ok(CycleOutcome::Advanced { .. }) => false,
                Err(_) => {
                    self.stats.cycle_panics.fetch_add(1, Ordering::Relaxed);
                    self.stats.set_state(WorkerState::Idle);
                    error!("resampling cycle panicked; skipping it");
                    true
                }
            };
            if idle {
                crossbeam_channel::select! {
                    recv(stop) -> _ => break,
                    default(self.idle_backoff) => {}
                }
            } else {
                match stop.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }
            }
        }
        self.stats.set_state(WorkerState::Stopped);
        info!("resampling worker stopped");
    }
    fn grid_time(&self, k: i64) -> f64 {
        k as f64 * self.grid_period
    }
    fn grid_floor(&self, t: f64) -> i64 {
        (t / self.grid_period).floor() as i64
    }
    /// Emits every grid point up to `now - latency_margin`, one period apart.
    ///
    /// The one exception to that spacing: a cursor more than the retention
    /// window behind the horizon is moved forward, leaving a gap in the
    /// emitted timestamps instead of a run of points with no support.
    fn advance(&mut self, now: f64) -> usize {
        let snapshot = self.history.snapshot();
        let Some(oldest) = snapshot.oldest() else {
            return 0;
        };
        let horizon = now - self.latency_margin;
        let mut k = match self.cursor {
            Some(k) => k,
            None => {
                let seeded = self.grid_floor(oldest.timestamp) - 1;
                info!(
                    "resampling cursor initialised at {:.3}s",
                    self.grid_time(seeded)
                );
                seeded
            }
        };
        // No support survives past the retention window; jump forward instead
        // of emitting a run of fallback points.
        let earliest_supported = horizon - self.retention;
        if self.grid_time(k) < earliest_supported {
            let reseeded = (self.grid_floor(earliest_supported) - 1).max(k);
            if reseeded > k {
                warn!(
                    "resampling cursor lagged {:.3}s behind; skipping to {:.3}s",
                    horizon - self.grid_time(k),
                    self.grid_time(reseeded)
                );
                k = reseeded;
            }
        }
        self.cursor = Some(k);
        let emitted = self.emit_until(horizon, &snapshot);
        if let Some(k) = self.cursor {
            let lag = horizon - self.grid_time(k);
            self.stats
                .lag_micros
                .store((lag * 1e6) as i64, Ordering::Relaxed);
        }
        emitted
    }
    fn emit_until(&mut self, horizon: f64, snapshot: &HistorySnapshot) -> usize {
        let Some(mut k) = self.cursor else {
            return 0;
        };
        let mut emitted = 0;
        let mut evicted = 0;
        let mut undelivered = 0;
        while self.grid_time(k + 1) <= horizon {
            k += 1;
            let t = self.grid_time(k);
            let estimate =
                self.kernel
                    .interpolate(t, snapshot.samples(), self.last_value.unwrap_or(0.0));
            if estimate.is_fallback() {
                self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
            }
            let value = estimate.value();
            self.last_value = Some(value);
            self.cursor = Some(k);
            emitted += 1;
            match self.output.push(ResampledPoint {
                timestamp: t,
                value,
            }) {
                Delivery::Queued => {}
                Delivery::QueuedDroppingOldest(dropped) => evicted += dropped,
                Delivery::NoConsumers => undelivered += 1,
            }
        }
        WorkerStats::add(&self.stats.points_dropped, evicted + undelivered);
        if evicted > 0 {
            warn!("output stream full; dropped {evicted} oldest point(s)");
        }
        if undelivered > 0 && !self.consumers_gone {
            warn!("output stream has no consumers; discarding resampled points");
        }
        if emitted > 0 {
            self.consumers_gone = undelivered > 0;
        }
        WorkerStats::add(&self.stats.points_emitted, emitted);
        emitted
    }
}
