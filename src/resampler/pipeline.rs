use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use crossbeam_channel::Sender;
use log::{info, warn};
use crate::resampler::error::ResampleError;
use crate::resampler::worker::{ResamplingWorker, StatsSnapshot, WorkerState, WorkerStats};
use crate::resampler::{
    ingestion_queue, output_stream, Clock, MonotonicClock, PointReceiver, ResamplerConfig,
    SampleSink,
};
/// High level entry point: validates the config and starts the worker thread.
pub struct ResamplingPipeline {
    config: ResamplerConfig,
    clock: Arc<dyn Clock>,
}
impl ResamplingPipeline {
    pub fn new(config: ResamplerConfig) -> Result<Self, ResampleError> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Arc::new(MonotonicClock::new()),
        })
    }
    /// Replaces the default monotonic clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }
    /// Spawns the resampling worker. Returns the control handle, the producer
    /// sink for raw samples and the consumer end of the output stream.
    pub fn spawn(self) -> Result<(PipelineHandle, SampleSink, PointReceiver), ResampleError> {
        let (sink, queue) = ingestion_queue();
        let (output, points) = output_stream(self.config.output_capacity);
        let worker = ResamplingWorker::new(&self.config, queue, output, Arc::clone(&self.clock));
        let stats = worker.stats();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let join = thread::Builder::new()
            .name("resampler".into())
            .spawn(move || worker.run(stop_rx))
            .map_err(ResampleError::WorkerSpawn)?;
        info!(
            "resampling pipeline spawned ({} Hz output)",
            self.config.target_rate_hz
        );
        let handle = PipelineHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
            stats,
            clock: self.clock,
            grid_period_secs: self.config.grid_period_secs(),
        };
        Ok((handle, sink, points))
    }
}
/// Owner of a running worker thread. Dropping it stops the worker.
pub struct PipelineHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
    clock: Arc<dyn Clock>,
    grid_period_secs: f64,
}
impl PipelineHandle {
    /// The clock producers must use to stamp raw samples.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
    pub fn now(&self) -> f64 {
        self.clock.now()
    }
    pub fn grid_period_secs(&self) -> f64 {
        self.grid_period_secs
    }
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
    pub fn state(&self) -> WorkerState {
        self.stats.state()
    }
    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }
    /// Signals the worker and waits up to `timeout` for it to exit.
    pub fn stop(mut self, timeout: Duration) -> Result<(), ResampleError> {
        self.signal_stop();
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        let deadline = Instant::now() + timeout;
        while !join.is_finished() {
            if Instant::now() >= deadline {
                warn!("resampling worker did not stop within {timeout:?}");
                return Err(ResampleError::StopTimeout(timeout));
            }
            thread::sleep(Duration::from_millis(1));
        }
        join.join().map_err(|_| ResampleError::WorkerPanicked)
    }
    fn signal_stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A full slot means a stop is already pending; dropping the sender
            // disconnects the channel either way.
            let _ = stop_tx.try_send(());
        }
    }
}
impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampler::{ManualClock, RawSample, SamplePacket};
    #[test]
    fn rejects_invalid_config() {
        let config = ResamplerConfig {
            cutoff_hz: 0.0,
            ..Default::default()
        };
        assert!(ResamplingPipeline::new(config).is_err());
    }
    #[test]
    fn pipeline_resamples_packets_end_to_end() {
        let clock = Arc::new(ManualClock::new(0.0));
        let config = ResamplerConfig {
            idle_backoff_ms: 1,
            ..Default::default()
        };
        let (handle, sink, points) = ResamplingPipeline::new(config)
            .unwrap()
            .with_clock(clock.clone())
            .spawn()
            .unwrap();
        assert!(handle.is_running());
        let mut packet = SamplePacket::new(0.0);
        for i in 0..50 {
            packet.push(i as f64 * 0.002, 0.5);
        }
        clock.set(0.125);
        assert_eq!(sink.enqueue_packet(packet).unwrap(), 50);
        let mut received = Vec::new();
        while received.len() < 11 {
            match points.recv_timeout(Duration::from_secs(2)) {
                Some(point) => received.push(point),
                None => break,
            }
        }
        // Horizon 0.105 s: grid points 0..=100 ms.
        assert_eq!(received.len(), 11);
        assert!(received.iter().all(|p| (p.value - 0.5).abs() < 1e-9));
        // The packet may have been split across cycles.
        let deadline = Instant::now() + Duration::from_secs(2);
        while handle.stats().samples_ingested < 50 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(handle.stats().samples_ingested, 50);
        assert!(points.is_empty());
        handle.stop(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            sink.enqueue(RawSample::new(1.0, 1.0)),
            Err(ResampleError::PipelineClosed)
        ));
    }
    #[test]
    fn stop_is_prompt_while_idle() {
        let config = ResamplerConfig {
            idle_backoff_ms: 20,
            ..Default::default()
        };
        let (handle, _sink, _points) = ResamplingPipeline::new(config).unwrap().spawn().unwrap();
        thread::sleep(Duration::from_millis(30));
        let started = Instant::now();
        handle.stop(Duration::from_secs(1)).unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
