use std::collections::VecDeque;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use crate::resampler::ResampleError;
/// One raw measurement on the pipeline timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSample {
    /// Absolute time in seconds.
    pub timestamp: f64,
    pub value: f64,
}
impl RawSample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.value.is_finite()
    }
}
/// Samples of one transport packet, timed relative to the packet's base.
#[derive(Clone, Debug, Default)]
pub struct SamplePacket {
    pub base_timestamp: f64,
    pub samples: Vec<(f64, f64)>, // (offset seconds, value)
}
impl SamplePacket {
    pub fn new(base_timestamp: f64) -> Self {
        Self {
            base_timestamp,
            samples: Vec::new(),
        }
    }
    pub fn push(&mut self, offset_secs: f64, value: f64) {
        self.samples.push((offset_secs, value));
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    /// Converts relative offsets into absolute timestamps.
    pub fn into_samples(self) -> Vec<RawSample> {
        let base = self.base_timestamp;
        self.samples
            .into_iter()
            .map(|(offset, value)| RawSample::new(base + offset, value))
            .collect()
    }
}
/// Something the worker can pull raw samples from.
pub trait SampleSource {
    /// Moves every currently pending sample into `out` and returns how many
    /// were added. Appends; does not clear `out`.
    fn drain_into(&mut self, out: &mut Vec<RawSample>) -> usize;
}
/// Creates the multi-producer ingestion queue.
pub fn ingestion_queue() -> (SampleSink, IngestionQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (SampleSink { tx }, IngestionQueue { rx })
}
/// Producer side of the ingestion queue. Cheap to clone, one per producer.
///
/// Sends never block and never drop: the queue is unbounded and drained
/// completely by the worker on every cycle.
#[derive(Clone, Debug)]
pub struct SampleSink {
    tx: Sender<RawSample>,
}
impl SampleSink {
    pub fn enqueue(&self, sample: RawSample) -> Result<(), ResampleError> {
        self.tx
            .send(sample)
            .map_err(|_| ResampleError::PipelineClosed)
    }
    pub fn enqueue_batch(
        &self,
        samples: impl IntoIterator<Item = RawSample>,
    ) -> Result<usize, ResampleError> {
        let mut sent = 0;
        for sample in samples {
            self.enqueue(sample)?;
            sent += 1;
        }
        Ok(sent)
    }
    pub fn enqueue_packet(&self, packet: SamplePacket) -> Result<usize, ResampleError> {
        self.enqueue_batch(packet.into_samples())
    }
}
/// Consumer side of the ingestion queue, owned by the worker.
#[derive(Debug)]
pub struct IngestionQueue {
    rx: Receiver<RawSample>,
}
impl IngestionQueue {
    /// Removes everything queued at the moment of the call, in arrival order.
    /// Samples enqueued while draining are left for the next call.
    pub fn drain_all(&self) -> Vec<RawSample> {
        let mut out = Vec::with_capacity(self.rx.len());
        self.drain_pending(&mut out);
        out
    }
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
    fn drain_pending(&self, out: &mut Vec<RawSample>) -> usize {
        let pending = self.rx.len();
        let mut taken = 0;
        while taken < pending {
            match self.rx.try_recv() {
                Ok(sample) => {
                    out.push(sample);
                    taken += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        taken
    }
}
impl SampleSource for IngestionQueue {
    fn drain_into(&mut self, out: &mut Vec<RawSample>) -> usize {
        self.drain_pending(out)
    }
}
/// In-memory source handing out one scripted burst per drain.
pub struct ManualSource {
    queue: VecDeque<Vec<RawSample>>,
}
impl ManualSource {
    pub fn new(bursts: impl IntoIterator<Item = Vec<RawSample>>) -> Self {
        Self {
            queue: bursts.into_iter().collect(),
        }
    }
    pub fn push_burst(&mut self, burst: Vec<RawSample>) {
        self.queue.push_back(burst);
    }
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
impl SampleSource for ManualSource {
    fn drain_into(&mut self, out: &mut Vec<RawSample>) -> usize {
        let Some(burst) = self.queue.pop_front() else {
            return 0;
        };
        let count = burst.len();
        out.extend(burst);
        count
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    #[test]
    fn packet_offsets_become_absolute_timestamps() {
        let mut packet = SamplePacket::new(10.0);
        packet.push(0.0, 1.0);
        packet.push(0.004, 1.2);
        let samples = packet.into_samples();
        assert_eq!(samples[0], RawSample::new(10.0, 1.0));
        assert!((samples[1].timestamp - 10.004).abs() < 1e-12);
        assert_eq!(samples[1].value, 1.2);
    }
    #[test]
    fn drain_all_preserves_order_and_empties_queue() {
        let (sink, queue) = ingestion_queue();
        for i in 0..5 {
            sink.enqueue(RawSample::new(i as f64, i as f64 * 2.0)).unwrap();
        }
        let drained = queue.drain_all();
        assert_eq!(drained.len(), 5);
        assert!(drained
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp));
        assert!(queue.drain_all().is_empty());
        assert_eq!(queue.pending(), 0);
    }
    #[test]
    fn concurrent_producers_lose_nothing() {
        let (sink, queue) = ingestion_queue();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        sink.enqueue(RawSample::new(p as f64 * 1000.0 + i as f64, p as f64))
                            .unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        let drained = queue.drain_all();
        assert_eq!(drained.len(), 1000);
        for p in 0..4 {
            let own: Vec<f64> = drained
                .iter()
                .filter(|s| s.value == p as f64)
                .map(|s| s.timestamp)
                .collect();
            assert_eq!(own.len(), 250);
            assert!(own.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
    #[test]
    fn enqueue_fails_once_queue_is_gone() {
        let (sink, queue) = ingestion_queue();
        drop(queue);
        assert!(matches!(
            sink.enqueue(RawSample::new(0.0, 0.0)),
            Err(ResampleError::PipelineClosed)
        ));
    }
    #[test]
    fn manual_source_yields_one_burst_per_drain() {
        let mut source = ManualSource::new(vec![
            vec![RawSample::new(0.0, 1.0), RawSample::new(0.1, 2.0)],
            vec![],
        ]);
        let mut out = Vec::new();
        assert_eq!(source.drain_into(&mut out), 2);
        assert_eq!(source.drain_into(&mut out), 0);
        assert_eq!(source.drain_into(&mut out), 0);
        assert_eq!(out.len(), 2);
        assert_eq!(source.remaining(), 0);
    }
}
