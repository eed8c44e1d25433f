use std::sync::{Arc, Weak};
use std::time::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
/// A reconstructed value on the output grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampledPoint {
    /// `k * grid_period` seconds on the pipeline timeline.
    pub timestamp: f64,
    pub value: f64,
}
/// What happened to a pushed point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queued after evicting this many unconsumed points.
    QueuedDroppingOldest(usize),
    /// Every consumer is gone; the point was discarded.
    NoConsumers,
}
/// Creates the output stream. `capacity: None` selects an unbounded channel.
pub fn output_stream(capacity: Option<usize>) -> (OutputStream, PointReceiver) {
    let (tx, rx) = match capacity {
        Some(capacity) => crossbeam_channel::bounded(capacity.max(1)),
        None => crossbeam_channel::unbounded(),
    };
    let alive = Arc::new(());
    let stream = OutputStream {
        tx,
        evict: capacity.map(|_| rx.clone()),
        consumers: Arc::downgrade(&alive),
    };
    (stream, PointReceiver { rx, _alive: alive })
}
/// Producer side, held by the worker. Never blocks.
#[derive(Debug)]
pub struct OutputStream {
    tx: Sender<ResampledPoint>,
    // Receiver used to evict the oldest point when a bounded channel is full.
    // It keeps the channel connected, so liveness is tracked by `consumers`.
    evict: Option<Receiver<ResampledPoint>>,
    consumers: Weak<()>,
}
impl OutputStream {
    pub fn push(&self, point: ResampledPoint) -> Delivery {
        if !self.has_consumers() {
            return Delivery::NoConsumers;
        }
        let mut point = point;
        let mut dropped = 0;
        loop {
            match self.tx.try_send(point) {
                Ok(()) if dropped == 0 => return Delivery::Queued,
                Ok(()) => return Delivery::QueuedDroppingOldest(dropped),
                Err(TrySendError::Full(rejected)) => {
                    point = rejected;
                    let Some(evict) = &self.evict else {
                        return Delivery::NoConsumers;
                    };
                    // A consumer may have emptied a slot in the meantime.
                    if evict.try_recv().is_ok() {
                        dropped += 1;
                    }
                }
                Err(TrySendError::Disconnected(_)) => return Delivery::NoConsumers,
            }
        }
    }
    /// False once every [`PointReceiver`] clone has been dropped.
    pub fn has_consumers(&self) -> bool {
        self.consumers.strong_count() > 0
    }
    pub fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }
    pub fn len(&self) -> usize {
        self.tx.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}
/// Consumer side, handed to the rendering layer. Clones share one queue:
/// each point goes to exactly one of them.
#[derive(Clone, Debug)]
pub struct PointReceiver {
    rx: Receiver<ResampledPoint>,
    _alive: Arc<()>,
}
impl PointReceiver {
    pub fn try_recv(&self) -> Option<ResampledPoint> {
        self.rx.try_recv().ok()
    }
    /// Waits up to `timeout` for the next point. `None` on timeout or once the
    /// worker is gone and the queue is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ResampledPoint> {
        match self.rx.recv_timeout(timeout) {
            Ok(point) => Some(point),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
    /// Everything currently queued, in emission order.
    pub fn drain(&self) -> Vec<ResampledPoint> {
        self.rx.try_iter().collect()
    }
    pub fn len(&self) -> usize {
        self.rx.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn point(k: u32) -> ResampledPoint {
        ResampledPoint {
            timestamp: k as f64 * 0.01,
            value: k as f64,
        }
    }
    #[test]
    fn bounded_stream_drops_oldest_when_full() {
        let (stream, points) = output_stream(Some(3));
        for k in 0..3 {
            assert_eq!(stream.push(point(k)), Delivery::Queued);
        }
        assert_eq!(stream.push(point(3)), Delivery::QueuedDroppingOldest(1));
        assert_eq!(stream.push(point(4)), Delivery::QueuedDroppingOldest(1));
        let values: Vec<f64> = points.drain().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(stream.capacity(), Some(3));
    }
    #[test]
    fn unbounded_stream_keeps_everything() {
        let (stream, points) = output_stream(None);
        for k in 0..10_000 {
            assert_eq!(stream.push(point(k)), Delivery::Queued);
        }
        assert_eq!(points.len(), 10_000);
        assert_eq!(points.try_recv(), Some(point(0)));
        assert_eq!(stream.capacity(), None);
    }
    #[test]
    fn unbounded_stream_reports_missing_consumers() {
        let (stream, points) = output_stream(None);
        drop(points);
        assert_eq!(stream.push(point(0)), Delivery::NoConsumers);
    }
    #[test]
    fn bounded_stream_reports_missing_consumers() {
        let (stream, points) = output_stream(Some(2));
        let second = points.clone();
        drop(points);
        assert!(stream.has_consumers());
        assert_eq!(stream.push(point(0)), Delivery::Queued);
        drop(second);
        assert!(!stream.has_consumers());
        for k in 1..10 {
            assert_eq!(stream.push(point(k)), Delivery::NoConsumers);
        }
    }
    #[test]
    fn receiver_times_out_when_idle() {
        let (_stream, points) = output_stream(Some(4));
        assert_eq!(points.recv_timeout(Duration::from_millis(5)), None);
        assert!(points.is_empty());
    }
}
