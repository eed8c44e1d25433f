use std::collections::VecDeque;
use std::sync::Arc;
use crate::resampler::RawSample;
/// Outcome of a [`HistoryBuffer::merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub accepted: usize,
    /// Samples dropped because their timestamp or value was not finite.
    pub discarded: usize,
    pub pruned: usize,
}
/// Immutable, timestamp-sorted copy of the history.
#[derive(Clone, Debug)]
pub struct HistorySnapshot {
    samples: Arc<[RawSample]>,
}
impl HistorySnapshot {
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn oldest(&self) -> Option<RawSample> {
        self.samples.first().copied()
    }
    pub fn newest(&self) -> Option<RawSample> {
        self.samples.last().copied()
    }
}
/// Time-bounded, sorted store of raw samples used as interpolation support.
///
/// Owned and mutated by the resampling worker only.
#[derive(Debug)]
pub struct HistoryBuffer {
    samples: VecDeque<RawSample>,
    retention_secs: f64,
}
impl HistoryBuffer {
    pub fn new(retention_secs: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            retention_secs,
        }
    }
    pub fn retention_secs(&self) -> f64 {
        self.retention_secs
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn oldest(&self) -> Option<RawSample> {
        self.samples.front().copied()
    }
    pub fn newest(&self) -> Option<RawSample> {
        self.samples.back().copied()
    }
    /// Appends a batch, restores timestamp order with a stable sort and drops
    /// everything older than `now - retention`.
    ///
    /// A batch without any finite sample leaves the buffer untouched.
    pub fn merge(
        &mut self,
        batch: impl IntoIterator<Item = RawSample>,
        now: f64,
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let mut tail = self.samples.back().map(|s| s.timestamp);
        let mut out_of_order = false;
        for sample in batch {
            if !sample.is_finite() {
                report.discarded += 1;
                continue;
            }
            if tail.is_some_and(|t| sample.timestamp < t) {
                out_of_order = true;
            }
            tail = Some(sample.timestamp);
            self.samples.push_back(sample);
            report.accepted += 1;
        }
        if report.accepted == 0 {
            return report;
        }
        // Already-ordered appends sort to themselves; skip the work.
        if out_of_order {
            self.samples
                .make_contiguous()
                .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        }
        report.pruned = self.prune(now);
        report
    }
    /// Removes the prefix of samples older than `now - retention`.
    pub fn prune(&mut self, now: f64) -> usize {
        let threshold = now - self.retention_secs;
        let stale = self.samples.partition_point(|s| s.timestamp < threshold);
        self.samples.drain(..stale);
        stale
    }
    pub fn snapshot(&self) -> HistorySnapshot {
        let samples: Vec<RawSample> = self.samples.iter().copied().collect();
        HistorySnapshot {
            samples: samples.into(),
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn timestamps(buffer: &HistoryBuffer) -> Vec<f64> {
        buffer.snapshot().samples().iter().map(|s| s.timestamp).collect()
    }
    #[test]
    fn merge_restores_order_across_interleaved_batches() {
        let mut buffer = HistoryBuffer::new(10.0);
        buffer.merge(
            vec![RawSample::new(0.0, 0.0), RawSample::new(0.2, 2.0)],
            0.2,
        );
        let report = buffer.merge(
            vec![RawSample::new(0.1, 1.0), RawSample::new(0.3, 3.0)],
            0.3,
        );
        assert_eq!(report.accepted, 2);
        assert_eq!(timestamps(&buffer), vec![0.0, 0.1, 0.2, 0.3]);
    }
    #[test]
    fn merge_is_stable_for_equal_timestamps() {
        let mut buffer = HistoryBuffer::new(10.0);
        buffer.merge(vec![RawSample::new(0.5, 1.0)], 0.5);
        buffer.merge(
            vec![RawSample::new(0.5, 2.0), RawSample::new(0.1, 0.0)],
            0.5,
        );
        let values: Vec<f64> = buffer.snapshot().samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);
    }
    #[test]
    fn merge_prunes_samples_outside_retention() {
        let mut buffer = HistoryBuffer::new(1.0);
        buffer.merge(
            (0..10).map(|i| RawSample::new(i as f64 * 0.25, i as f64)),
            2.25,
        );
        let report = buffer.merge(vec![RawSample::new(2.5, 10.0)], 2.5);
        assert_eq!(report.pruned, 1);
        assert_eq!(buffer.oldest().map(|s| s.timestamp), Some(1.5));
        assert!(buffer
            .snapshot()
            .samples()
            .iter()
            .all(|s| s.timestamp >= 2.5 - 1.0));
    }
    #[test]
    fn pruning_twice_is_idempotent() {
        let mut buffer = HistoryBuffer::new(0.5);
        buffer.merge(
            (0..20).map(|i| RawSample::new(i as f64 * 0.1, 1.0)),
            1.0,
        );
        buffer.prune(1.7);
        let once = timestamps(&buffer);
        assert_eq!(buffer.prune(1.7), 0);
        assert_eq!(timestamps(&buffer), once);
    }
    #[test]
    fn non_finite_samples_are_discarded() {
        let mut buffer = HistoryBuffer::new(10.0);
        let report = buffer.merge(
            vec![
                RawSample::new(0.0, f64::NAN),
                RawSample::new(f64::INFINITY, 1.0),
                RawSample::new(0.1, 1.0),
            ],
            0.1,
        );
        assert_eq!(report.accepted, 1);
        assert_eq!(report.discarded, 2);
        assert_eq!(buffer.len(), 1);
    }
    #[test]
    fn empty_batch_leaves_buffer_untouched() {
        let mut buffer = HistoryBuffer::new(1.0);
        buffer.merge(vec![RawSample::new(0.0, 1.0)], 0.0);
        let report = buffer.merge(Vec::new(), 100.0);
        assert_eq!(report, MergeReport::default());
        assert_eq!(buffer.len(), 1);
    }
    #[test]
    fn snapshot_is_detached_from_later_merges() {
        let mut buffer = HistoryBuffer::new(10.0);
        buffer.merge(vec![RawSample::new(0.0, 1.0)], 0.0);
        let snapshot = buffer.snapshot();
        buffer.merge(vec![RawSample::new(0.1, 2.0)], 0.1);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.snapshot().len(), 2);
        assert_eq!(snapshot.newest(), Some(RawSample::new(0.0, 1.0)));
    }
}
