use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
/// Source of "now", in seconds on the pipeline timeline.
///
/// Raw sample timestamps, grid points and the latency horizon all live on
/// this timeline, so producers must stamp samples with the same clock the
/// worker reads.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}
/// Monotonic clock whose origin is the moment it was created.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}
impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}
/// Clock that only moves when told to. Used for deterministic playback.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}
impl ManualClock {
    pub fn new(start_secs: f64) -> Self {
        Self {
            bits: AtomicU64::new(start_secs.to_bits()),
        }
    }
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::Release);
    }
    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}
impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1.5);
        assert_eq!(clock.now(), 1.5);
        clock.advance(0.25);
        assert_eq!(clock.now(), 1.75);
        clock.set(0.0);
        assert_eq!(clock.now(), 0.0);
    }
    #[test]
    fn monotonic_clock_starts_near_zero() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(first >= 0.0 && first < 1.0);
        assert!(second >= first);
    }
}
