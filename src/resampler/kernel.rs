//! Lanczos-windowed sinc reconstruction over irregularly spaced samples.
//!
//! The sinc term is the ideal low-pass for a signal band-limited below the
//! cutoff; the Lanczos window truncates it to `half_width` seconds on either
//! side of the target instant. Everything here is pure: the kernel reads a
//! sorted slice and never fails, degrading to a fallback value instead.
use std::f64::consts::PI;
use crate::resampler::{Normalization, RawSample, ResamplerConfig};
const SINC_EPSILON: f64 = 1e-12;
/// Denominators below this magnitude are treated as degenerate.
const NORMALIZATION_EPSILON: f64 = 1e-9;
/// Smallest accepted `|sum(w)| / sum(|w|)` under signed normalization. A
/// window with samples inside the main lobe stays above ~0.6; one holding
/// only side-lobe samples (a gap, a sparse burst) cancels towards zero.
const MIN_WEIGHT_COHERENCE: f64 = 0.25;
/// Overshoot allowed past the window's value range, as a fraction of its span.
const RANGE_SLACK: f64 = 0.5;
/// `sin(x) / x`, with the removable singularity at zero filled in.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < SINC_EPSILON {
        1.0
    } else {
        x.sin() / x
    }
}
/// Lanczos window on the normalised offset `u = dt / half_width`.
pub fn lanczos(u: f64) -> f64 {
    if u.abs() < SINC_EPSILON {
        1.0
    } else if u.abs() > 1.0 {
        0.0
    } else {
        let pi_u = PI * u;
        pi_u.sin() / pi_u
    }
}
/// Result of one interpolation, tagged with how it was obtained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Estimate {
    /// Weighted sum over the kernel window.
    Reconstructed(f64),
    /// No usable weights; value of the sample closest in time.
    Nearest(f64),
    /// The support set was empty; the caller's default.
    Default(f64),
}
impl Estimate {
    pub fn value(self) -> f64 {
        match self {
            Estimate::Reconstructed(v) | Estimate::Nearest(v) | Estimate::Default(v) => v,
        }
    }
    pub fn is_fallback(self) -> bool {
        !matches!(self, Estimate::Reconstructed(_))
    }
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LanczosKernel {
    cutoff_hz: f64,
    half_width_secs: f64,
    normalization: Normalization,
}
impl LanczosKernel {
    pub fn new(cutoff_hz: f64, half_width_secs: f64, normalization: Normalization) -> Self {
        Self {
            cutoff_hz,
            half_width_secs,
            normalization,
        }
    }
    pub fn from_config(config: &ResamplerConfig) -> Self {
        Self::new(
            config.cutoff_hz,
            config.kernel_half_width_secs,
            config.normalization,
        )
    }
    pub fn half_width_secs(&self) -> f64 {
        self.half_width_secs
    }
    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }
    /// Weight of a sample `dt` seconds before the target instant.
    pub fn weight(&self, dt: f64) -> f64 {
        if dt.abs() > self.half_width_secs {
            return 0.0;
        }
        let x = 2.0 * PI * self.cutoff_hz * dt;
        sinc(x) * lanczos(dt / self.half_width_secs)
    }
    /// Estimates the signal at `t` from `support`, which must be sorted by
    /// timestamp. `default` is returned only when `support` is empty.
    ///
    /// A window whose weights cancel out, or whose weighted sum lands well
    /// outside the values it was built from, yields [`Estimate::Nearest`].
    pub fn interpolate(&self, t: f64, support: &[RawSample], default: f64) -> Estimate {
        if support.is_empty() {
            return Estimate::Default(default);
        }
        let lo = support.partition_point(|s| s.timestamp < t - self.half_width_secs);
        let hi = support.partition_point(|s| s.timestamp <= t + self.half_width_secs);
        let mut weighted_sum = 0.0;
        let mut signed_weights = 0.0;
        let mut absolute_weights = 0.0;
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        for sample in &support[lo..hi.max(lo)] {
            let dt = t - sample.timestamp;
            if dt.abs() > self.half_width_secs {
                continue;
            }
            let w = self.weight(dt);
            weighted_sum += w * sample.value;
            signed_weights += w;
            absolute_weights += w.abs();
            min_value = min_value.min(sample.value);
            max_value = max_value.max(sample.value);
        }
        let denominator = match self.normalization {
            Normalization::SignedWeights => signed_weights,
            Normalization::AbsoluteWeights => absolute_weights,
        };
        if denominator.abs() < NORMALIZATION_EPSILON {
            return Estimate::Nearest(nearest(t, support).value);
        }
        let incoherent = self.normalization == Normalization::SignedWeights
            && signed_weights.abs() < MIN_WEIGHT_COHERENCE * absolute_weights;
        let value = weighted_sum / denominator;
        let slack = RANGE_SLACK * (max_value - min_value) + NORMALIZATION_EPSILON;
        let in_range = value >= min_value - slack && value <= max_value + slack;
        if incoherent || !value.is_finite() || !in_range {
            return Estimate::Nearest(nearest(t, support).value);
        }
        Estimate::Reconstructed(value)
    }
}
/// Sample closest in time to `t`; ties go to the later sample.
fn nearest(t: f64, support: &[RawSample]) -> RawSample {
    let idx = support.partition_point(|s| s.timestamp < t);
    match (idx.checked_sub(1).map(|i| support[i]), support.get(idx).copied()) {
        (Some(before), Some(after)) => {
            if (t - before.timestamp) < (after.timestamp - t) {
                before
            } else {
                after
            }
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => support[support.len() - 1],
    }
}
