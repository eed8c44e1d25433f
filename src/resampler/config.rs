use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::resampler::ResampleError;
/// How the kernel's weighted sum is normalised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide by the signed sum of weights. Preserves amplitude.
    SignedWeights,
    /// Divide by the sum of absolute weights. Always positive, but damps the
    /// amplitude wherever the windowed sinc goes negative.
    AbsoluteWeights,
}
impl Default for Normalization {
    fn default() -> Self {
        Normalization::SignedWeights
    }
}
/// Construction-time parameters of a resampling pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    /// Output grid rate in Hz.
    pub target_rate_hz: f64,
    /// Reconstruction filter cutoff in Hz, at most `target_rate_hz / 2`.
    pub cutoff_hz: f64,
    /// Support radius of the kernel in seconds.
    pub kernel_half_width_secs: f64,
    /// Maximum age of raw samples kept as interpolation support.
    pub retention_secs: f64,
    /// Delay between "now" and the newest grid point the worker may emit.
    pub latency_margin_secs: f64,
    /// Sleep between polls of an empty ingestion queue.
    pub idle_backoff_ms: u64,
    /// Output channel bound; `None` selects an unbounded channel.
    pub output_capacity: Option<usize>,
    pub normalization: Normalization,
}
impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            target_rate_hz: 100.0,
            cutoff_hz: 50.0,
            kernel_half_width_secs: 0.06,
            retention_secs: 5.0,
            latency_margin_secs: 0.02,
            idle_backoff_ms: 5,
            output_capacity: Some(4096),
            normalization: Normalization::SignedWeights,
        }
    }
}
impl ResamplerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ResampleError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResampleError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
    pub fn validate(&self) -> Result<(), ResampleError> {
        if !self.target_rate_hz.is_finite() || self.target_rate_hz <= 0.0 {
            return Err(ResampleError::InvalidTargetRate(self.target_rate_hz));
        }
        let nyquist_hz = self.nyquist_hz();
        if !self.cutoff_hz.is_finite() || self.cutoff_hz <= 0.0 || self.cutoff_hz > nyquist_hz {
            return Err(ResampleError::CutoffAboveNyquist {
                cutoff_hz: self.cutoff_hz,
                nyquist_hz,
            });
        }
        if !self.kernel_half_width_secs.is_finite() || self.kernel_half_width_secs <= 0.0 {
            return Err(ResampleError::InvalidKernelHalfWidth(
                self.kernel_half_width_secs,
            ));
        }
        if !self.latency_margin_secs.is_finite() || self.latency_margin_secs < 0.0 {
            return Err(ResampleError::InvalidLatencyMargin(self.latency_margin_secs));
        }
        let required_secs = self.kernel_half_width_secs + self.latency_margin_secs;
        if !self.retention_secs.is_finite() || self.retention_secs < required_secs {
            return Err(ResampleError::RetentionTooShort {
                retention_secs: self.retention_secs,
                required_secs,
            });
        }
        if self.output_capacity == Some(0) {
            return Err(ResampleError::InvalidOutputCapacity);
        }
        Ok(())
    }
    pub fn grid_period_secs(&self) -> f64 {
        1.0 / self.target_rate_hz
    }
    pub fn nyquist_hz(&self) -> f64 {
        self.target_rate_hz * 0.5
    }
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }
}
