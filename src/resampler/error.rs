use thiserror::Error;
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("target rate must be a finite value greater than zero, got {0}")]
    InvalidTargetRate(f64),
    #[error("cutoff frequency {cutoff_hz} Hz must be positive and at most the output Nyquist frequency {nyquist_hz} Hz")]
    CutoffAboveNyquist { cutoff_hz: f64, nyquist_hz: f64 },
    #[error("kernel half-width must be a finite value greater than zero, got {0}")]
    InvalidKernelHalfWidth(f64),
    #[error("latency margin must be finite and non-negative, got {0}")]
    InvalidLatencyMargin(f64),
    #[error("retention window {retention_secs}s must cover the kernel half-width plus latency margin ({required_secs}s)")]
    RetentionTooShort {
        retention_secs: f64,
        required_secs: f64,
    },
    #[error("output capacity must be greater than zero")]
    InvalidOutputCapacity,
    #[error("failed to parse resampler config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to read resampler config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to spawn resampling worker: {0}")]
    WorkerSpawn(std::io::Error),
    #[error("resampling pipeline is closed")]
    PipelineClosed,
    #[error("resampling worker did not stop within {0:?}")]
    StopTimeout(std::time::Duration),
    #[error("resampling worker panicked")]
    WorkerPanicked,
}
