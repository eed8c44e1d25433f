// src/resampler/mod.rs
pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod kernel;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod worker;
pub use buffer::{HistoryBuffer, HistorySnapshot, MergeReport};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Normalization, ResamplerConfig};
pub use error::ResampleError;
pub use kernel::{lanczos, sinc, Estimate, LanczosKernel};
pub use output::{output_stream, Delivery, OutputStream, PointReceiver, ResampledPoint};
pub use pipeline::{PipelineHandle, ResamplingPipeline};
pub use source::{
    ingestion_queue, IngestionQueue, ManualSource, RawSample, SamplePacket, SampleSink,
    SampleSource,
};
pub use worker::{CycleOutcome, ResamplingWorker, StatsSnapshot, WorkerState, WorkerStats};
