//! Band-limited reconstruction of bursty, irregularly timed sensor samples.
//!
//! The [`resampler`] module holds the whole engine: an ingestion queue fed by
//! any number of producers, a single worker thread owning the history buffer,
//! a Lanczos-windowed sinc kernel and a bounded output stream of evenly spaced
//! points for live plotting.
pub mod resampler;
