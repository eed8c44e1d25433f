// src/types.rs
use burstscope::resampler::RawSample;

// GUI -> simulated transport
#[derive(Clone, Debug)]
pub enum GuiCommand {
    StartStream,
    StopStream,
    SetToneHz(f64),
    Shutdown,
}

// simulated transport -> GUI
#[derive(Clone, Debug)]
pub enum LinkMessage {
    Log(String),
    Status(bool),           // streaming or not
    RawBurst(Vec<RawSample>), // raw samples as enqueued, for overlay
}
