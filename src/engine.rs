// src/engine.rs
//
// Stand-in for the network link: emits bursts of irregularly timed samples
// and hands them to the resampling pipeline.
use std::f64::consts::PI;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use burstscope::resampler::{Clock, SamplePacket, SampleSink};
use log::{info, warn};
use rand::Rng;
use crate::types::{GuiCommand, LinkMessage};

const BURST_INTERVAL: Duration = Duration::from_millis(25);
const MEAN_SAMPLE_SPACING_SECS: f64 = 0.002;

pub fn spawn_simulator(
    sink: SampleSink,
    clock: Arc<dyn Clock>,
    tx: Sender<LinkMessage>,
    rx_cmd: Receiver<GuiCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let mut is_streaming = false;
        let mut tone_hz = 3.0;
        // Timestamp of the last sample sent; the next burst continues from here.
        let mut last_sent = clock.now();
        tx.send(LinkMessage::Log("Simulated link ready.".to_owned())).ok();

        loop {
            // 1. commands
            loop {
                match rx_cmd.try_recv() {
                    Ok(GuiCommand::StartStream) => {
                        is_streaming = true;
                        last_sent = clock.now();
                        tx.send(LinkMessage::Status(true)).ok();
                        tx.send(LinkMessage::Log("Stream started".to_owned())).ok();
                    }
                    Ok(GuiCommand::StopStream) => {
                        is_streaming = false;
                        tx.send(LinkMessage::Status(false)).ok();
                        tx.send(LinkMessage::Log("Stream stopped".to_owned())).ok();
                    }
                    Ok(GuiCommand::SetToneHz(hz)) => tone_hz = hz,
                    Ok(GuiCommand::Shutdown) => {
                        info!("simulated link shutting down");
                        return;
                    }
                    Err(std::sync::mpsc::TryRecvError::Empty) => break,
                    Err(std::sync::mpsc::TryRecvError::Disconnected) => return,
                }
            }

            if !is_streaming {
                thread::sleep(Duration::from_millis(50));
                continue;
            }

            // 2. one packet covering everything since the last burst, with
            // jittered spacing so the resampler sees irregular timing
            let now = clock.now();
            let mut packet = SamplePacket::new(last_sent);
            let mut offset = 0.0;
            loop {
                offset += MEAN_SAMPLE_SPACING_SECS * rng.gen_range(0.4..1.6);
                if last_sent + offset > now {
                    break;
                }
                let t = last_sent + offset;
                let value = (2.0 * PI * tone_hz * t).sin()
                    + 0.3 * (2.0 * PI * tone_hz * 3.1 * t).sin()
                    + rng.gen_range(-0.05..0.05);
                packet.push(offset, value);
            }
            if let Some(&(last_offset, _)) = packet.samples.last() {
                last_sent += last_offset;
            }

            // 3. hand-off
            let samples = packet.into_samples();
            if !samples.is_empty() {
                if let Err(e) = sink.enqueue_batch(samples.iter().copied()) {
                    warn!("resampler gone, stopping link: {e}");
                    tx.send(LinkMessage::Status(false)).ok();
                    return;
                }
                tx.send(LinkMessage::RawBurst(samples)).ok();
            }

            thread::sleep(BURST_INTERVAL);
        }
    })
}
