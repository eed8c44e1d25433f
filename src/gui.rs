// src/gui.rs
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use burstscope::resampler::{PipelineHandle, PointReceiver, ResamplerConfig, SampleSink, StatsSnapshot};
use eframe::egui;
use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use crate::engine;
use crate::types::*;

const VIEW_SECONDS: f64 = 5.0;

pub struct ScopeApp {
    is_streaming: bool,
    tone_hz: f64,
    config: ResamplerConfig,

    // plot buffers ([t, value])
    raw_points: VecDeque<[f64; 2]>,
    resampled_points: VecDeque<[f64; 2]>,
    stats: Option<StatsSnapshot>,
    log_messages: Vec<String>,

    // channels
    rx: Receiver<LinkMessage>,
    tx_cmd: Sender<GuiCommand>,
    points: PointReceiver,
    pipeline: Option<PipelineHandle>,
    link: Option<JoinHandle<()>>,
}

impl ScopeApp {
    pub fn new(config: ResamplerConfig, pipeline: PipelineHandle, points: PointReceiver, sink: SampleSink) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let link = engine::spawn_simulator(sink, pipeline.clock(), tx, rx_cmd);
        Self {
            is_streaming: false,
            tone_hz: 3.0,
            config,
            raw_points: VecDeque::new(),
            resampled_points: VecDeque::new(),
            stats: None,
            log_messages: vec!["burstscope ready.".to_owned()],
            rx,
            tx_cmd,
            points,
            pipeline: Some(pipeline),
            link: Some(link),
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 { self.log_messages.remove(0); }
    }

    fn trim(buf: &mut VecDeque<[f64; 2]>, newest: f64) {
        while let Some(front) = buf.front() {
            if front[0] < newest - VIEW_SECONDS { buf.pop_front(); } else { break; }
        }
    }

    fn poll(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                LinkMessage::Log(s) => self.log(&s),
                LinkMessage::Status(b) => self.is_streaming = b,
                LinkMessage::RawBurst(samples) => {
                    for s in &samples { self.raw_points.push_back([s.timestamp, s.value]); }
                    if let Some(last) = samples.last() { Self::trim(&mut self.raw_points, last.timestamp); }
                }
            }
        }
        let fresh = self.points.drain();
        for p in &fresh { self.resampled_points.push_back([p.timestamp, p.value]); }
        if let Some(last) = fresh.last() { Self::trim(&mut self.resampled_points, last.timestamp); }
        self.stats = self.pipeline.as_ref().map(|p| p.stats());
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll();
        if self.is_streaming { ctx.request_repaint(); }

        egui::SidePanel::left("L").min_width(260.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("burstscope");
            ui.label("Lanczos resampling of bursty samples");
            ui.separator();

            let stream_btn = if self.is_streaming { "STOP STREAM" } else { "START STREAM" };
            if ui.button(stream_btn).clicked() {
                if self.is_streaming { self.tx_cmd.send(GuiCommand::StopStream).ok(); }
                else { self.tx_cmd.send(GuiCommand::StartStream).ok(); }
            }
            if ui.button("RESET VIEW").clicked() {
                self.raw_points.clear();
                self.resampled_points.clear();
            }
            if ui.add(egui::Slider::new(&mut self.tone_hz, 0.5..=20.0).text("tone Hz")).changed() {
                self.tx_cmd.send(GuiCommand::SetToneHz(self.tone_hz)).ok();
            }

            ui.add_space(10.0);
            ui.separator();
            ui.label("RESAMPLER");
            ui.monospace(format!("grid     {:>7.1} Hz", self.config.target_rate_hz));
            ui.monospace(format!("cutoff   {:>7.1} Hz", self.config.cutoff_hz));
            ui.monospace(format!("kernel   {:>7.1} ms", self.config.kernel_half_width_secs * 1e3));
            ui.monospace(format!("latency  {:>7.1} ms", self.config.latency_margin_secs * 1e3));
            if let Some(stats) = &self.stats {
                ui.monospace(format!("state    {:?}", stats.state));
                ui.monospace(format!("ingested {}", stats.samples_ingested));
                ui.monospace(format!("emitted  {}", stats.points_emitted));
                ui.monospace(format!("dropped  {}", stats.points_dropped));
                ui.monospace(format!("fallback {}", stats.fallbacks));
                let lag_col = if stats.lag_secs > 4.0 / self.config.target_rate_hz { Color32::YELLOW } else { Color32::LIGHT_GREEN };
                ui.label(egui::RichText::new(format!("lag {:.1} ms", stats.lag_secs * 1e3)).monospace().color(lag_col));
            }

            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                for m in &self.log_messages { ui.monospace(m); }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            Plot::new("main_plot")
                .legend(Legend::default())
                .include_y(-1.5)
                .include_y(1.5)
                .auto_bounds_x()
                .show(ui, |plot_ui| {
                    let raw: Vec<[f64; 2]> = self.raw_points.iter().copied().collect();
                    let resampled: Vec<[f64; 2]> = self.resampled_points.iter().copied().collect();
                    plot_ui.points(Points::new(PlotPoints::new(raw)).radius(1.5).color(Color32::from_rgb(120, 120, 130)).name("raw"));
                    plot_ui.line(Line::new(PlotPoints::new(resampled)).color(Color32::from_rgb(0, 255, 255)).name("resampled"));
                });
        });
    }
}

impl Drop for ScopeApp {
    fn drop(&mut self) {
        self.tx_cmd.send(GuiCommand::Shutdown).ok();
        if let Some(link) = self.link.take() { link.join().ok(); }
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.stop(Duration::from_secs(1)) {
                log::warn!("{e}");
            }
        }
    }
}
