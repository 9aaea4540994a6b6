//! Interactive instrument viewer
//!
//! Shows the instrument outline and the most recent rays in a top or side
//! projection, with monitor heatmaps alongside. The instrument file is watched
//! and reloaded when it changes on disk.

use crate::describe;
use eframe::egui;
use notify::{Event, RecommendedWatcher, Watcher};
use raysim_core::diagnostics::format_runtime_error;
use raysim_core::visual::{axes, heatmap_color, outlines, scene_bounds, Bounds2, Projection};
use raysim_core::{
    build_simulation_context_from_source, step_simulation, Histogram2d, SimulationContext,
};
use std::path::PathBuf;
use std::sync::mpsc;

/// How far past its last point a ray is drawn, in metres
const RAY_TAIL: f64 = 0.5;
const AXIS_LENGTH: f64 = 0.1;

pub struct ViewApp {
    source_path: PathBuf,
    source_text: String,
    ctx_opt: Option<SimulationContext>,
    last_load_error: Option<String>,
    playing: bool,
    batches_per_frame: usize,
    projection: Projection,
    #[allow(dead_code)] // Kept alive to maintain file watching
    file_watcher: Option<RecommendedWatcher>,
    file_receiver: mpsc::Receiver<notify::Result<Event>>,
    needs_reload: bool,
}

impl ViewApp {
    pub fn new(source_path: PathBuf, _cc: &eframe::CreationContext<'_>) -> Self {
        let source_text = std::fs::read_to_string(&source_path)
            .unwrap_or_else(|e| format!("# cannot read file: {}", e));

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .ok();

        if let Some(ref mut w) = watcher {
            if let Err(e) = w.watch(&source_path, notify::RecursiveMode::NonRecursive) {
                log::warn!("not watching {}: {}", source_path.display(), e);
            }
        }

        let mut app = Self {
            source_path,
            source_text,
            ctx_opt: None,
            last_load_error: None,
            playing: false,
            batches_per_frame: 1,
            projection: Projection::default(),
            file_watcher: watcher,
            file_receiver: rx,
            needs_reload: false,
        };

        app.reload_context();
        app
    }

    fn reload_context(&mut self) {
        match build_simulation_context_from_source(&self.source_text) {
            Ok(ctx) => {
                log::info!(
                    "loaded {} with {} components",
                    self.source_path.display(),
                    ctx.simulator.components().len()
                );
                self.ctx_opt = Some(ctx);
                self.last_load_error = None;
            }
            Err(e) => {
                self.last_load_error = Some(describe(&e, &self.source_text));
                self.ctx_opt = None;
                self.playing = false;
            }
        }
    }

    fn check_file_changes(&mut self) {
        while let Ok(event) = self.file_receiver.try_recv() {
            match event {
                Ok(Event {
                    kind: notify::EventKind::Modify(_),
                    paths,
                    ..
                }) => {
                    if paths.contains(&self.source_path) {
                        if let Ok(new_text) = std::fs::read_to_string(&self.source_path) {
                            self.source_text = new_text;
                            self.needs_reload = true;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("file watcher error: {}", e),
            }
        }

        if self.needs_reload {
            self.reload_context();
            self.needs_reload = false;
        }
    }

    /// Trace one batch; stops playback when the run is complete or fails
    fn step(&mut self) {
        let Some(ctx) = self.ctx_opt.as_mut() else {
            return;
        };
        match step_simulation(ctx) {
            Ok(true) => {}
            Ok(false) => self.playing = false,
            Err(e) => {
                self.last_load_error = Some(format_runtime_error(&e));
                self.playing = false;
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button(if self.playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                self.playing = !self.playing;
            }

            if ui.button("⏮ Reset").clicked() {
                if let Some(ctx) = self.ctx_opt.as_mut() {
                    ctx.reset();
                }
                self.playing = false;
            }

            if ui.button("⏭ Step").clicked() {
                self.step();
            }

            ui.separator();

            if let Some(ctx) = self.ctx_opt.as_mut() {
                ui.label("Batch:");
                ui.add(egui::Slider::new(&mut ctx.batch_size, 1..=1000).logarithmic(true));
            }
            ui.label("Batches/frame:");
            ui.add(egui::Slider::new(&mut self.batches_per_frame, 1..=20));

            ui.separator();

            for projection in [Projection::Top, Projection::Side] {
                ui.selectable_value(&mut self.projection, projection, projection.label());
            }

            ui.separator();

            if let Some(ref ctx) = self.ctx_opt {
                ui.label(format!("Rays: {} / {}", ctx.traced(), ctx.settings.rays));
            }
        });
    }

    fn draw_scene(&self, ui: &mut egui::Ui) {
        let rect = ui.max_rect();
        let painter = ui.painter();
        let Some(ctx) = self.ctx_opt.as_ref() else {
            return;
        };
        let sim = &ctx.simulator;
        let Some(bounds) = scene_bounds(sim, self.projection) else {
            return;
        };
        let view = ScreenMap::new(bounds.padded(0.1), rect);

        for ray in &ctx.rays {
            let mut points: Vec<egui::Pos2> = ray
                .history()
                .iter()
                .map(|p| view.to_screen(self.projection.project(*p)))
                .collect();
            if let Some(last) = ray.last_point() {
                let tail = last + ray.direction() * RAY_TAIL;
                points.push(view.to_screen(self.projection.project(tail)));
            }
            let color = egui::Color32::from_rgba_unmultiplied(
                ray.color.r,
                ray.color.g,
                ray.color.b,
                90,
            );
            painter.add(egui::Shape::line(points, egui::Stroke::new(1.0, color)));
        }

        for outline in outlines(sim) {
            let color = kind_color(outline.kind);
            for line in &outline.lines {
                let points = line
                    .iter()
                    .map(|p| view.to_screen(self.projection.project(*p)))
                    .collect();
                painter.add(egui::Shape::line(points, egui::Stroke::new(2.0, color)));
            }
        }

        let axis_colors = [egui::Color32::RED, egui::Color32::GREEN, egui::Color32::BLUE];
        for frame in axes(sim, AXIS_LENGTH) {
            for ((from, to), color) in frame.into_iter().zip(axis_colors) {
                painter.line_segment(
                    [
                        view.to_screen(self.projection.project(from)),
                        view.to_screen(self.projection.project(to)),
                    ],
                    egui::Stroke::new(1.0, color),
                );
            }
        }

        for component in sim.components() {
            let pos = view.to_screen(self.projection.project(component.global.position));
            painter.text(
                pos + egui::vec2(0.0, 8.0),
                egui::Align2::CENTER_TOP,
                &component.name,
                egui::FontId::default(),
                egui::Color32::WHITE,
            );
        }
    }

    fn draw_monitors(&self, ui: &mut egui::Ui) {
        let Some(ctx) = self.ctx_opt.as_ref() else {
            return;
        };
        for (_, component, monitor) in ctx.simulator.monitors() {
            let histogram = monitor.histogram();
            ui.heading(&component.name);
            ui.label(format!(
                "counts {}  intensity {:.3}",
                histogram.total_counts(),
                histogram.total_intensity()
            ));
            heatmap(ui, histogram, 200.0);
            ui.separator();
        }
    }
}

/// Paint a histogram as a square of colored cells, +y at the top
fn heatmap(ui: &mut egui::Ui, histogram: &Histogram2d, size: f32) {
    let (nx, ny) = histogram.shape();
    let (response, painter) = ui.allocate_painter(egui::vec2(size, size), egui::Sense::hover());
    let origin = response.rect.min;
    let cell = egui::vec2(size / nx as f32, size / ny as f32);

    for ix in 0..nx {
        for iy in 0..ny {
            let [r, g, b] = heatmap_color(histogram.normalized_intensity(ix, iy));
            let min = origin + egui::vec2(ix as f32 * cell.x, (ny - 1 - iy) as f32 * cell.y);
            painter.rect_filled(
                egui::Rect::from_min_size(min, cell),
                0.0,
                egui::Color32::from_rgb(r, g, b),
            );
        }
    }
}

fn kind_color(kind: &str) -> egui::Color32 {
    match kind {
        "Source" => egui::Color32::YELLOW,
        "Guide" => egui::Color32::LIGHT_BLUE,
        "Mirror" => egui::Color32::from_rgb(200, 120, 255),
        "Monitor" => egui::Color32::GREEN,
        _ => egui::Color32::GRAY,
    }
}

/// Maps projected world coordinates into a screen rectangle, keeping aspect ratio
struct ScreenMap {
    bounds: Bounds2,
    rect: egui::Rect,
    scale: f64,
}

impl ScreenMap {
    fn new(bounds: Bounds2, rect: egui::Rect) -> Self {
        let size = bounds.size();
        let scale = (rect.width() as f64 / size.x).min(rect.height() as f64 / size.y);
        Self {
            bounds,
            rect,
            scale,
        }
    }

    fn to_screen(&self, p: glam::DVec2) -> egui::Pos2 {
        let mid = (self.bounds.min + self.bounds.max) / 2.0;
        let offset = (p - mid) * self.scale;
        self.rect.center() + egui::vec2(offset.x as f32, -offset.y as f32)
    }
}

impl eframe::App for ViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_changes();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls(ui));

        egui::SidePanel::right("monitors")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_monitors(ui));
            });

        if let Some(ref error) = self.last_load_error {
            egui::TopBottomPanel::bottom("errors").show(ctx, |ui| {
                ui.set_max_height(120.0);
                ui.label(egui::RichText::new(error).color(egui::Color32::RED));
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| self.draw_scene(ui));

        if self.playing {
            for _ in 0..self.batches_per_frame {
                self.step();
                if !self.playing {
                    break;
                }
            }
            ctx.request_repaint();
        }
    }
}
