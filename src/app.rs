use std::path::PathBuf;

use eframe::egui;

use crate::canvas::{self, Canvas, CanvasEvent};
use crate::config::{self, AppConfig};
use crate::export::ExportFile;
use crate::session::{Outcome, Session, SessionEvent, BRUSH_MAX, BRUSH_MIN};
use crate::surface::SessionMode;

/// Brush slider increment, counted from `BRUSH_MIN`.
pub const BRUSH_STEP: f32 = 5.0;

/// Snaps a slider position onto the `1, 6, 11, ..., 96, 100` grid.
pub fn snap_brush_width(width: f32) -> f32 {
    if !width.is_finite() {
        return BRUSH_MIN;
    }
    let steps = ((width - BRUSH_MIN) / BRUSH_STEP).round();
    (BRUSH_MIN + steps * BRUSH_STEP).clamp(BRUSH_MIN, BRUSH_MAX)
}

/// Orders one frame's events for dispatch. Canvas events go first: by the time
/// they are reported the canvas has already committed the stroke, so its
/// snapshot must be taken before an undo or export from the same frame.
pub fn frame_events(canvas: Vec<CanvasEvent>, ui: Vec<SessionEvent>) -> Vec<SessionEvent> {
    canvas
        .into_iter()
        .map(|event| match event {
            CanvasEvent::StrokeCompleted => SessionEvent::StrokeCompleted,
            CanvasEvent::Pressed(pos) => SessionEvent::EraseRequested(pos),
        })
        .chain(ui)
        .collect()
}

pub struct AnnotateApp {
    // None only after on_exit has disposed the session
    session: Option<Session<Canvas>>,
    viewport: Option<(u32, u32)>,
    config: AppConfig,
}

impl AnnotateApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &AppConfig,
        image_path: Option<PathBuf>,
    ) -> Self {
        let mut settings = config.session_settings();
        let mut canvas = Canvas::new(config.canvas.initial_width, config.canvas.initial_height);

        if let Some(path) = image_path {
            match canvas::load_background(&path) {
                Ok(img) => {
                    canvas.set_background(&cc.egui_ctx, &img);
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        settings.image_file_name = name.to_string();
                    }
                }
                Err(e) => log::error!("{e}"),
            }
        }

        Self {
            session: Some(Session::create(canvas, settings)),
            viewport: None,
            config: config.clone(),
        }
    }
}

fn offer_download(file: &ExportFile) {
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(&file.name)
        .add_filter("JSON", &["json"])
        .save_file()
    else {
        log::debug!("export cancelled");
        return;
    };
    match file.write_to(&path) {
        Ok(()) => log::info!("exported to {}", path.display()),
        Err(e) => log::error!("{e}"),
    }
}

fn toolbar(ui: &mut egui::Ui, session: &Session<Canvas>, events: &mut Vec<SessionEvent>) {
    ui.horizontal(|ui| {
        let mut drawing = session.mode() == SessionMode::Drawing;
        let hint = if drawing {
            "Switch to Polygon Mode"
        } else {
            "Switch to Brush Mode"
        };
        if ui
            .checkbox(&mut drawing, session.mode().label())
            .on_hover_text(hint)
            .changed()
        {
            events.push(SessionEvent::ToggleMode);
        }

        if session.mode() == SessionMode::Drawing {
            ui.separator();
            let mut width = session.brush().width;
            if ui
                .add(egui::Slider::new(&mut width, BRUSH_MIN..=BRUSH_MAX).text("Brush"))
                .on_hover_text("Brush Size")
                .changed()
            {
                events.push(SessionEvent::BrushSizeChanged(snap_brush_width(width)));
            }
        }

        ui.separator();
        let mut color = session.brush().color;
        if ui.color_edit_button_srgba(&mut color).changed() {
            events.push(SessionEvent::ColorChanged(color));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Export").on_hover_text("Export (Ctrl+S)").clicked() {
                events.push(SessionEvent::ExportRequested);
            }
            if ui.button("Undo").on_hover_text("Undo (Ctrl+Z)").clicked() {
                events.push(SessionEvent::UndoRequested);
            }
            let eraser = ui.selectable_label(session.is_eraser_armed(), "Eraser");
            if eraser.on_hover_text("Eraser (E)").clicked() {
                events.push(SessionEvent::EraserSelected);
            }
        });
    });
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut events = Vec::new();

        let screen = ctx.screen_rect().size();
        let viewport = (screen.x.max(0.0) as u32, screen.y.max(0.0) as u32);
        if self.viewport != Some(viewport) {
            self.viewport = Some(viewport);
            events.push(SessionEvent::ViewportResized {
                width: viewport.0,
                height: viewport.1,
            });
        }

        // Keyboard shortcuts
        if !ctx.wants_keyboard_input() {
            ctx.input(|i| {
                if i.modifiers.command && i.key_pressed(egui::Key::Z) {
                    events.push(SessionEvent::UndoRequested);
                }
                if i.modifiers.command && i.key_pressed(egui::Key::S) {
                    events.push(SessionEvent::ExportRequested);
                }
                if i.modifiers.is_none() && i.key_pressed(egui::Key::E) {
                    events.push(SessionEvent::EraserSelected);
                }
                if i.modifiers.is_none() && i.key_pressed(egui::Key::M) {
                    events.push(SessionEvent::ToggleMode);
                }
            });
        }

        egui::TopBottomPanel::top("toolbar")
            .exact_height(session.toolbar_height() as f32)
            .show(ctx, |ui| toolbar(ui, session, &mut events));

        let canvas_events = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| session.surface_mut().show(ui))
            .inner;

        for event in frame_events(canvas_events, events) {
            if let Outcome::OfferDownload(file) = session.handle(event) {
                offer_download(&file);
            }
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let Some(session) = self.session.take() else {
            return;
        };
        let brush = session.brush();
        session.dispose();

        // remember the last brush for the next run
        let mut updated = self.config.clone();
        updated.remember_brush(brush);
        if updated != self.config {
            match config::save_config(&updated) {
                Ok(()) => self.config = updated,
                Err(e) => log::warn!("{e}"),
            }
        }
    }
}
