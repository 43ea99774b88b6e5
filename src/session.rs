//! The annotation session: one surface, its undo history and the mode/brush
//! state machine that UI events drive.

use eframe::egui;

use crate::export::{self, ExportFile, DEFAULT_EXPORT_FILE_NAME, DEFAULT_IMAGE_FILE_NAME};
use crate::history::{HistoryLimit, HistoryLog};
use crate::surface::{BrushStyle, DrawingSurface, SessionMode};

pub const BRUSH_MIN: f32 = 1.0;
pub const BRUSH_MAX: f32 = 100.0;
pub const TOOLBAR_HEIGHT: u32 = 66;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    ToggleMode,
    BrushSizeChanged(f32),
    ColorChanged(egui::Color32),
    StrokeCompleted,
    EraserSelected,
    EraseRequested(egui::Pos2),
    UndoRequested,
    ExportRequested,
    ViewportResized { width: u32, height: u32 },
}

/// What the host has to do after an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    None,
    OfferDownload(ExportFile),
}

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub brush: BrushStyle,
    pub history_limit: HistoryLimit,
    pub toolbar_height: u32,
    pub export_file_name: String,
    pub image_file_name: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            brush: BrushStyle::default(),
            history_limit: HistoryLimit::Unbounded,
            toolbar_height: TOOLBAR_HEIGHT,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            image_file_name: DEFAULT_IMAGE_FILE_NAME.to_string(),
        }
    }
}

pub struct Session<S: DrawingSurface> {
    surface: S,
    history: HistoryLog<S::Snapshot>,
    mode: SessionMode,
    eraser_armed: bool,
    brush: BrushStyle,
    toolbar_height: u32,
    export_file_name: String,
    image_file_name: String,
}

impl<S: DrawingSurface> Session<S> {
    /// Takes ownership of a freshly constructed surface, puts it in drawing
    /// mode with the default brush and seeds history with its empty state.
    pub fn create(mut surface: S, settings: SessionSettings) -> Self {
        let brush = BrushStyle {
            width: settings.brush.width.clamp(BRUSH_MIN, BRUSH_MAX),
            ..settings.brush
        };
        surface.set_mode(SessionMode::Drawing);
        if !surface.set_brush_style(brush) {
            log::warn!("surface has no brush after entering drawing mode");
        }
        let history = HistoryLog::initialize(surface.serialize(), settings.history_limit);
        Self {
            surface,
            history,
            mode: SessionMode::Drawing,
            eraser_armed: false,
            brush,
            toolbar_height: settings.toolbar_height,
            export_file_name: settings.export_file_name,
            image_file_name: settings.image_file_name,
        }
    }

    /// Ends the session, releasing the surface.
    pub fn dispose(self) {
        log::debug!("session disposed with {} history entries", self.history.len());
    }

    pub fn handle(&mut self, event: SessionEvent) -> Outcome {
        log::debug!("session event {event:?} in {:?}", self.mode);
        match event {
            SessionEvent::ToggleMode => {
                let next = match self.mode {
                    SessionMode::Drawing => SessionMode::Selection,
                    SessionMode::Selection => SessionMode::Drawing,
                };
                self.enter_mode(next);
            }
            SessionEvent::BrushSizeChanged(width) => {
                if width.is_finite() {
                    self.brush.width = width.clamp(BRUSH_MIN, BRUSH_MAX);
                    self.push_brush();
                }
            }
            SessionEvent::ColorChanged(color) => {
                self.brush.color = color;
                self.push_brush();
            }
            SessionEvent::StrokeCompleted => {
                self.history.push(self.surface.serialize());
            }
            SessionEvent::EraserSelected => {
                self.enter_mode(SessionMode::Selection);
                self.eraser_armed = true;
            }
            SessionEvent::EraseRequested(point) => {
                if self.mode == SessionMode::Selection && self.eraser_armed {
                    self.surface.remove_object_at(point);
                }
            }
            SessionEvent::UndoRequested => {
                let previous = self.history.undo().clone();
                self.surface.restore(&previous);
            }
            SessionEvent::ExportRequested => return self.export(),
            SessionEvent::ViewportResized { width, height } => {
                self.surface
                    .resize(width, height.saturating_sub(self.toolbar_height));
            }
        }
        Outcome::None
    }

    fn enter_mode(&mut self, mode: SessionMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.surface.set_mode(mode);
        match mode {
            SessionMode::Drawing => {
                self.eraser_armed = false;
                // the surface may have forgotten its brush while disabled
                self.push_brush();
            }
            SessionMode::Selection => {}
        }
    }

    fn push_brush(&mut self) {
        if self.mode != SessionMode::Drawing {
            return;
        }
        if !self.surface.set_brush_style(self.brush) {
            log::debug!("surface brush unavailable, skipping update");
        }
    }

    fn export(&self) -> Outcome {
        let (width, height) = self.surface.size();
        let doc = export::encode_with_file_name(
            &self.surface.objects(),
            width,
            height,
            &self.image_file_name,
        );
        match doc.to_json() {
            Ok(contents) => {
                log::info!("exported {} annotations", doc.annotations.len());
                Outcome::OfferDownload(ExportFile {
                    name: self.export_file_name.clone(),
                    contents,
                })
            }
            Err(e) => {
                log::error!("{e}");
                Outcome::None
            }
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_eraser_armed(&self) -> bool {
        self.eraser_armed
    }

    pub fn brush(&self) -> BrushStyle {
        self.brush
    }

    pub fn toolbar_height(&self) -> u32 {
        self.toolbar_height
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::AnnotationObject;
    use egui::pos2;

    /// Records every call so transitions can be checked without a canvas.
    #[derive(Default)]
    struct FakeSurface {
        objects: Vec<u32>,
        mode: Option<SessionMode>,
        brush: Option<BrushStyle>,
        brush_updates: usize,
        removals: usize,
        size: (u32, u32),
    }

    impl DrawingSurface for FakeSurface {
        type Snapshot = Vec<u32>;

        fn serialize(&self) -> Vec<u32> {
            self.objects.clone()
        }

        fn restore(&mut self, snapshot: &Vec<u32>) {
            self.objects = snapshot.clone();
        }

        fn set_mode(&mut self, mode: SessionMode) {
            self.mode = Some(mode);
            if mode == SessionMode::Selection {
                self.brush = None;
            }
        }

        fn set_brush_style(&mut self, brush: BrushStyle) -> bool {
            if self.mode == Some(SessionMode::Selection) {
                return false;
            }
            self.brush = Some(brush);
            self.brush_updates += 1;
            true
        }

        fn remove_object_at(&mut self, _point: egui::Pos2) -> bool {
            self.removals += 1;
            self.objects.pop().is_some()
        }

        fn objects(&self) -> Vec<AnnotationObject> {
            self.objects
                .iter()
                .map(|&n| AnnotationObject {
                    left: 0.0,
                    top: 0.0,
                    width: n as f64,
                    height: 1.0,
                })
                .collect()
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }
    }

    fn session() -> Session<FakeSurface> {
        Session::create(FakeSurface::default(), SessionSettings::default())
    }

    #[test]
    fn starts_drawing_with_default_brush() {
        let s = session();
        assert_eq!(s.mode(), SessionMode::Drawing);
        assert_eq!(s.surface().brush, Some(BrushStyle::default()));
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn brush_changes_in_selection_are_remembered_but_not_pushed() {
        let mut s = session();
        s.handle(SessionEvent::ToggleMode);
        let updates = s.surface().brush_updates;

        s.handle(SessionEvent::BrushSizeChanged(36.0));
        s.handle(SessionEvent::ColorChanged(egui::Color32::YELLOW));
        assert_eq!(s.surface().brush_updates, updates);
        assert_eq!(s.surface().brush, None);

        s.handle(SessionEvent::ToggleMode);
        assert_eq!(
            s.surface().brush,
            Some(BrushStyle {
                color: egui::Color32::YELLOW,
                width: 36.0
            })
        );
    }

    #[test]
    fn eraser_only_acts_when_armed() {
        let mut s = session();
        s.surface_mut().objects = vec![1, 2];
        s.handle(SessionEvent::EraseRequested(pos2(0.0, 0.0)));
        s.handle(SessionEvent::ToggleMode);
        s.handle(SessionEvent::EraseRequested(pos2(0.0, 0.0)));
        assert_eq!(s.surface().removals, 0);

        s.handle(SessionEvent::EraserSelected);
        s.handle(SessionEvent::EraserSelected);
        s.handle(SessionEvent::EraseRequested(pos2(0.0, 0.0)));
        assert_eq!(s.surface().removals, 1);
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn returning_to_drawing_disarms_the_eraser() {
        let mut s = session();
        s.handle(SessionEvent::EraserSelected);
        assert!(s.is_eraser_armed());
        s.handle(SessionEvent::ToggleMode);
        assert_eq!(s.mode(), SessionMode::Drawing);
        assert!(!s.is_eraser_armed());
    }

    #[test]
    fn undo_restores_previous_snapshot() {
        let mut s = session();
        s.surface_mut().objects.push(7);
        s.handle(SessionEvent::StrokeCompleted);
        s.surface_mut().objects.push(8);
        s.handle(SessionEvent::StrokeCompleted);

        s.handle(SessionEvent::UndoRequested);
        assert_eq!(s.surface().objects, vec![7]);
        s.handle(SessionEvent::UndoRequested);
        assert!(s.surface().objects.is_empty());
        s.handle(SessionEvent::UndoRequested);
        assert!(s.surface().objects.is_empty());
    }

    #[test]
    fn resize_subtracts_toolbar() {
        let mut s = session();
        s.handle(SessionEvent::ViewportResized {
            width: 1280,
            height: 720,
        });
        assert_eq!(s.surface().size, (1280, 654));
        s.handle(SessionEvent::ViewportResized {
            width: 10,
            height: 20,
        });
        assert_eq!(s.surface().size, (10, 0));
    }

    #[test]
    fn export_offers_named_file() {
        let mut s = session();
        s.surface_mut().objects = vec![3];
        let Outcome::OfferDownload(file) = s.handle(SessionEvent::ExportRequested) else {
            panic!("export produced no file");
        };
        assert_eq!(file.name, "annotations.json");
        let value: serde_json::Value = serde_json::from_slice(&file.contents).unwrap();
        assert_eq!(value["annotations"][0]["area"], 3);
    }

    #[test]
    fn off_grid_width_survives_a_mode_round_trip() {
        let mut s = session();
        s.handle(SessionEvent::BrushSizeChanged(50.0));
        s.handle(SessionEvent::BrushSizeChanged(5.0));
        s.handle(SessionEvent::ToggleMode);
        s.handle(SessionEvent::ToggleMode);

        assert_eq!(s.brush().width, 5.0);
        assert_eq!(s.surface().brush.map(|b| b.width), Some(5.0));
    }

    #[test]
    fn brush_width_is_clamped_and_nan_ignored() {
        let mut s = session();
        s.handle(SessionEvent::BrushSizeChanged(250.0));
        assert_eq!(s.brush().width, 100.0);
        s.handle(SessionEvent::BrushSizeChanged(0.0));
        assert_eq!(s.brush().width, 1.0);
        s.handle(SessionEvent::BrushSizeChanged(f32::NAN));
        assert_eq!(s.brush().width, 1.0);
    }

    #[test]
    fn stroke_then_undo_in_one_frame_keeps_history_consistent() {
        let mut s = session();
        s.surface_mut().objects.push(1);
        s.handle(SessionEvent::StrokeCompleted);
        s.surface_mut().objects.push(2);
        s.handle(SessionEvent::StrokeCompleted);

        // third stroke already committed by the surface when the frame is handled
        s.surface_mut().objects.push(3);
        s.handle(SessionEvent::StrokeCompleted);
        s.handle(SessionEvent::UndoRequested);

        assert_eq!(s.surface().objects, vec![1, 2]);
        assert_eq!(s.history_len(), 3);
    }
}
