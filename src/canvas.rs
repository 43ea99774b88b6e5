use std::path::Path;
use std::sync::Arc;

use eframe::egui;
use image::DynamicImage;

use crate::error::ImageError;
use crate::surface::{AnnotationObject, BrushStyle, DrawingSurface, SessionMode};

/// Extra slack around a stroke when hit-testing, in surface units.
const HIT_TOLERANCE: f32 = 4.0;

// ── Strokes ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub points: Vec<egui::Pos2>,
    pub color: egui::Color32,
    pub width: f32,
}

impl Stroke {
    /// Painted extent: the point hull padded by half the brush width.
    pub fn bounds(&self) -> egui::Rect {
        egui::Rect::from_points(&self.points).expand(self.width / 2.0)
    }

    fn hit(&self, p: egui::Pos2) -> bool {
        let reach = self.width / 2.0 + HIT_TOLERANCE;
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance(p) <= reach,
            points => points
                .windows(2)
                .any(|seg| point_to_segment_dist(p, seg[0], seg[1]) <= reach),
        }
    }

    /// Same extent as [`Stroke::bounds`], computed in f64 from the shortest
    /// decimal form of each coordinate so exports carry no f32 widening noise.
    fn to_object(&self) -> AnnotationObject {
        let r = egui::Rect::from_points(&self.points);
        let half = widen(self.width) / 2.0;
        let left = widen(r.min.x) - half;
        let top = widen(r.min.y) - half;
        let right = widen(r.max.x) + half;
        let bottom = widen(r.max.y) + half;
        AnnotationObject {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

fn widen(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

fn point_to_segment_dist(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}

/// Immutable copy of every stroke on a [`Canvas`].
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasSnapshot(Arc<[Stroke]>);

impl CanvasSnapshot {
    pub fn object_count(&self) -> usize {
        self.0.len()
    }
}

/// Things the user did on the canvas that the session has to react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CanvasEvent {
    StrokeCompleted,
    /// Primary click while stroke input is disabled, in surface coordinates.
    Pressed(egui::Pos2),
}

struct Background {
    texture: egui::TextureHandle,
    size: egui::Vec2,
}

pub fn load_background(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path).map_err(|source| ImageError {
        path: path.to_path_buf(),
        source,
    })
}

// ── Canvas ──────────────────────────────────────────────────────────────────

/// Freehand drawing surface painted with egui.
pub struct Canvas {
    width: u32,
    height: u32,
    strokes: Vec<Stroke>,
    drawing_enabled: bool,
    // None while stroke input is disabled; recreated with defaults on re-enable
    brush: Option<BrushStyle>,
    active: Option<Stroke>,
    background: Option<Background>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        log::info!("canvas created ({width}x{height})");
        Self {
            width,
            height,
            strokes: Vec::new(),
            drawing_enabled: true,
            brush: Some(BrushStyle::default()),
            active: None,
            background: None,
        }
    }

    pub fn set_background(&mut self, ctx: &egui::Context, image: &DynamicImage) {
        let rgba = image.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        let texture = ctx.load_texture("background", color_image, egui::TextureOptions::LINEAR);
        self.background = Some(Background {
            texture,
            size: egui::vec2(size[0] as f32, size[1] as f32),
        });
    }

    pub fn brush(&self) -> Option<BrushStyle> {
        self.brush
    }

    pub fn is_drawing_enabled(&self) -> bool {
        self.drawing_enabled
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Starts a stroke at `pos`. Refused while stroke input is disabled.
    pub fn begin_stroke(&mut self, pos: egui::Pos2) -> bool {
        let Some(brush) = self.brush.filter(|_| self.drawing_enabled) else {
            return false;
        };
        self.active = Some(Stroke {
            points: vec![pos],
            color: brush.color,
            width: brush.width,
        });
        true
    }

    pub fn extend_stroke(&mut self, pos: egui::Pos2) {
        if let Some(stroke) = &mut self.active {
            if stroke.points.last() != Some(&pos) {
                stroke.points.push(pos);
            }
        }
    }

    /// Commits the in-progress stroke. Returns whether one was committed.
    pub fn finish_stroke(&mut self) -> bool {
        match self.active.take() {
            Some(stroke) => {
                self.strokes.push(stroke);
                true
            }
            None => false,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Vec<CanvasEvent> {
        let mut events = Vec::new();
        let desired = egui::vec2(self.width as f32, self.height as f32);
        let (response, painter) = ui.allocate_painter(desired, egui::Sense::click_and_drag());
        let rect = response.rect;
        let painter = painter.with_clip_rect(rect);
        let origin = rect.min.to_vec2();

        painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
        if let Some(bg) = &self.background {
            painter.image(
                bg.texture.id(),
                egui::Rect::from_min_size(rect.min, bg.size),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        for stroke in self.strokes.iter().chain(self.active.as_ref()) {
            paint_stroke(&painter, stroke, origin);
        }

        if response.hovered() {
            let icon = if self.drawing_enabled {
                egui::CursorIcon::Crosshair
            } else {
                egui::CursorIcon::PointingHand
            };
            ui.ctx().set_cursor_icon(icon);
        }

        let local = response.interact_pointer_pos().map(|p| p - origin);
        if self.drawing_enabled {
            if response.drag_started_by(egui::PointerButton::Primary) {
                if let Some(pos) = local {
                    self.begin_stroke(pos);
                }
            }
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pos) = local {
                    self.extend_stroke(pos);
                }
            }
            if response.drag_stopped_by(egui::PointerButton::Primary) && self.finish_stroke() {
                events.push(CanvasEvent::StrokeCompleted);
            }
        } else if response.clicked_by(egui::PointerButton::Primary) {
            if let Some(pos) = local {
                events.push(CanvasEvent::Pressed(pos));
            }
        }

        events
    }
}

fn paint_stroke(painter: &egui::Painter, stroke: &Stroke, origin: egui::Vec2) {
    match stroke.points.as_slice() {
        [] => {}
        [only] => {
            painter.circle_filled(*only + origin, stroke.width / 2.0, stroke.color);
        }
        points => {
            let pts: Vec<egui::Pos2> = points.iter().map(|p| *p + origin).collect();
            painter.add(egui::Shape::line(
                pts,
                egui::Stroke::new(stroke.width, stroke.color),
            ));
        }
    }
}

impl DrawingSurface for Canvas {
    type Snapshot = CanvasSnapshot;

    fn serialize(&self) -> CanvasSnapshot {
        CanvasSnapshot(Arc::from(self.strokes.as_slice()))
    }

    fn restore(&mut self, snapshot: &CanvasSnapshot) {
        self.strokes = snapshot.0.to_vec();
        self.active = None;
    }

    fn set_mode(&mut self, mode: SessionMode) {
        match mode {
            SessionMode::Drawing => {
                self.drawing_enabled = true;
                if self.brush.is_none() {
                    self.brush = Some(BrushStyle::default());
                }
            }
            SessionMode::Selection => {
                self.drawing_enabled = false;
                self.brush = None;
                self.active = None;
            }
        }
    }

    fn set_brush_style(&mut self, brush: BrushStyle) -> bool {
        match &mut self.brush {
            Some(current) => {
                *current = brush;
                true
            }
            None => false,
        }
    }

    fn remove_object_at(&mut self, point: egui::Pos2) -> bool {
        match self.strokes.iter().rposition(|s| s.hit(point)) {
            Some(index) => {
                self.strokes.remove(index);
                log::debug!("erased object {index} at ({}, {})", point.x, point.y);
                true
            }
            None => false,
        }
    }

    fn objects(&self) -> Vec<AnnotationObject> {
        self.strokes.iter().map(Stroke::to_object).collect()
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        log::info!("canvas disposed ({} objects)", self.strokes.len());
    }
}
